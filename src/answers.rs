//! Answer map shared by activation conditions, placeholders and templates.
//!
//! Answers come from an external collector (interactive prompts, a JSON
//! file, question defaults). The map is a closed key→variant structure;
//! every read handles the absent key explicitly and never panics.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};

/// Question id → collected value.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// A single collected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<AnswerValue>),
}

impl AnswerValue {
    /// Scalar rendering for placeholder substitution. Arrays have no scalar
    /// form.
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            AnswerValue::Bool(b) => Some(b.to_string()),
            AnswerValue::Number(n) => {
                if n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            AnswerValue::String(s) => Some(s.clone()),
            AnswerValue::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AnswerValue]> {
        match self {
            AnswerValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, AnswerValue::Array(_))
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::String(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::String(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Bool(b)
    }
}

impl From<f64> for AnswerValue {
    fn from(n: f64) -> Self {
        AnswerValue::Number(n)
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        AnswerValue::Number(n as f64)
    }
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9_-]*)\}").expect("placeholder pattern"));

/// Substitute `{key}` tokens with scalar answers.
///
/// Workspace ids and instruction paths may carry placeholders resolved from
/// feature configuration. A missing key or an array answer is a declaration
/// error and aborts before any mutation.
pub fn interpolate(input: &str, answers: &AnswerMap) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(input) {
        let whole = caps.get(0).expect("match");
        let key = &caps[1];
        output.push_str(&input[last..whole.start()]);

        let value = answers
            .get(key)
            .and_then(AnswerValue::as_scalar)
            .ok_or_else(|| WeftError::UnresolvedPlaceholder {
                placeholder: key.to_string(),
                input: input.to_string(),
            })?;
        output.push_str(&value);
        last = whole.end();
    }

    output.push_str(&input[last..]);
    Ok(output)
}

/// Convert the answer map into a JSON object for template contexts.
pub fn to_json(answers: &AnswerMap) -> serde_json::Value {
    serde_json::to_value(answers).unwrap_or(serde_json::Value::Null)
}
