//! Stage activation conditions.
//!
//! Conditions are a serializable expression tree evaluated purely against
//! the answer map: no I/O, no side effects, idempotent per stage. A missing
//! question id makes the leaf conditions false rather than erroring, so
//! partially answered runs degrade to skipping stages instead of failing.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, AnswerValue};

/// Predicate for `custom` conditions: receives the raw (possibly absent)
/// answer plus the full map.
pub type CustomPredicate = Arc<dyn Fn(Option<&AnswerValue>, &AnswerMap) -> bool + Send + Sync>;

fn default_predicate() -> CustomPredicate {
    Arc::new(|_, _| {
        tracing::debug!("custom condition has no registered predicate; never activates");
        false
    })
}

/// Boolean expression over collected answers controlling whether a stage runs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActivationCondition {
    /// The answer equals the expected value.
    Equals { question: String, value: AnswerValue },

    /// The answer is an array containing the expected value.
    IncludesValue { question: String, value: AnswerValue },

    /// The answer is one of the listed scalar values.
    IsOneOf {
        question: String,
        values: Vec<AnswerValue>,
    },

    And { conditions: Vec<ActivationCondition> },

    Or { conditions: Vec<ActivationCondition> },

    /// An arbitrary predicate supplied by a programmatically registered
    /// feature. The predicate is not serializable; a `custom` condition
    /// loaded from a definition file never activates.
    Custom {
        question: String,
        #[serde(skip, default = "default_predicate")]
        predicate: CustomPredicate,
    },
}

impl ActivationCondition {
    pub fn equals(question: &str, value: impl Into<AnswerValue>) -> Self {
        ActivationCondition::Equals {
            question: question.to_string(),
            value: value.into(),
        }
    }

    pub fn includes_value(question: &str, value: impl Into<AnswerValue>) -> Self {
        ActivationCondition::IncludesValue {
            question: question.to_string(),
            value: value.into(),
        }
    }

    pub fn is_one_of(
        question: &str,
        values: impl IntoIterator<Item = impl Into<AnswerValue>>,
    ) -> Self {
        ActivationCondition::IsOneOf {
            question: question.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(conditions: Vec<ActivationCondition>) -> Self {
        ActivationCondition::And { conditions }
    }

    pub fn or(conditions: Vec<ActivationCondition>) -> Self {
        ActivationCondition::Or { conditions }
    }

    pub fn custom<F>(question: &str, predicate: F) -> Self
    where
        F: Fn(Option<&AnswerValue>, &AnswerMap) -> bool + Send + Sync + 'static,
    {
        ActivationCondition::Custom {
            question: question.to_string(),
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for ActivationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationCondition::Equals { question, value } => f
                .debug_struct("Equals")
                .field("question", question)
                .field("value", value)
                .finish(),
            ActivationCondition::IncludesValue { question, value } => f
                .debug_struct("IncludesValue")
                .field("question", question)
                .field("value", value)
                .finish(),
            ActivationCondition::IsOneOf { question, values } => f
                .debug_struct("IsOneOf")
                .field("question", question)
                .field("values", values)
                .finish(),
            ActivationCondition::And { conditions } => {
                f.debug_struct("And").field("conditions", conditions).finish()
            }
            ActivationCondition::Or { conditions } => {
                f.debug_struct("Or").field("conditions", conditions).finish()
            }
            ActivationCondition::Custom { question, .. } => f
                .debug_struct("Custom")
                .field("question", question)
                .finish_non_exhaustive(),
        }
    }
}

/// Evaluate a condition against the answer map.
///
/// Pure and side-effect-free; re-evaluated per stage at execution time.
/// `feature_id` only feeds tracing context.
pub fn evaluate(condition: &ActivationCondition, answers: &AnswerMap, feature_id: &str) -> bool {
    match condition {
        ActivationCondition::Equals { question, value } => {
            answers.get(question).map(|v| v == value).unwrap_or(false)
        }
        ActivationCondition::IncludesValue { question, value } => answers
            .get(question)
            .and_then(AnswerValue::as_array)
            .map(|items| items.contains(value))
            .unwrap_or(false),
        ActivationCondition::IsOneOf { question, values } => answers
            .get(question)
            .map(|v| !v.is_array() && values.contains(v))
            .unwrap_or(false),
        ActivationCondition::And { conditions } => conditions
            .iter()
            .all(|c| evaluate(c, answers, feature_id)),
        ActivationCondition::Or { conditions } => conditions
            .iter()
            .any(|c| evaluate(c, answers, feature_id)),
        ActivationCondition::Custom {
            question,
            predicate,
        } => {
            tracing::trace!(feature = feature_id, question, "evaluating custom condition");
            predicate(answers.get(question), answers)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, AnswerValue)]) -> AnswerMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_equals_present_and_absent() {
        let cond = ActivationCondition::equals("x", "y");
        assert!(evaluate(&cond, &answers(&[("x", "y".into())]), "f"));
        assert!(!evaluate(&cond, &AnswerMap::new(), "f"));
        assert!(!evaluate(&cond, &answers(&[("x", "z".into())]), "f"));
    }

    #[test]
    fn test_includes_value_requires_array() {
        let cond = ActivationCondition::includes_value("b", "z");
        let with_array = answers(&[(
            "b",
            AnswerValue::Array(vec!["y".into(), "z".into()]),
        )]);
        assert!(evaluate(&cond, &with_array, "f"));

        // Scalar answers never include anything.
        assert!(!evaluate(&cond, &answers(&[("b", "z".into())]), "f"));
        assert!(!evaluate(&cond, &AnswerMap::new(), "f"));
    }

    #[test]
    fn test_is_one_of() {
        let cond = ActivationCondition::is_one_of("db", ["postgres", "mysql"]);
        assert!(evaluate(&cond, &answers(&[("db", "postgres".into())]), "f"));
        assert!(!evaluate(&cond, &answers(&[("db", "sqlite".into())]), "f"));
        assert!(!evaluate(&cond, &AnswerMap::new(), "f"));
    }

    #[test]
    fn test_and_flips_with_either_operand() {
        let cond = ActivationCondition::and(vec![
            ActivationCondition::equals("a", 1i64),
            ActivationCondition::includes_value("b", "z"),
        ]);
        let both = answers(&[
            ("a", 1i64.into()),
            ("b", AnswerValue::Array(vec!["z".into()])),
        ]);
        assert!(evaluate(&cond, &both, "f"));

        let wrong_a = answers(&[
            ("a", 2i64.into()),
            ("b", AnswerValue::Array(vec!["z".into()])),
        ]);
        assert!(!evaluate(&cond, &wrong_a, "f"));

        let wrong_b = answers(&[
            ("a", 1i64.into()),
            ("b", AnswerValue::Array(vec!["y".into()])),
        ]);
        assert!(!evaluate(&cond, &wrong_b, "f"));
    }

    #[test]
    fn test_or_short_circuits() {
        let cond = ActivationCondition::or(vec![
            ActivationCondition::equals("a", true),
            ActivationCondition::equals("b", true),
        ]);
        assert!(evaluate(&cond, &answers(&[("b", true.into())]), "f"));
        assert!(!evaluate(&cond, &AnswerMap::new(), "f"));
    }

    #[test]
    fn test_custom_receives_raw_value_and_map() {
        let cond = ActivationCondition::custom("count", |value, all| {
            matches!(value, Some(AnswerValue::Number(n)) if *n > 2.0) && all.contains_key("count")
        });
        assert!(evaluate(&cond, &answers(&[("count", 3i64.into())]), "f"));
        assert!(!evaluate(&cond, &answers(&[("count", 1i64.into())]), "f"));
        assert!(!evaluate(&cond, &AnswerMap::new(), "f"));
    }

    #[test]
    fn test_deserialized_custom_never_activates() {
        let cond: ActivationCondition =
            serde_json::from_str(r#"{"type": "custom", "question": "x"}"#).unwrap();
        assert!(!evaluate(&cond, &answers(&[("x", "y".into())]), "f"));
    }

    #[test]
    fn test_condition_roundtrips_as_tagged_json() {
        let cond = ActivationCondition::and(vec![
            ActivationCondition::equals("ui", "react"),
            ActivationCondition::is_one_of("db", ["postgres"]),
        ]);
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["type"], "and");
        assert_eq!(json["conditions"][0]["type"], "equals");

        let back: ActivationCondition = serde_json::from_value(json).unwrap();
        assert!(evaluate(
            &back,
            &answers(&[("ui", "react".into()), ("db", "postgres".into())]),
            "f"
        ));
    }
}
