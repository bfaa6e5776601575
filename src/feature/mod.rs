//! Feature and stage definitions.
//!
//! Features are the declarative unit of setup work: each one names the
//! features it depends on, the configuration questions it consumes, and an
//! ordered list of stages. Definitions are immutable once loaded — the
//! engine never mutates them, it only reads them per run.

pub mod condition;
pub mod graph;
pub mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

pub use self::condition::{evaluate, ActivationCondition};
pub use self::graph::resolution_order;
pub use self::registry::FeatureRegistry;

/// A declarative unit of setup work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Features that must execute before this one. Declaration order is
    /// preserved; it feeds the deterministic traversal.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Question descriptors consumed by the answer collector.
    #[serde(default)]
    pub configuration: Vec<QuestionSpec>,

    #[serde(default)]
    pub stages: Vec<Stage>,

    /// Directory the definition was loaded from; template sources resolve
    /// relative to it. Not part of the serialized form.
    #[serde(skip)]
    pub dir: Option<PathBuf>,
}

/// An ordered, independently activatable unit of work within a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub name: String,

    /// No condition means the stage always runs when the feature is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ActivationCondition>,

    #[serde(default)]
    pub dependencies: Vec<DependencyRequest>,

    #[serde(default)]
    pub scripts: Vec<ScriptStep>,

    #[serde(default)]
    pub templates: Vec<TemplateInstruction>,

    #[serde(default)]
    pub edits: Vec<EditInstruction>,
}

/// A question shown by the answer collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
    pub id: String,

    pub prompt: String,

    #[serde(default)]
    pub kind: QuestionKind,

    /// Choices for select/multi-select questions.
    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<crate::answers::AnswerValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    Text,
    Confirm,
    Select,
    MultiSelect,
}

/// Destination map for a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    #[default]
    Runtime,
    Dev,
}

impl DependencyType {
    pub fn manifest_key(&self) -> &'static str {
        match self {
            DependencyType::Runtime => "dependencies",
            DependencyType::Dev => "devDependencies",
        }
    }
}

/// A package-dependency addition requested by a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRequest {
    /// One or many package names; a bare string is accepted in JSON.
    #[serde(deserialize_with = "string_or_seq")]
    pub names: Vec<String>,

    /// Destination workspace id. May contain `{placeholder}` tokens resolved
    /// from the answer map before resolution.
    pub workspace: String,

    #[serde(default, rename = "type")]
    pub dep_type: DependencyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Overwrite a conflicting version instead of reporting a conflict.
    #[serde(default)]
    pub force: bool,
}

impl DependencyRequest {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>, workspace: &str) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            workspace: workspace.to_string(),
            dep_type: DependencyType::Runtime,
            version: None,
            force: false,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn dev(mut self) -> Self {
        self.dep_type = DependencyType::Dev;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

/// A blocking shell step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Render a template file (or tree) into the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstruction {
    /// Source path relative to the feature's directory.
    pub source: String,

    /// Target path relative to the project root; may contain placeholders.
    pub target: String,
}

/// Modify an existing file through the external edit collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInstruction {
    /// File path relative to the project root; may contain placeholders.
    pub path: String,

    #[serde(flatten)]
    pub edit: EditSpec,
}

/// The edit operations the default collaborator understands. The core passes
/// these through without inspecting file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EditSpec {
    /// Append content to the file (creates it when absent).
    Append { content: String },
    /// Replace every occurrence of `find` with `with`.
    Replace { find: String, with: String },
    /// Deep-merge a JSON object into a JSON document.
    JsonMerge { value: serde_json::Value },
}
