//! Default file-edit collaborator.
//!
//! Applies the declarative `EditSpec` operations from feature definitions.
//! More elaborate mechanisms (AST-aware rewriters) can replace this by
//! implementing `FileEditor`; the engine passes instructions through
//! untouched either way.

use std::path::Path;

use crate::engine::collaborators::FileEditor;
use crate::error::{Result, WeftError};
use crate::feature::EditSpec;

/// Plain-text and JSON edit operations.
pub struct TextFileEditor;

impl FileEditor for TextFileEditor {
    fn apply(&self, root: &Path, path: &Path, edit: &EditSpec) -> Result<()> {
        let full = root.join(path);

        match edit {
            EditSpec::Append { content } => {
                let mut existing = if full.exists() {
                    std::fs::read_to_string(&full).map_err(|e| WeftError::fs(&full, e))?
                } else {
                    if let Some(parent) = full.parent() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| WeftError::fs(parent, e))?;
                    }
                    String::new()
                };
                if !existing.is_empty() && !existing.ends_with('\n') {
                    existing.push('\n');
                }
                existing.push_str(content);
                std::fs::write(&full, existing).map_err(|e| WeftError::fs(&full, e))?;
            }
            EditSpec::Replace { find, with } => {
                let existing =
                    std::fs::read_to_string(&full).map_err(|e| WeftError::fs(&full, e))?;
                if !existing.contains(find.as_str()) {
                    tracing::warn!(
                        path = %full.display(),
                        pattern = find,
                        "replace pattern not found; file left unchanged"
                    );
                    return Ok(());
                }
                let updated = existing.replace(find.as_str(), with);
                std::fs::write(&full, updated).map_err(|e| WeftError::fs(&full, e))?;
            }
            EditSpec::JsonMerge { value } => {
                let mut document: serde_json::Value = if full.exists() {
                    let content = std::fs::read_to_string(&full)
                        .map_err(|e| WeftError::fs(&full, e))?;
                    serde_json::from_str(&content)?
                } else {
                    serde_json::Value::Object(serde_json::Map::new())
                };
                deep_merge(&mut document, value);
                let content = serde_json::to_string_pretty(&document)?;
                std::fs::write(&full, content + "\n").map_err(|e| WeftError::fs(&full, e))?;
            }
        }

        Ok(())
    }
}

/// Recursive object merge; non-object values overwrite.
fn deep_merge(target: &mut serde_json::Value, incoming: &serde_json::Value) {
    match (target, incoming) {
        (serde_json::Value::Object(target), serde_json::Value::Object(incoming)) => {
            for (key, value) in incoming {
                deep_merge(
                    target.entry(key.clone()).or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
        (target, incoming) => *target = incoming.clone(),
    }
}
