//! Feature dependency graph ordering.

use std::collections::HashMap;

use crate::error::{Result, WeftError};

use super::registry::FeatureRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Order the selected features so every feature comes after all of its
/// transitive dependencies.
///
/// Depth-first traversal with three-color marking. Selecting a feature
/// implicitly includes its dependency closure; the output is a deterministic
/// permutation of that closure for a given registry and selection order.
pub fn resolution_order(registry: &FeatureRegistry, selected: &[String]) -> Result<Vec<String>> {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for id in selected {
        visit(registry, id, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn visit(
    registry: &FeatureRegistry,
    id: &str,
    marks: &mut HashMap<String, Mark>,
    order: &mut Vec<String>,
) -> Result<()> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            return Err(WeftError::CircularDependency {
                feature: id.to_string(),
            })
        }
        None => {}
    }

    let feature = registry
        .get(id)
        .ok_or_else(|| WeftError::UnknownFeature {
            feature: id.to_string(),
        })?;

    marks.insert(id.to_string(), Mark::InProgress);
    for dep in &feature.depends_on {
        visit(registry, dep, marks, order)?;
    }
    marks.insert(id.to_string(), Mark::Done);
    order.push(id.to_string());

    Ok(())
}
