//! Read-only dependency optimization analysis.
//!
//! Groups every workspace dependency by name to surface duplicated direct
//! dependencies, unused catalog entries, and ranked suggestions. Analysis
//! never mutates the stores; `apply_suggestions` applies the safe subset.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::feature::DependencyType;
use crate::workspace::{CatalogEntry, CatalogStore, ManifestStore};

use super::version::pick_best_version;

/// One direct occurrence of a name in a workspace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyOccurrence {
    pub workspace: String,
    pub version: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
}

/// A name held directly by two or more workspaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDependency {
    pub name: String,
    pub occurrences: Vec<DependencyOccurrence>,
    /// Distinct version literals in first-seen order.
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    /// Promote a shared name into the catalog.
    Catalog,
    /// Workspaces disagree on a version; needs a human decision.
    VersionConflict,
    /// A catalogued name is still held as a direct literal somewhere.
    DuplicateRemoval,
}

/// How many workspaces a suggestion touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    Low,
    Medium,
    High,
}

fn impact_tier(workspace_count: usize) -> ImpactTier {
    match workspace_count {
        n if n >= 3 => ImpactTier::High,
        2 => ImpactTier::Medium,
        _ => ImpactTier::Low,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub name: String,
    pub workspaces: Vec<String>,
    pub impact: ImpactTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_version: Option<String>,
    pub detail: String,
}

/// The full read-only analysis result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub generated_at: DateTime<Utc>,
    pub duplicates: Vec<DuplicateDependency>,
    pub unused_catalog_entries: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

impl OptimizationReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
            && self.unused_catalog_entries.is_empty()
            && self.suggestions.is_empty()
    }
}

/// Analyze the current store state.
pub fn analyze(catalog: &dyn CatalogStore, manifests: &dyn ManifestStore) -> OptimizationReport {
    let all = manifests.all_dependencies();

    // Literal occurrences per name, in deterministic store order.
    let mut literals: BTreeMap<String, Vec<DependencyOccurrence>> = BTreeMap::new();
    let mut referenced: Vec<&str> = Vec::new();
    for dep in &all {
        referenced.push(&dep.name);
        if !dep.uses_catalog() {
            literals
                .entry(dep.name.clone())
                .or_default()
                .push(DependencyOccurrence {
                    workspace: dep.workspace.clone(),
                    version: dep.version.clone(),
                    dep_type: dep.dep_type,
                });
        }
    }

    let catalog_entries = catalog.entries();
    let mut duplicates = Vec::new();
    let mut suggestions = Vec::new();

    for (name, occurrences) in &literals {
        let workspaces = distinct_workspaces(occurrences);
        if workspaces.len() < 2 {
            continue;
        }

        let versions = distinct_versions(occurrences);
        duplicates.push(DuplicateDependency {
            name: name.clone(),
            occurrences: occurrences.clone(),
            versions: versions.clone(),
        });

        // Already catalogued names are reported below as duplicate-removal.
        if catalog_entries.contains_key(name) {
            continue;
        }

        if versions.len() > 1 {
            let recommended =
                pick_best_version(versions.iter().map(String::as_str)).map(str::to_string);
            suggestions.push(Suggestion {
                kind: SuggestionKind::VersionConflict,
                name: name.clone(),
                impact: impact_tier(workspaces.len()),
                detail: format!(
                    "{} workspaces disagree on '{}' ({})",
                    workspaces.len(),
                    name,
                    versions.join(", ")
                ),
                workspaces,
                recommended_version: recommended,
            });
        } else {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Catalog,
                name: name.clone(),
                impact: impact_tier(workspaces.len()),
                detail: format!(
                    "'{}' is duplicated across {} workspaces at {}",
                    name,
                    workspaces.len(),
                    versions[0]
                ),
                workspaces,
                recommended_version: Some(versions[0].clone()),
            });
        }
    }

    // Catalogued names still held as direct literals.
    for (name, pinned) in &catalog_entries {
        if let Some(occurrences) = literals.get(name) {
            let workspaces = distinct_workspaces(occurrences);
            suggestions.push(Suggestion {
                kind: SuggestionKind::DuplicateRemoval,
                name: name.clone(),
                impact: impact_tier(workspaces.len()),
                detail: format!(
                    "'{}' is pinned in the catalog ({}) but still direct in {} workspace(s)",
                    name,
                    pinned,
                    workspaces.len()
                ),
                workspaces,
                recommended_version: Some(pinned.clone()),
            });
        }
    }

    let unused_catalog_entries = catalog_entries
        .keys()
        .filter(|name| !referenced.contains(&name.as_str()))
        .cloned()
        .collect();

    // Rank by impact, then name, for a stable report.
    suggestions.sort_by(|a, b| b.impact.cmp(&a.impact).then_with(|| a.name.cmp(&b.name)));

    OptimizationReport {
        generated_at: Utc::now(),
        duplicates,
        unused_catalog_entries,
        suggestions,
    }
}

fn distinct_workspaces(occurrences: &[DependencyOccurrence]) -> Vec<String> {
    let mut workspaces: Vec<String> = Vec::new();
    for occ in occurrences {
        if !workspaces.contains(&occ.workspace) {
            workspaces.push(occ.workspace.clone());
        }
    }
    workspaces
}

fn distinct_versions(occurrences: &[DependencyOccurrence]) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();
    for occ in occurrences {
        if !versions.contains(&occ.version) {
            versions.push(occ.version.clone());
        }
    }
    versions
}

/// What `apply_suggestions` changed.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationApplied {
    pub catalogued: Vec<String>,
    pub rewritten_workspaces: Vec<String>,
    pub warnings: Vec<String>,
}

/// Apply the safe suggestion kinds: `catalog` and `duplicate-removal`.
/// `version-conflict` always stays a report for a human decision.
pub fn apply_suggestions(
    report: &OptimizationReport,
    catalog: &mut dyn CatalogStore,
    manifests: &mut dyn ManifestStore,
) -> Result<OptimizationApplied> {
    let mut applied = OptimizationApplied::default();
    let mut entries = Vec::new();

    for suggestion in &report.suggestions {
        match suggestion.kind {
            SuggestionKind::Catalog => {
                let Some(version) = &suggestion.recommended_version else {
                    continue;
                };
                entries.push(CatalogEntry {
                    name: suggestion.name.clone(),
                    version: version.clone(),
                });
                applied.catalogued.push(suggestion.name.clone());
            }
            SuggestionKind::DuplicateRemoval => {
                applied.catalogued.push(suggestion.name.clone());
            }
            SuggestionKind::VersionConflict => {}
        }
    }

    catalog.insert(&entries)?;
    for name in applied.catalogued.clone() {
        let (rewritten, warnings) = manifests.rewrite_to_sentinel(&name);
        for ws in rewritten {
            if !applied.rewritten_workspaces.contains(&ws) {
                applied.rewritten_workspaces.push(ws);
            }
        }
        applied.warnings.extend(warnings);
    }

    Ok(applied)
}
