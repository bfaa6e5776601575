//! Dependency/catalog resolution.
//!
//! For every package-dependency addition a stage requests, the resolver
//! decides whether the name is served from the shared catalog, promoted into
//! it, added directly to one workspace's manifest, or reported as a version
//! conflict. Decisions are computed against the current store state before
//! any mutation is applied.

pub mod analyze;
pub mod version;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DependencyManagement;
use crate::error::{Result, WeftError};
use crate::feature::{DependencyRequest, DependencyType};
use crate::workspace::{CatalogEntry, CatalogStore, ManifestStore, CATALOG_SENTINEL};

use self::version::{format_version, pick_best_version, REGISTRY_PLACEHOLDER};

/// The decision for one requested name.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResolutionAction {
    /// The name is already pinned; the workspace references the catalog.
    UseCatalog { version: String },
    /// Pin the name in the catalog and reference it from the workspace.
    AddToCatalog { entry: CatalogEntry },
    /// Write the version literal into the workspace manifest.
    AddDirect { version: String },
    /// The workspace holds a different version; nothing is applied.
    Conflict { existing: String, requested: String },
}

/// Outcome of resolving one name of a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyResolution {
    pub name: String,
    pub workspace: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    #[serde(flatten)]
    pub action: ResolutionAction,
    pub reason: String,
}

impl DependencyResolution {
    pub fn is_conflict(&self) -> bool {
        matches!(self.action, ResolutionAction::Conflict { .. })
    }
}

/// Result of applying a batch of resolutions.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub applied: Vec<DependencyResolution>,
    pub skipped: Vec<DependencyResolution>,
    /// Best-effort sentinel-rewrite failures; never fatal.
    pub warnings: Vec<String>,
}

/// Classifies dependency-addition requests against the catalog and manifest
/// stores and applies the resulting mutations.
///
/// Store handles are injected so tests can run against in-memory doubles.
pub struct DependencyResolver<'a> {
    catalog: &'a mut dyn CatalogStore,
    manifests: &'a mut dyn ManifestStore,
    policy: DependencyManagement,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(
        catalog: &'a mut dyn CatalogStore,
        manifests: &'a mut dyn ManifestStore,
        policy: DependencyManagement,
    ) -> Self {
        Self {
            catalog,
            manifests,
            policy,
        }
    }

    /// Resolve every name of a request without mutating anything.
    pub fn resolve(&self, request: &DependencyRequest) -> Result<Vec<DependencyResolution>> {
        if !self.manifests.has_workspace(&request.workspace) {
            return Err(WeftError::UnknownWorkspace {
                workspace: request.workspace.clone(),
            });
        }

        request
            .names
            .iter()
            .map(|name| Ok(self.resolve_one(name, request)))
            .collect()
    }

    fn resolve_one(&self, name: &str, request: &DependencyRequest) -> DependencyResolution {
        let workspace = &request.workspace;
        let strategy = self.policy.version_strategy;

        let outcome = |action, reason: String| DependencyResolution {
            name: name.to_string(),
            workspace: workspace.clone(),
            dep_type: request.dep_type,
            action,
            reason,
        };

        // 1. Already catalogued.
        if let Some(version) = self.catalog.pinned(name) {
            return outcome(
                ResolutionAction::UseCatalog { version },
                "already pinned in the shared catalog".to_string(),
            );
        }

        // 2. Cataloguing policy, unless the name is workspace-specific here.
        if !self.policy.is_workspace_specific(workspace, name) {
            if let Some(reason) = self.catalog_reason(name) {
                let literals = self.manifests.direct_literals(name);
                let version = request
                    .version
                    .as_deref()
                    .map(|v| format_version(v, strategy))
                    .or_else(|| {
                        pick_best_version(literals.iter().map(|(_, v)| v.as_str()))
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| REGISTRY_PLACEHOLDER.to_string());

                return outcome(
                    ResolutionAction::AddToCatalog {
                        entry: CatalogEntry {
                            name: name.to_string(),
                            version,
                        },
                    },
                    reason,
                );
            }
        }

        // 3./4. Direct path, with conflict detection.
        let existing = self
            .manifests
            .direct_version(workspace, name, request.dep_type);

        match (request.version.as_deref(), existing) {
            (Some(requested), Some(existing)) => {
                let requested = format_version(requested, strategy);
                if requested != existing {
                    if request.force {
                        outcome(
                            ResolutionAction::AddDirect { version: requested },
                            format!("forced overwrite of existing {existing}"),
                        )
                    } else {
                        outcome(
                            ResolutionAction::Conflict {
                                existing,
                                requested,
                            },
                            "workspace already holds a different version".to_string(),
                        )
                    }
                } else {
                    outcome(
                        ResolutionAction::AddDirect { version: requested },
                        "already present at the requested version".to_string(),
                    )
                }
            }
            (None, Some(existing)) => outcome(
                ResolutionAction::AddDirect { version: existing },
                "already present; reusing the existing version".to_string(),
            ),
            (Some(requested), None) => outcome(
                ResolutionAction::AddDirect {
                    version: format_version(requested, strategy),
                },
                "new direct dependency".to_string(),
            ),
            (None, None) => outcome(
                ResolutionAction::AddDirect {
                    version: REGISTRY_PLACEHOLDER.to_string(),
                },
                "no version requested; using the registry tag".to_string(),
            ),
        }
    }

    /// Which cataloguing rule applies to `name`, if any. Rules are
    /// disjunctive; `commonDependencies` applies even with autoCatalog off.
    fn catalog_reason(&self, name: &str) -> Option<String> {
        if self.policy.is_common(name) {
            return Some("listed in commonDependencies".to_string());
        }
        if !self.policy.auto_catalog {
            return None;
        }

        let usage = self.manifests.direct_usage_count(name);
        if usage >= 1 {
            return Some(format!(
                "already a direct dependency in {usage} workspace(s)"
            ));
        }
        if usage + 1 >= self.policy.catalog_threshold {
            return Some(format!(
                "usage meets catalog threshold ({})",
                self.policy.catalog_threshold
            ));
        }
        None
    }

    /// Apply one resolution. Returns sentinel-rewrite warnings for
    /// `add-to-catalog`; applying a `conflict` is an error.
    pub fn apply(&mut self, resolution: &DependencyResolution) -> Result<Vec<String>> {
        let workspace = &resolution.workspace;
        let name = &resolution.name;

        match &resolution.action {
            ResolutionAction::UseCatalog { .. } => {
                self.manifests.insert(
                    workspace,
                    &[(
                        name.clone(),
                        CATALOG_SENTINEL.to_string(),
                        resolution.dep_type,
                    )],
                )?;
                Ok(Vec::new())
            }
            ResolutionAction::AddDirect { version } => {
                self.manifests.insert(
                    workspace,
                    &[(name.clone(), version.clone(), resolution.dep_type)],
                )?;
                Ok(Vec::new())
            }
            ResolutionAction::AddToCatalog { entry } => {
                // Catalog write first; the sentinel rewrite that follows is
                // best-effort and never rolls it back.
                self.catalog.insert(std::slice::from_ref(entry))?;
                self.manifests.insert(
                    workspace,
                    &[(
                        name.clone(),
                        CATALOG_SENTINEL.to_string(),
                        resolution.dep_type,
                    )],
                )?;
                let (rewritten, warnings) = self.manifests.rewrite_to_sentinel(name);
                if !rewritten.is_empty() {
                    tracing::debug!(
                        name,
                        workspaces = ?rewritten,
                        "rewrote direct references to catalog sentinel"
                    );
                }
                Ok(warnings)
            }
            ResolutionAction::Conflict {
                existing,
                requested,
            } => Err(WeftError::DependencyConflict {
                name: name.clone(),
                workspace: workspace.clone(),
                existing: existing.clone(),
                requested: requested.clone(),
            }),
        }
    }

    /// Resolve a whole batch against the pre-mutation snapshot.
    pub fn resolve_all(
        &self,
        requests: &[DependencyRequest],
    ) -> Result<Vec<DependencyResolution>> {
        let mut resolutions = Vec::new();
        for request in requests {
            resolutions.extend(self.resolve(request)?);
        }
        Ok(resolutions)
    }

    /// Apply a batch: conflicts are skipped (reported, never silently
    /// dropped), catalog insertions coalesce into one descriptor write,
    /// per-workspace insertions into one manifest write each, then one
    /// sentinel-rewrite pass runs for the newly catalogued names.
    pub fn apply_all(&mut self, resolutions: &[DependencyResolution]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut catalog_entries: Vec<CatalogEntry> = Vec::new();
        let mut catalogued: Vec<String> = Vec::new();
        let mut per_workspace: BTreeMap<String, Vec<(String, String, DependencyType)>> =
            BTreeMap::new();

        for resolution in resolutions {
            match &resolution.action {
                ResolutionAction::Conflict { .. } => {
                    tracing::warn!(
                        name = resolution.name,
                        workspace = resolution.workspace,
                        "skipping conflicting dependency request"
                    );
                    outcome.skipped.push(resolution.clone());
                    continue;
                }
                ResolutionAction::UseCatalog { .. } => {
                    per_workspace
                        .entry(resolution.workspace.clone())
                        .or_default()
                        .push((
                            resolution.name.clone(),
                            CATALOG_SENTINEL.to_string(),
                            resolution.dep_type,
                        ));
                }
                ResolutionAction::AddDirect { version } => {
                    per_workspace
                        .entry(resolution.workspace.clone())
                        .or_default()
                        .push((resolution.name.clone(), version.clone(), resolution.dep_type));
                }
                ResolutionAction::AddToCatalog { entry } => {
                    if !catalogued.contains(&entry.name) {
                        catalog_entries.push(entry.clone());
                        catalogued.push(entry.name.clone());
                    }
                    per_workspace
                        .entry(resolution.workspace.clone())
                        .or_default()
                        .push((
                            resolution.name.clone(),
                            CATALOG_SENTINEL.to_string(),
                            resolution.dep_type,
                        ));
                }
            }
            outcome.applied.push(resolution.clone());
        }

        self.catalog.insert(&catalog_entries)?;
        for (workspace, entries) in &per_workspace {
            self.manifests.insert(workspace, entries)?;
        }
        for name in &catalogued {
            let (_, warnings) = self.manifests.rewrite_to_sentinel(name);
            outcome.warnings.extend(warnings);
        }

        Ok(outcome)
    }
}
