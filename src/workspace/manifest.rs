//! Per-package dependency manifests.
//!
//! Every workspace member (and the project root) carries a `package.json`
//! with optional `dependencies`/`devDependencies` maps. Fields the store
//! does not model are preserved round-trip.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};
use crate::feature::DependencyType;

use super::{CATALOG_SENTINEL, ROOT_WORKSPACE};

/// Manifest file name inside each member directory.
pub const MANIFEST_FILE: &str = "package.json";

/// A member package's dependency manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,

    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Everything else in the document, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageManifest {
    pub fn deps(&self, dep_type: DependencyType) -> &BTreeMap<String, String> {
        match dep_type {
            DependencyType::Runtime => &self.dependencies,
            DependencyType::Dev => &self.dev_dependencies,
        }
    }

    pub fn deps_mut(&mut self, dep_type: DependencyType) -> &mut BTreeMap<String, String> {
        match dep_type {
            DependencyType::Runtime => &mut self.dependencies,
            DependencyType::Dev => &mut self.dev_dependencies,
        }
    }
}

/// One dependency entry as it exists on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDependency {
    pub workspace: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
}

impl WorkspaceDependency {
    pub fn uses_catalog(&self) -> bool {
        self.version == CATALOG_SENTINEL
    }
}

/// Read/write access to every member manifest.
///
/// `insert` persists one workspace's manifest in a single write; the
/// sentinel rewrite is best-effort per file and reports failures instead of
/// aborting.
pub trait ManifestStore {
    fn workspaces(&self) -> Vec<String>;

    fn has_workspace(&self, workspace: &str) -> bool;

    /// Raw version literal for a dependency, sentinel included.
    fn version_of(&self, workspace: &str, name: &str, dep_type: DependencyType)
        -> Option<String>;

    /// Non-sentinel version literal for a dependency.
    fn direct_version(
        &self,
        workspace: &str,
        name: &str,
        dep_type: DependencyType,
    ) -> Option<String> {
        self.version_of(workspace, name, dep_type)
            .filter(|v| v != CATALOG_SENTINEL)
    }

    /// Number of workspaces holding `name` as a direct (non-sentinel)
    /// dependency in either map.
    fn direct_usage_count(&self, name: &str) -> usize;

    /// Every direct (workspace, version) pair for `name`, in deterministic
    /// store order.
    fn direct_literals(&self, name: &str) -> Vec<(String, String)>;

    /// Flat snapshot of every dependency entry, for analysis.
    fn all_dependencies(&self) -> Vec<WorkspaceDependency>;

    /// Set entries in one workspace's manifest and persist it in one write.
    fn insert(
        &mut self,
        workspace: &str,
        entries: &[(String, String, DependencyType)],
    ) -> Result<()>;

    /// Rewrite every direct reference to `name` (any workspace, both maps)
    /// to the catalog sentinel. Returns the rewritten workspaces and a
    /// warning per workspace whose write failed.
    fn rewrite_to_sentinel(&mut self, name: &str) -> (Vec<String>, Vec<String>);
}

#[derive(Debug)]
struct Member {
    path: PathBuf,
    manifest: PackageManifest,
}

/// Manifest store backed by `package.json` files discovered through the
/// descriptor's member globs.
#[derive(Debug)]
pub struct FsManifestStore {
    members: BTreeMap<String, Member>,
}

impl FsManifestStore {
    /// Discover and load all member manifests under a project root.
    ///
    /// Workspace ids are manifest `name` fields (directory basename as
    /// fallback); the root manifest, when present, is addressable as
    /// `root`.
    pub fn open(root: &Path, patterns: &[String]) -> Result<Self> {
        let mut members = BTreeMap::new();

        let root_manifest = root.join(MANIFEST_FILE);
        if root_manifest.is_file() {
            let manifest = read_manifest(&root_manifest)?;
            members.insert(
                ROOT_WORKSPACE.to_string(),
                Member {
                    path: root_manifest,
                    manifest,
                },
            );
        }

        for pattern in patterns {
            let full = root.join(pattern);
            let glob_pattern = full.to_string_lossy().to_string();
            let paths = glob::glob(&glob_pattern)
                .map_err(|e| WeftError::ConfigValidation(format!("bad member glob '{pattern}': {e}")))?;

            for entry in paths.filter_map(|p| p.ok()) {
                let manifest_path = entry.join(MANIFEST_FILE);
                if !manifest_path.is_file() {
                    continue;
                }
                let manifest = read_manifest(&manifest_path)?;
                let id = manifest
                    .name
                    .clone()
                    .unwrap_or_else(|| {
                        entry
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_default()
                    });
                if members.contains_key(&id) {
                    tracing::warn!(workspace = id, "duplicate workspace id; keeping first");
                    continue;
                }
                members.insert(
                    id,
                    Member {
                        path: manifest_path,
                        manifest,
                    },
                );
            }
        }

        Ok(Self { members })
    }

    /// The manifest document for a workspace, if known.
    pub fn manifest(&self, workspace: &str) -> Option<&PackageManifest> {
        self.members.get(workspace).map(|m| &m.manifest)
    }

    fn save(member: &Member) -> Result<()> {
        let content = serde_json::to_string_pretty(&member.manifest)?;
        std::fs::write(&member.path, content + "\n")
            .map_err(|e| WeftError::fs(&member.path, e))
    }
}

fn read_manifest(path: &Path) -> Result<PackageManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| WeftError::fs(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| WeftError::ConfigValidation(format!("{}: {}", path.display(), e)))
}

impl ManifestStore for FsManifestStore {
    fn workspaces(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    fn has_workspace(&self, workspace: &str) -> bool {
        self.members.contains_key(workspace)
    }

    fn version_of(
        &self,
        workspace: &str,
        name: &str,
        dep_type: DependencyType,
    ) -> Option<String> {
        self.members
            .get(workspace)
            .and_then(|m| m.manifest.deps(dep_type).get(name))
            .cloned()
    }

    fn direct_usage_count(&self, name: &str) -> usize {
        self.members
            .values()
            .filter(|m| {
                [DependencyType::Runtime, DependencyType::Dev]
                    .iter()
                    .any(|t| {
                        m.manifest
                            .deps(*t)
                            .get(name)
                            .is_some_and(|v| v != CATALOG_SENTINEL)
                    })
            })
            .count()
    }

    fn direct_literals(&self, name: &str) -> Vec<(String, String)> {
        let mut literals = Vec::new();
        for (id, member) in &self.members {
            for dep_type in [DependencyType::Runtime, DependencyType::Dev] {
                if let Some(version) = member.manifest.deps(dep_type).get(name) {
                    if version != CATALOG_SENTINEL {
                        literals.push((id.clone(), version.clone()));
                    }
                }
            }
        }
        literals
    }

    fn all_dependencies(&self) -> Vec<WorkspaceDependency> {
        let mut all = Vec::new();
        for (id, member) in &self.members {
            for dep_type in [DependencyType::Runtime, DependencyType::Dev] {
                for (name, version) in member.manifest.deps(dep_type) {
                    all.push(WorkspaceDependency {
                        workspace: id.clone(),
                        name: name.clone(),
                        version: version.clone(),
                        dep_type,
                    });
                }
            }
        }
        all
    }

    fn insert(
        &mut self,
        workspace: &str,
        entries: &[(String, String, DependencyType)],
    ) -> Result<()> {
        let member = self
            .members
            .get_mut(workspace)
            .ok_or_else(|| WeftError::UnknownWorkspace {
                workspace: workspace.to_string(),
            })?;

        for (name, version, dep_type) in entries {
            member
                .manifest
                .deps_mut(*dep_type)
                .insert(name.clone(), version.clone());
        }
        Self::save(member)
    }

    fn rewrite_to_sentinel(&mut self, name: &str) -> (Vec<String>, Vec<String>) {
        let mut rewritten = Vec::new();
        let mut warnings = Vec::new();

        for (id, member) in &mut self.members {
            let mut touched = false;
            for dep_type in [DependencyType::Runtime, DependencyType::Dev] {
                let deps = member.manifest.deps_mut(dep_type);
                if let Some(version) = deps.get_mut(name) {
                    if version != CATALOG_SENTINEL {
                        *version = CATALOG_SENTINEL.to_string();
                        touched = true;
                    }
                }
            }
            if touched {
                match Self::save(member) {
                    Ok(()) => rewritten.push(id.clone()),
                    Err(e) => warnings.push(format!(
                        "failed to rewrite '{name}' to catalog reference in '{id}': {e}"
                    )),
                }
            }
        }

        (rewritten, warnings)
    }
}
