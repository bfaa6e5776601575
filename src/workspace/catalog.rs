//! Workspace descriptor and shared dependency catalog.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};

/// Descriptor file name at the project root.
pub const DESCRIPTOR_FILE: &str = "workspace.yaml";

fn default_packages() -> Vec<String> {
    vec!["packages/*".to_string()]
}

/// The workspace-wide descriptor: member package globs plus the flat
/// name→pinned-version catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,

    #[serde(default)]
    pub catalog: BTreeMap<String, String>,
}

impl Default for WorkspaceDescriptor {
    fn default() -> Self {
        Self {
            packages: default_packages(),
            catalog: BTreeMap::new(),
        }
    }
}

/// A shared pin: one name, one version, stored once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub version: String,
}

/// Read access plus single-write insertion for the shared catalog.
pub trait CatalogStore {
    /// The pinned version for a name, if catalogued.
    fn pinned(&self, name: &str) -> Option<String>;

    /// Snapshot of all catalog entries.
    fn entries(&self) -> BTreeMap<String, String>;

    /// Member package globs from the descriptor.
    fn member_patterns(&self) -> Vec<String>;

    /// Append entries and persist in one write. Existing pins win: the
    /// catalog holds exactly one version per name.
    fn insert(&mut self, entries: &[CatalogEntry]) -> Result<()>;
}

/// Catalog store backed by `workspace.yaml`.
#[derive(Debug)]
pub struct FsCatalogStore {
    path: PathBuf,
    descriptor: WorkspaceDescriptor,
}

impl FsCatalogStore {
    /// Open the descriptor at a project root. An absent file yields the
    /// default descriptor; it is only written once something is inserted.
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(DESCRIPTOR_FILE);
        let descriptor = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| WeftError::fs(&path, e))?;
            serde_yaml::from_str(&content)?
        } else {
            WorkspaceDescriptor::default()
        };
        Ok(Self { path, descriptor })
    }

    pub fn descriptor(&self) -> &WorkspaceDescriptor {
        &self.descriptor
    }

    /// Persist the descriptor.
    pub fn save(&self) -> Result<()> {
        let content = serde_yaml::to_string(&self.descriptor)?;
        std::fs::write(&self.path, content).map_err(|e| WeftError::fs(&self.path, e))?;
        Ok(())
    }
}

impl CatalogStore for FsCatalogStore {
    fn pinned(&self, name: &str) -> Option<String> {
        self.descriptor.catalog.get(name).cloned()
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.descriptor.catalog.clone()
    }

    fn member_patterns(&self) -> Vec<String> {
        self.descriptor.packages.clone()
    }

    fn insert(&mut self, entries: &[CatalogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        for entry in entries {
            self.descriptor
                .catalog
                .entry(entry.name.clone())
                .or_insert_with(|| entry.version.clone());
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absent_descriptor_defaults() {
        let temp = TempDir::new().unwrap();
        let store = FsCatalogStore::open(temp.path()).unwrap();
        assert_eq!(store.member_patterns(), vec!["packages/*".to_string()]);
        assert!(store.entries().is_empty());
        // No write happened for a read-only open.
        assert!(!temp.path().join(DESCRIPTOR_FILE).exists());
    }

    #[test]
    fn test_insert_persists_single_write() {
        let temp = TempDir::new().unwrap();
        let mut store = FsCatalogStore::open(temp.path()).unwrap();
        store
            .insert(&[
                CatalogEntry {
                    name: "react".to_string(),
                    version: "^18.0.0".to_string(),
                },
                CatalogEntry {
                    name: "typescript".to_string(),
                    version: "~5.4.0".to_string(),
                },
            ])
            .unwrap();

        let reloaded = FsCatalogStore::open(temp.path()).unwrap();
        assert_eq!(reloaded.pinned("react").unwrap(), "^18.0.0");
        assert_eq!(reloaded.pinned("typescript").unwrap(), "~5.4.0");
    }

    #[test]
    fn test_existing_pin_wins() {
        let temp = TempDir::new().unwrap();
        let mut store = FsCatalogStore::open(temp.path()).unwrap();
        store
            .insert(&[CatalogEntry {
                name: "react".to_string(),
                version: "^18.0.0".to_string(),
            }])
            .unwrap();
        store
            .insert(&[CatalogEntry {
                name: "react".to_string(),
                version: "^17.0.0".to_string(),
            }])
            .unwrap();
        assert_eq!(store.pinned("react").unwrap(), "^18.0.0");
    }

    #[test]
    fn test_reads_existing_descriptor() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(DESCRIPTOR_FILE),
            "packages:\n  - apps/*\n  - packages/*\ncatalog:\n  react: ^18.2.0\n",
        )
        .unwrap();
        let store = FsCatalogStore::open(temp.path()).unwrap();
        assert_eq!(store.member_patterns().len(), 2);
        assert_eq!(store.pinned("react").unwrap(), "^18.2.0");
    }
}
