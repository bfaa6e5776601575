//! Workspace-level document stores.
//!
//! Two documents describe a project: the root `workspace.yaml` descriptor
//! (member package globs plus the shared dependency catalog) and one
//! `package.json` manifest per member. Both stores are behind traits so the
//! resolver can run against in-memory doubles in tests.

pub mod catalog;
pub mod manifest;

pub use self::catalog::{CatalogEntry, CatalogStore, FsCatalogStore, WorkspaceDescriptor};
pub use self::manifest::{FsManifestStore, ManifestStore, PackageManifest, WorkspaceDependency};

/// Manifest version literal meaning "resolve from the shared catalog".
pub const CATALOG_SENTINEL: &str = "catalog:";

/// Workspace id addressing the project-root manifest.
pub const ROOT_WORKSPACE: &str = "root";
