//! Project settings loading and defaults.
//!
//! Settings live in `weft.config.json` at the project root. A missing file
//! means built-in defaults; a malformed file is fatal at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};
use crate::resolve::version::VersionStrategy;

/// Default settings file name, resolved against the project root.
pub const SETTINGS_FILE: &str = "weft.config.json";

fn default_config_schema() -> String {
    "https://weft-tools.dev/schemas/v1/config.schema.json".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("features")
}

/// Main weft configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// JSON Schema URL for validation
    #[serde(rename = "$schema", default = "default_config_schema")]
    pub schema: String,

    /// Settings format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Directory holding feature definitions (relative to the project root)
    #[serde(default = "default_features_dir", rename = "featuresDir")]
    pub features_dir: PathBuf,

    /// Catalog and version policy for dependency resolution
    #[serde(default, rename = "dependencyManagement")]
    pub dependency_management: DependencyManagement,

    /// Package-manager refresh command run after manifest mutations
    /// (argv form, e.g. `["pnpm", "install"]`). None disables refresh.
    #[serde(default, rename = "refreshCommand", skip_serializing_if = "Option::is_none")]
    pub refresh_command: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema: default_config_schema(),
            version: default_version(),
            features_dir: default_features_dir(),
            dependency_management: DependencyManagement::default(),
            refresh_command: None,
        }
    }
}

impl Settings {
    /// Load settings from a project root. Missing file is not an error;
    /// malformed content or invalid values are.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| WeftError::fs(&path, e))?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| WeftError::ConfigValidation(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a project root.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(SETTINGS_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content + "\n").map_err(|e| WeftError::fs(&path, e))?;
        Ok(())
    }

    /// Semantic validation beyond what serde enforces.
    pub fn validate(&self) -> Result<()> {
        if self.dependency_management.catalog_threshold == 0 {
            return Err(WeftError::ConfigValidation(
                "dependencyManagement.catalogThreshold must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_catalog_threshold() -> usize {
    2
}

/// Catalog and version policy consulted by the dependency resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyManagement {
    /// Catalog shared dependencies automatically
    #[serde(default = "default_true", rename = "autoCatalog")]
    pub auto_catalog: bool,

    /// Workspace count at which a dependency is promoted to the catalog
    #[serde(default = "default_catalog_threshold", rename = "catalogThreshold")]
    pub catalog_threshold: usize,

    /// Names always pinned in the catalog
    #[serde(default, rename = "commonDependencies")]
    pub common_dependencies: Vec<String>,

    /// Workspace id → names that stay direct in that workspace
    #[serde(default, rename = "workspaceSpecific")]
    pub workspace_specific: HashMap<String, Vec<String>>,

    /// Apply optimization suggestions automatically instead of only reporting
    #[serde(default, rename = "autoOptimize")]
    pub auto_optimize: bool,

    /// Version range formatting applied to every written version
    #[serde(default, rename = "versionStrategy")]
    pub version_strategy: VersionStrategy,
}

impl Default for DependencyManagement {
    fn default() -> Self {
        Self {
            auto_catalog: true,
            catalog_threshold: default_catalog_threshold(),
            common_dependencies: Vec::new(),
            workspace_specific: HashMap::new(),
            auto_optimize: false,
            version_strategy: VersionStrategy::default(),
        }
    }
}

impl DependencyManagement {
    /// Whether `name` must stay a direct dependency of `workspace`.
    pub fn is_workspace_specific(&self, workspace: &str, name: &str) -> bool {
        self.workspace_specific
            .get(workspace)
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }

    pub fn is_common(&self, name: &str) -> bool {
        self.common_dependencies.iter().any(|n| n == name)
    }
}
