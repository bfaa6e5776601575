//! Feature definition loading and lookup.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, WeftError};

use super::Feature;

/// Definition file name inside each feature directory.
pub const FEATURE_FILE: &str = "feature.json";

/// All known feature definitions, loaded once per run.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, Feature>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<dir>/<id>/feature.json` under a features directory.
    ///
    /// A missing directory yields an empty registry; a malformed definition
    /// file is fatal.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "features directory missing; empty registry");
            return Ok(registry);
        }

        let entries = std::fs::read_dir(dir).map_err(|e| WeftError::fs(dir, e))?;
        let mut dirs: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir() && p.join(FEATURE_FILE).is_file())
            .collect();
        dirs.sort();

        for feature_dir in dirs {
            let path = feature_dir.join(FEATURE_FILE);
            let content =
                std::fs::read_to_string(&path).map_err(|e| WeftError::fs(&path, e))?;
            let mut feature: Feature = serde_json::from_str(&content).map_err(|e| {
                WeftError::ConfigValidation(format!("{}: {}", path.display(), e))
            })?;

            let dir_name = feature_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if feature.id != dir_name {
                tracing::warn!(
                    id = feature.id,
                    dir = dir_name,
                    "feature id does not match its directory name"
                );
            }

            feature.dir = Some(feature_dir);
            registry.register(feature)?;
        }

        Ok(registry)
    }

    /// Register a feature definition. Duplicate ids are rejected: the
    /// registry is the single source of truth for the graph resolver.
    pub fn register(&mut self, mut feature: Feature) -> Result<()> {
        if self.features.contains_key(&feature.id) {
            return Err(WeftError::ConfigValidation(format!(
                "duplicate feature id '{}'",
                feature.id
            )));
        }
        feature.depends_on.dedup();
        self.features.insert(feature.id.clone(), feature);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_feature(root: &Path, id: &str, body: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(FEATURE_FILE), body).unwrap();
    }

    #[test]
    fn test_load_dir_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        let registry = FeatureRegistry::load_dir(&temp.path().join("features")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_dir_reads_definitions_and_records_dir() {
        let temp = TempDir::new().unwrap();
        write_feature(
            temp.path(),
            "react",
            r#"{"id": "react", "dependsOn": ["base"], "stages": []}"#,
        );
        write_feature(temp.path(), "base", r#"{"id": "base"}"#);

        let registry = FeatureRegistry::load_dir(temp.path()).unwrap();
        assert_eq!(registry.len(), 2);
        let react = registry.get("react").unwrap();
        assert_eq!(react.depends_on, vec!["base".to_string()]);
        assert!(react.dir.as_ref().unwrap().ends_with("react"));
    }

    #[test]
    fn test_malformed_definition_is_fatal() {
        let temp = TempDir::new().unwrap();
        write_feature(temp.path(), "bad", "{nope");
        assert!(matches!(
            FeatureRegistry::load_dir(temp.path()),
            Err(WeftError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = FeatureRegistry::new();
        let feature = Feature {
            id: "a".to_string(),
            description: None,
            depends_on: Vec::new(),
            configuration: Vec::new(),
            stages: Vec::new(),
            dir: None,
        };
        registry.register(feature.clone()).unwrap();
        assert!(registry.register(feature).is_err());
    }
}
