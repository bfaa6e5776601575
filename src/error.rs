//! Error types for the weft library.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, WeftError>;

/// All errors the composition core can produce.
///
/// Graph and configuration errors are fatal before any mutation; dependency
/// conflicts are recoverable per request (retry with `force`); script
/// failures abort the run with no rollback of already-applied mutations.
#[derive(Debug, Error)]
pub enum WeftError {
    /// The feature graph contains a cycle through the named feature.
    #[error("circular feature dependency detected at '{feature}'")]
    CircularDependency { feature: String },

    /// A selected feature or a dependency references an id that was never
    /// registered.
    #[error("unknown feature '{feature}'")]
    UnknownFeature { feature: String },

    /// A dependency request targets a workspace the descriptor does not know.
    #[error("unknown workspace '{workspace}'")]
    UnknownWorkspace { workspace: String },

    /// The destination workspace already holds the package at another version.
    #[error(
        "dependency conflict for '{name}' in '{workspace}': \
         existing {existing}, requested {requested}"
    )]
    DependencyConflict {
        name: String,
        workspace: String,
        existing: String,
        requested: String,
    },

    /// A shell step exited non-zero; captures process output for the report.
    #[error("script '{command}' failed with {status}")]
    ScriptExecution {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    /// Catalog or manifest I/O failed. Fatal: downstream resolution decisions
    /// require consistent on-disk state.
    #[error("filesystem error at {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed project settings. Fatal at startup.
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    /// A `{placeholder}` in a workspace id or instruction path has no
    /// scalar answer to resolve against.
    #[error("unresolved placeholder '{{{placeholder}}}' in '{input}'")]
    UnresolvedPlaceholder { placeholder: String, input: String },

    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl WeftError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WeftError::FileSystem {
            path: path.into(),
            source,
        }
    }
}
