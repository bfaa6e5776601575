#![forbid(unsafe_code)]

//! # Weft
//!
//! Feature-driven workspace generator with shared dependency catalogs.
//!
//! A project is assembled from declarative **features**: each one names the
//! features it depends on, the configuration questions it consumes, and an
//! ordered list of **stages** (dependency additions, shell steps, templates,
//! file edits) guarded by activation conditions over the collected answers.
//! Package dependencies flow through a resolver that decides, per request,
//! whether a name is pinned once in the workspace-wide **catalog** or added
//! directly to one member's manifest.
//!
//! ## Example
//!
//! ```rust,no_run
//! use weft::{AnswerMap, CompositionEngine, FeatureRegistry, Settings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let root = std::path::PathBuf::from(".");
//!     let settings = Settings::load(&root)?;
//!     let registry = FeatureRegistry::load_dir(&root.join(&settings.features_dir))?;
//!
//!     let engine = CompositionEngine::new(root, registry, settings);
//!     let report = engine.run(&["react-app".to_string()], &AnswerMap::new())?;
//!     println!("{} stages executed", report.executed_stages.len());
//!     Ok(())
//! }
//! ```

pub mod answers;
pub mod commands;
pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod feature;
pub mod resolve;
pub mod script;
pub mod template;
pub mod workspace;

// Re-exports
pub use answers::{interpolate, AnswerMap, AnswerValue};
pub use config::{DependencyManagement, Settings};
pub use engine::{
    collaborators::{FileEditor, PackageRefresher, ScriptOutput, ScriptRunner, TemplateRenderer},
    CompositionEngine, RunReport, StageRef,
};
pub use error::{Result, WeftError};
pub use feature::{
    evaluate, resolution_order, ActivationCondition, DependencyRequest, DependencyType, Feature,
    FeatureRegistry, Stage,
};
pub use resolve::{
    analyze::{analyze, apply_suggestions, OptimizationReport, Suggestion, SuggestionKind},
    version::{format_version, VersionStrategy},
    BatchOutcome, DependencyResolution, DependencyResolver, ResolutionAction,
};
pub use workspace::{
    CatalogEntry, CatalogStore, FsCatalogStore, FsManifestStore, ManifestStore, PackageManifest,
    WorkspaceDependency, CATALOG_SENTINEL,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
