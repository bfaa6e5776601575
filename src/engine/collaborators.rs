//! Collaborator seams driven by the composition engine.
//!
//! The engine only knows these traits; concrete implementations live in
//! their own modules (`template`, `edit`, `script`). Tests inject doubles to
//! observe engine behavior without touching the filesystem or spawning
//! processes.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::feature::{EditSpec, ScriptStep};

/// Renders a template file or tree into the workspace.
pub trait TemplateRenderer {
    /// Render `source` (file or directory) to `target`, returning the
    /// written paths.
    fn render(
        &self,
        source: &Path,
        target: &Path,
        context: &serde_json::Value,
    ) -> Result<Vec<PathBuf>>;
}

/// Applies a single edit instruction to an existing file.
///
/// The engine never inspects edited file contents; whatever mechanism sits
/// behind this trait owns the file format.
pub trait FileEditor {
    fn apply(&self, root: &Path, path: &Path, edit: &EditSpec) -> Result<()>;
}

/// Captured output of a finished script step.
#[derive(Debug, Default)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs one blocking shell step. A non-zero exit must surface as
/// `WeftError::ScriptExecution` with the captured output.
pub trait ScriptRunner {
    fn run(&self, root: &Path, step: &ScriptStep) -> Result<ScriptOutput>;
}

/// Refreshes the package manager's installed state after manifest
/// mutations. Failures are reported as warnings by the engine: the manifest
/// write has already succeeded.
pub trait PackageRefresher {
    fn refresh(&self, root: &Path, workspace: &str) -> Result<()>;
}

/// Refresher that does nothing; the default when no refresh command is
/// configured.
pub struct NoRefresh;

impl PackageRefresher for NoRefresh {
    fn refresh(&self, _root: &Path, workspace: &str) -> Result<()> {
        tracing::debug!(workspace, "no refresh command configured");
        Ok(())
    }
}
