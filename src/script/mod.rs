//! Shell step execution.
//!
//! Steps run synchronously: each blocks until its process exits, and a
//! failing step unwinds the whole run. There is no timeout; a hung process
//! hangs the run.

use std::path::Path;
use std::process::Command;

use crate::engine::collaborators::{PackageRefresher, ScriptOutput, ScriptRunner};
use crate::error::{Result, WeftError};
use crate::feature::ScriptStep;

/// Default script collaborator backed by `std::process::Command`.
pub struct ShellRunner;

impl ScriptRunner for ShellRunner {
    fn run(&self, root: &Path, step: &ScriptStep) -> Result<ScriptOutput> {
        let cwd = match &step.cwd {
            Some(rel) => root.join(rel),
            None => root.to_path_buf(),
        };

        let display_cmd = if step.args.is_empty() {
            step.command.clone()
        } else {
            format!("{} {}", step.command, step.args.join(" "))
        };
        tracing::info!(command = %display_cmd, cwd = %cwd.display(), "running script step");

        let output = Command::new(&step.command)
            .args(&step.args)
            .current_dir(&cwd)
            .envs(&step.env)
            .output()
            .map_err(|e| WeftError::ScriptExecution {
                command: display_cmd.clone(),
                status: "failed to spawn".to_string(),
                stdout: String::new(),
                stderr: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(WeftError::ScriptExecution {
                command: display_cmd,
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }

        Ok(ScriptOutput { stdout, stderr })
    }
}

/// Package-manager refresh that runs a configured argv (e.g.
/// `["pnpm", "install"]`) at the project root.
pub struct CommandRefresher {
    argv: Vec<String>,
}

impl CommandRefresher {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl PackageRefresher for CommandRefresher {
    fn refresh(&self, root: &Path, workspace: &str) -> Result<()> {
        let Some((command, args)) = self.argv.split_first() else {
            return Ok(());
        };
        tracing::debug!(workspace, command, "refreshing package manager state");

        let output = Command::new(command)
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| WeftError::Other(format!("refresh command failed to spawn: {e}")))?;

        if !output.status.success() {
            return Err(WeftError::Other(format!(
                "refresh command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
