//! Handlebars-backed template rendering.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use walkdir::WalkDir;

use crate::engine::collaborators::TemplateRenderer;
use crate::error::{Result, WeftError};

/// Default template collaborator: renders a single file or a whole template
/// tree with the answer map as context.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        // Missing keys render empty rather than failing the whole stage.
        registry.set_strict_mode(false);
        Self { registry }
    }

    fn render_file(
        &self,
        source: &Path,
        target: &Path,
        context: &serde_json::Value,
    ) -> Result<()> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WeftError::fs(parent, e))?;
        }

        let bytes = std::fs::read(source).map_err(|e| WeftError::fs(source, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => {
                let rendered = self.registry.render_template(&text, context)?;
                std::fs::write(target, rendered).map_err(|e| WeftError::fs(target, e))?;
            }
            // Non-UTF-8 assets (images, archives) are copied verbatim.
            Err(raw) => {
                std::fs::write(target, raw.into_bytes())
                    .map_err(|e| WeftError::fs(target, e))?;
            }
        }
        Ok(())
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(
        &self,
        source: &Path,
        target: &Path,
        context: &serde_json::Value,
    ) -> Result<Vec<PathBuf>> {
        if !source.exists() {
            return Err(WeftError::ConfigValidation(format!(
                "template source '{}' does not exist",
                source.display()
            )));
        }

        let mut written = Vec::new();

        if source.is_file() {
            self.render_file(source, target, context)?;
            written.push(target.to_path_buf());
            return Ok(written);
        }

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.map_err(|e| WeftError::Other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(source)
                .expect("walked path is under source");
            let out = target.join(rel);
            self.render_file(entry.path(), &out, context)?;
            written.push(out);
        }

        Ok(written)
    }
}
