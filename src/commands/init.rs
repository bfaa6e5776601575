//! Initialize a new weft project.
//!
//! Scaffolds the settings file, the workspace descriptor, the root manifest
//! and an empty features directory.

use std::path::Path;

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::config::{Settings, SETTINGS_FILE};
use crate::workspace::catalog::DESCRIPTOR_FILE;
use crate::workspace::manifest::MANIFEST_FILE;
use crate::workspace::FsCatalogStore;

/// Options for the init command
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Force overwrite existing settings
    pub force: bool,
    /// Skip interactive prompts
    pub yes: bool,
    /// Project name for the root manifest
    pub name: Option<String>,
}

/// Execute the init command
pub fn execute_init(root: &Path, options: InitOptions) -> Result<()> {
    let settings_path = root.join(SETTINGS_FILE);

    if settings_path.exists() && !options.force {
        eprintln!(
            "{} Settings file already exists. Use --force to overwrite.",
            style("✗").red()
        );
        std::process::exit(1);
    }

    let name = match options.name {
        Some(name) => name,
        None if options.yes => default_name(root),
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Project name")
            .default(default_name(root))
            .interact_text()?,
    };

    let mut settings = Settings::default();
    if !options.yes {
        settings.dependency_management.auto_catalog = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Catalog shared dependencies automatically?")
            .default(true)
            .interact()?;
    }

    settings.save(root)?;
    println!("{} Created {}", style("✓").green(), SETTINGS_FILE);

    let descriptor_path = root.join(DESCRIPTOR_FILE);
    if !descriptor_path.exists() {
        // Default descriptor: packages/* members, empty catalog.
        FsCatalogStore::open(root)?.save()?;
        println!("{} Created {}", style("✓").green(), DESCRIPTOR_FILE);
    }

    let manifest_path = root.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        let manifest = serde_json::json!({
            "name": name,
            "version": "0.0.0",
            "private": true,
        });
        std::fs::write(
            &manifest_path,
            serde_json::to_string_pretty(&manifest)? + "\n",
        )?;
        println!("{} Created {}", style("✓").green(), MANIFEST_FILE);
    }

    let features_dir = root.join(&settings.features_dir);
    if !features_dir.exists() {
        std::fs::create_dir_all(&features_dir)?;
        println!(
            "{} Created {}/ directory",
            style("✓").green(),
            settings.features_dir.display()
        );
    }

    println!("\n{}", style("Next steps:").bold());
    println!(
        "  1. Add feature definitions under {}",
        style(format!("{}/<id>/feature.json", settings.features_dir.display())).cyan()
    );
    println!(
        "  2. Run {} to assemble the workspace",
        style("weft generate <features>").cyan()
    );

    Ok(())
}

fn default_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "my-project".to_string())
}
