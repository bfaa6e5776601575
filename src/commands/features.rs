//! List registered feature definitions.

use std::path::Path;

use anyhow::Result;
use console::style;

use crate::config::Settings;
use crate::feature::FeatureRegistry;

/// Options for the features command
#[derive(Debug, Clone, Default)]
pub struct FeaturesOptions {
    /// Print the registry as JSON
    pub json: bool,
}

/// Execute the features command
pub fn execute_features(root: &Path, options: FeaturesOptions) -> Result<()> {
    let settings = Settings::load(root)?;
    let registry = FeatureRegistry::load_dir(&root.join(&settings.features_dir))?;

    if options.json {
        let features: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&features)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!(
            "{} No features found under {}/",
            style("⚠").yellow(),
            settings.features_dir.display()
        );
        return Ok(());
    }

    println!("{} {} feature(s):\n", style("→").cyan(), registry.len());
    for feature in registry.iter() {
        println!(
            "  {} {}",
            style(&feature.id).cyan().bold(),
            feature.description.as_deref().unwrap_or("")
        );
        if !feature.depends_on.is_empty() {
            println!("      depends on: {}", feature.depends_on.join(", "));
        }
        println!(
            "      {} stage(s), {} question(s)",
            feature.stages.len(),
            feature.configuration.len()
        );
    }

    Ok(())
}
