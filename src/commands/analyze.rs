//! Dependency optimization report.

use std::path::Path;

use anyhow::Result;
use console::style;

use crate::config::Settings;
use crate::resolve::analyze::{analyze, apply_suggestions, ImpactTier, SuggestionKind};
use crate::workspace::{CatalogStore, FsCatalogStore, FsManifestStore};

/// Options for the analyze command
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Print the report as JSON
    pub json: bool,
    /// Apply catalog/duplicate-removal suggestions
    pub apply: bool,
}

/// Execute the analyze command
pub fn execute_analyze(root: &Path, options: AnalyzeOptions) -> Result<()> {
    let settings = Settings::load(root)?;
    let mut catalog = FsCatalogStore::open(root)?;
    let mut manifests = FsManifestStore::open(root, &catalog.member_patterns())?;

    let report = analyze(&catalog, &manifests);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_clean() {
        println!("{} No optimization opportunities found", style("✓").green());
    } else {
        if !report.duplicates.is_empty() {
            println!("{}", style("Duplicated dependencies:").bold());
            for dup in &report.duplicates {
                println!(
                    "  {} {} ({})",
                    style("·").dim(),
                    style(&dup.name).cyan(),
                    dup.versions.join(", ")
                );
                for occ in &dup.occurrences {
                    println!("      {} @ {}", occ.workspace, occ.version);
                }
            }
        }

        if !report.unused_catalog_entries.is_empty() {
            println!("{}", style("Unused catalog entries:").bold());
            for name in &report.unused_catalog_entries {
                println!("  {} {}", style("·").dim(), name);
            }
        }

        if !report.suggestions.is_empty() {
            println!("{}", style("Suggestions:").bold());
            for suggestion in &report.suggestions {
                let impact = match suggestion.impact {
                    ImpactTier::High => style("high").red(),
                    ImpactTier::Medium => style("medium").yellow(),
                    ImpactTier::Low => style("low").dim(),
                };
                let kind = match suggestion.kind {
                    SuggestionKind::Catalog => "catalog",
                    SuggestionKind::VersionConflict => "version-conflict",
                    SuggestionKind::DuplicateRemoval => "duplicate-removal",
                };
                println!(
                    "  {} [{}] {} — {}",
                    style("→").cyan(),
                    impact,
                    kind,
                    suggestion.detail
                );
            }
        }
    }

    let auto = settings.dependency_management.auto_optimize;
    if options.apply || auto {
        let applied = apply_suggestions(&report, &mut catalog, &mut manifests)?;
        if applied.catalogued.is_empty() {
            println!("{} Nothing to apply", style("·").dim());
        } else {
            println!(
                "{} Catalogued {} name(s); rewrote {} workspace manifest(s)",
                style("✓").green(),
                applied.catalogued.len(),
                applied.rewritten_workspaces.len()
            );
            for warning in &applied.warnings {
                println!("{} {}", style("⚠").yellow(), warning);
            }
        }
    }

    Ok(())
}
