//! Add dependencies through the resolver from the command line.

use std::path::Path;

use anyhow::Result;
use console::style;

use crate::config::Settings;
use crate::engine::collaborators::PackageRefresher;
use crate::feature::{DependencyRequest, DependencyType};
use crate::resolve::{DependencyResolver, ResolutionAction};
use crate::script::CommandRefresher;
use crate::workspace::{CatalogStore, FsCatalogStore, FsManifestStore};

/// Options for the add command
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Package names to add
    pub packages: Vec<String>,
    /// Destination workspace id
    pub workspace: String,
    /// Add to devDependencies
    pub dev: bool,
    /// Explicit version
    pub version: Option<String>,
    /// Overwrite a conflicting version
    pub force: bool,
    /// Print resolutions as JSON
    pub json: bool,
}

/// Execute the add command
pub fn execute_add(root: &Path, options: AddOptions) -> Result<()> {
    let settings = Settings::load(root)?;
    let mut catalog = FsCatalogStore::open(root)?;
    let mut manifests = FsManifestStore::open(root, &catalog.member_patterns())?;

    let mut request = DependencyRequest::new(options.packages.clone(), &options.workspace);
    request.dep_type = if options.dev {
        DependencyType::Dev
    } else {
        DependencyType::Runtime
    };
    request.version = options.version.clone();
    request.force = options.force;

    let mut resolver = DependencyResolver::new(
        &mut catalog,
        &mut manifests,
        settings.dependency_management.clone(),
    );
    let resolutions = resolver.resolve_all(std::slice::from_ref(&request))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&resolutions)?);
    }

    let outcome = resolver.apply_all(&resolutions)?;
    drop(resolver);

    for resolution in &outcome.applied {
        let action = match &resolution.action {
            ResolutionAction::UseCatalog { version } => {
                format!("using catalog pin {version}")
            }
            ResolutionAction::AddToCatalog { entry } => {
                format!("catalogued at {}", entry.version)
            }
            ResolutionAction::AddDirect { version } => format!("added {version}"),
            ResolutionAction::Conflict { .. } => unreachable!("conflicts are skipped"),
        };
        println!(
            "{} {} → {} ({})",
            style("✓").green(),
            resolution.name,
            resolution.workspace,
            action
        );
    }
    for skipped in &outcome.skipped {
        if let ResolutionAction::Conflict {
            existing,
            requested,
        } = &skipped.action
        {
            eprintln!(
                "{} {} in '{}': existing {}, requested {}. Re-run with --force to overwrite.",
                style("✗").red(),
                skipped.name,
                skipped.workspace,
                existing,
                requested
            );
        }
    }
    for warning in &outcome.warnings {
        println!("{} {}", style("⚠").yellow(), warning);
    }

    if !outcome.applied.is_empty() {
        if let Some(argv) = &settings.refresh_command {
            let refresher = CommandRefresher::new(argv.clone());
            if let Err(e) = refresher.refresh(root, &options.workspace) {
                println!("{} package refresh failed: {}", style("⚠").yellow(), e);
            }
        }
    }

    if outcome.applied.is_empty() && !outcome.skipped.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
