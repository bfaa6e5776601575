//! The composition engine.
//!
//! Drives a generation run: orders the selected features by their
//! dependency graph, evaluates per-stage activation against the answer map,
//! and executes each active stage's actions in the fixed order
//! dependencies → scripts → templates → edits. Execution is strictly
//! sequential; nothing overlaps.

pub mod collaborators;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::answers::{interpolate, to_json, AnswerMap};
use crate::config::Settings;
use crate::error::Result;
use crate::feature::{condition, resolution_order, FeatureRegistry, Stage};
use crate::resolve::DependencyResolver;
use crate::workspace::{CatalogStore, FsCatalogStore, FsManifestStore};

use self::collaborators::{FileEditor, NoRefresh, PackageRefresher, ScriptRunner, TemplateRenderer};

/// Identifies one stage of one feature in the run report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRef {
    pub feature: String,
    pub stage: String,
}

/// What a generation run did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Features in execution order.
    pub features: Vec<String>,
    pub executed_stages: Vec<StageRef>,
    pub skipped_stages: Vec<StageRef>,
    pub resolutions: Vec<crate::resolve::DependencyResolution>,
    /// Conflicting requests that were skipped (retry with `force`).
    pub conflicts: Vec<crate::resolve::DependencyResolution>,
    pub warnings: Vec<String>,
}

/// Orchestrates feature execution against one project root.
pub struct CompositionEngine {
    root: PathBuf,
    registry: FeatureRegistry,
    settings: Settings,
    templates: Box<dyn TemplateRenderer>,
    editor: Box<dyn FileEditor>,
    scripts: Box<dyn ScriptRunner>,
    refresher: Box<dyn PackageRefresher>,
}

impl CompositionEngine {
    /// Engine with the default collaborators. The refresher comes from the
    /// settings' `refreshCommand` when present.
    pub fn new(root: PathBuf, registry: FeatureRegistry, settings: Settings) -> Self {
        let refresher: Box<dyn PackageRefresher> = match &settings.refresh_command {
            Some(argv) => Box::new(crate::script::CommandRefresher::new(argv.clone())),
            None => Box::new(NoRefresh),
        };

        Self {
            root,
            registry,
            settings,
            templates: Box::new(crate::template::HandlebarsRenderer::new()),
            editor: Box::new(crate::edit::TextFileEditor),
            scripts: Box::new(crate::script::ShellRunner),
            refresher,
        }
    }

    pub fn with_templates(mut self, templates: Box<dyn TemplateRenderer>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_editor(mut self, editor: Box<dyn FileEditor>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_scripts(mut self, scripts: Box<dyn ScriptRunner>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn with_refresher(mut self, refresher: Box<dyn PackageRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Execute the selected features against the answer map.
    ///
    /// Graph errors abort before any mutation. Inactive stages are skipped
    /// and logged. Script failures abort immediately; there is no rollback
    /// of mutations already applied.
    pub fn run(&self, selected: &[String], answers: &AnswerMap) -> Result<RunReport> {
        let order = resolution_order(&self.registry, selected)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, features = ?order, "starting generation run");

        let mut catalog = FsCatalogStore::open(&self.root)?;
        let mut manifests = FsManifestStore::open(&self.root, &catalog.member_patterns())?;

        let mut report = RunReport {
            run_id,
            started_at,
            finished_at: started_at,
            features: order.clone(),
            executed_stages: Vec::new(),
            skipped_stages: Vec::new(),
            resolutions: Vec::new(),
            conflicts: Vec::new(),
            warnings: Vec::new(),
        };

        for feature_id in &order {
            let feature =
                self.registry
                    .get(feature_id)
                    .ok_or_else(|| crate::error::WeftError::UnknownFeature {
                        feature: feature_id.clone(),
                    })?;

            for stage in &feature.stages {
                let stage_ref = StageRef {
                    feature: feature_id.clone(),
                    stage: stage.name.clone(),
                };

                if let Some(cond) = &stage.condition {
                    if !condition::evaluate(cond, answers, feature_id) {
                        tracing::info!(
                            feature = feature_id,
                            stage = stage.name,
                            "stage condition not met; skipping"
                        );
                        report.skipped_stages.push(stage_ref);
                        continue;
                    }
                }

                tracing::info!(feature = feature_id, stage = stage.name, "executing stage");
                self.run_stage(
                    feature_id,
                    stage,
                    answers,
                    &mut catalog,
                    &mut manifests,
                    &mut report,
                )?;
                report.executed_stages.push(stage_ref);
            }
        }

        report.finished_at = Utc::now();
        tracing::info!(
            %run_id,
            executed = report.executed_stages.len(),
            skipped = report.skipped_stages.len(),
            "generation run finished"
        );
        Ok(report)
    }

    fn run_stage(
        &self,
        feature_id: &str,
        stage: &Stage,
        answers: &AnswerMap,
        catalog: &mut FsCatalogStore,
        manifests: &mut FsManifestStore,
        report: &mut RunReport,
    ) -> Result<()> {
        // 1. Dependencies.
        for request in &stage.dependencies {
            let mut request = request.clone();
            request.workspace = interpolate(&request.workspace, answers)?;

            let mut resolver = DependencyResolver::new(
                &mut *catalog,
                &mut *manifests,
                self.settings.dependency_management.clone(),
            );
            let resolutions = resolver.resolve(&request)?;

            let mut applied_any = false;
            for resolution in resolutions {
                if resolution.is_conflict() {
                    tracing::warn!(
                        feature = feature_id,
                        stage = stage.name,
                        name = resolution.name,
                        workspace = resolution.workspace,
                        "dependency conflict; request skipped (use force to overwrite)"
                    );
                    report.conflicts.push(resolution);
                    continue;
                }
                let warnings = resolver.apply(&resolution)?;
                report.warnings.extend(warnings);
                report.resolutions.push(resolution);
                applied_any = true;
            }

            // Manifest mutations succeeded; a refresh failure is only a
            // warning.
            if applied_any {
                if let Err(e) = self.refresher.refresh(&self.root, &request.workspace) {
                    let warning =
                        format!("package refresh failed for '{}': {}", request.workspace, e);
                    tracing::warn!(feature = feature_id, stage = stage.name, "{warning}");
                    report.warnings.push(warning);
                }
            }
        }

        // 2. Scripts: any failure is fatal and aborts the run.
        for step in &stage.scripts {
            if let Err(e) = self.scripts.run(&self.root, step) {
                tracing::error!(
                    feature = feature_id,
                    stage = stage.name,
                    "script step failed; aborting run"
                );
                return Err(e);
            }
        }

        // 3. Templates.
        let context = to_json(answers);
        for instruction in &stage.templates {
            let feature_dir = self
                .registry
                .get(feature_id)
                .and_then(|f| f.dir.clone())
                .unwrap_or_else(|| self.root.clone());
            let source = feature_dir.join(&instruction.source);
            let target = self.root.join(interpolate(&instruction.target, answers)?);

            let written = self.templates.render(&source, &target, &context)?;
            tracing::debug!(
                feature = feature_id,
                stage = stage.name,
                files = written.len(),
                "rendered templates"
            );
        }

        // 4. Edits.
        for instruction in &stage.edits {
            let path = PathBuf::from(interpolate(&instruction.path, answers)?);
            self.editor.apply(&self.root, &path, &instruction.edit)?;
        }

        Ok(())
    }
}
