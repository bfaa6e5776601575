//! Assemble the workspace from selected features.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::answers::{AnswerMap, AnswerValue};
use crate::config::Settings;
use crate::engine::CompositionEngine;
use crate::feature::{resolution_order, FeatureRegistry, QuestionKind};

/// Options for the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Selected feature ids
    pub features: Vec<String>,
    /// JSON file with pre-collected answers
    pub answers_file: Option<PathBuf>,
    /// Skip prompts and use declared defaults
    pub yes: bool,
    /// Print the run report as JSON
    pub json: bool,
}

/// Execute the generate command
pub fn execute_generate(root: &Path, options: GenerateOptions) -> Result<()> {
    let settings = Settings::load(root)?;
    let registry = FeatureRegistry::load_dir(&root.join(&settings.features_dir))?;

    if options.features.is_empty() {
        eprintln!(
            "{} No features selected. Run {} to see what is available.",
            style("✗").red(),
            style("weft features").cyan()
        );
        std::process::exit(1);
    }

    // Order first: questions are asked in execution order, and graph errors
    // surface before any prompt or mutation.
    let order = resolution_order(&registry, &options.features)?;
    println!(
        "{} Composing {} feature(s): {}",
        style("→").cyan(),
        order.len(),
        order.join(", ")
    );

    let mut answers = match &options.answers_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading answers file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing answers file {}", path.display()))?
        }
        None => AnswerMap::new(),
    };
    collect_answers(&registry, &order, &mut answers, options.yes)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").expect("spinner template"),
    );
    spinner.set_message("running stages...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let engine = CompositionEngine::new(root.to_path_buf(), registry, settings);
    let report = match engine.run(&order, &answers) {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    println!(
        "{} Executed {} stage(s), skipped {}",
        style("✓").green(),
        report.executed_stages.len(),
        report.skipped_stages.len()
    );
    for skipped in &report.skipped_stages {
        println!(
            "    {} {}/{} (condition not met)",
            style("·").dim(),
            skipped.feature,
            skipped.stage
        );
    }
    for conflict in &report.conflicts {
        println!(
            "{} Skipped conflicting dependency '{}' in '{}' (use force to overwrite)",
            style("⚠").yellow(),
            conflict.name,
            conflict.workspace
        );
    }
    for warning in &report.warnings {
        println!("{} {}", style("⚠").yellow(), warning);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Fill in unanswered questions, feature by feature in execution order.
fn collect_answers(
    registry: &FeatureRegistry,
    order: &[String],
    answers: &mut AnswerMap,
    assume_defaults: bool,
) -> Result<()> {
    let theme = ColorfulTheme::default();

    for feature_id in order {
        let Some(feature) = registry.get(feature_id) else {
            continue;
        };
        for question in &feature.configuration {
            if answers.contains_key(&question.id) {
                continue;
            }

            if assume_defaults {
                if let Some(default) = &question.default {
                    answers.insert(question.id.clone(), default.clone());
                }
                // Unanswered questions stay absent; conditions degrade to
                // false.
                continue;
            }

            let value = match question.kind {
                QuestionKind::Confirm => {
                    let default = matches!(question.default, Some(AnswerValue::Bool(true)));
                    AnswerValue::Bool(
                        Confirm::with_theme(&theme)
                            .with_prompt(question.prompt.clone())
                            .default(default)
                            .interact()?,
                    )
                }
                QuestionKind::Select => {
                    let index = Select::with_theme(&theme)
                        .with_prompt(question.prompt.clone())
                        .items(&question.options)
                        .default(0)
                        .interact()?;
                    AnswerValue::String(question.options[index].clone())
                }
                QuestionKind::MultiSelect => {
                    let indices = MultiSelect::with_theme(&theme)
                        .with_prompt(question.prompt.clone())
                        .items(&question.options)
                        .interact()?;
                    AnswerValue::Array(
                        indices
                            .into_iter()
                            .map(|i| AnswerValue::String(question.options[i].clone()))
                            .collect(),
                    )
                }
                QuestionKind::Text => {
                    let mut input = Input::<String>::with_theme(&theme)
                        .with_prompt(question.prompt.clone());
                    if let Some(default) = question.default.as_ref().and_then(|d| d.as_scalar()) {
                        input = input.default(default);
                    }
                    AnswerValue::String(input.interact_text()?)
                }
            };
            answers.insert(question.id.clone(), value);
        }
    }

    Ok(())
}
