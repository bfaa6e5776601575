//! Composition engine integration tests.
//!
//! Each test assembles a throwaway project (descriptor, members, feature
//! definitions) and drives the engine through the public API.

use std::path::Path;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use weft::engine::collaborators::{ScriptOutput, ScriptRunner};
use weft::feature::ScriptStep;
use weft::{
    AnswerMap, AnswerValue, CompositionEngine, FeatureRegistry, Settings, WeftError,
    CATALOG_SENTINEL,
};

// =============================================================================
// Fixture helpers
// =============================================================================

fn project(members: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("workspace.yaml"),
        "packages:\n  - packages/*\ncatalog: {}\n",
    )
    .unwrap();
    for member in members {
        let dir = temp.path().join("packages").join(member);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("package.json"),
            format!("{{\"name\": \"{member}\"}}"),
        )
        .unwrap();
    }
    temp
}

fn write_feature(root: &Path, id: &str, body: &str) {
    let dir = root.join("features").join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("feature.json"), body).unwrap();
}

fn engine(root: &Path) -> CompositionEngine {
    let registry = FeatureRegistry::load_dir(&root.join("features")).unwrap();
    CompositionEngine::new(root.to_path_buf(), registry, Settings::default())
}

fn manifest(root: &Path, member: &str) -> serde_json::Value {
    serde_json::from_str(
        &std::fs::read_to_string(root.join(format!("packages/{member}/package.json"))).unwrap(),
    )
    .unwrap()
}

fn answers(pairs: &[(&str, AnswerValue)]) -> AnswerMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Script runner double that records every command instead of spawning.
#[derive(Clone, Default)]
struct RecordingRunner {
    commands: Arc<Mutex<Vec<String>>>,
}

impl ScriptRunner for RecordingRunner {
    fn run(&self, _root: &Path, step: &ScriptStep) -> weft::Result<ScriptOutput> {
        self.commands.lock().unwrap().push(step.command.clone());
        Ok(ScriptOutput::default())
    }
}

/// Script runner double that always fails.
struct FailingRunner;

impl ScriptRunner for FailingRunner {
    fn run(&self, _root: &Path, step: &ScriptStep) -> weft::Result<ScriptOutput> {
        Err(WeftError::ScriptExecution {
            command: step.command.clone(),
            status: "exit status: 1".to_string(),
            stdout: String::new(),
            stderr: "boom".to_string(),
        })
    }
}

// =============================================================================
// Feature ordering
// =============================================================================

mod ordering_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dependencies_execute_before_dependents() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "app",
            r#"{"id": "app", "dependsOn": ["base"], "stages": [{"name": "setup"}]}"#,
        );
        write_feature(
            temp.path(),
            "base",
            r#"{"id": "base", "stages": [{"name": "setup"}]}"#,
        );

        let report = engine(temp.path())
            .run(&["app".to_string()], &AnswerMap::new())
            .unwrap();
        assert_eq!(report.features, vec!["base".to_string(), "app".to_string()]);
        assert_eq!(report.executed_stages.len(), 2);
        assert_eq!(report.executed_stages[0].feature, "base");
    }

    #[test]
    fn test_cycle_aborts_before_any_mutation() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "a",
            r#"{"id": "a", "dependsOn": ["b"], "stages": [{"name": "s", "edits": [{"path": "touched.txt", "kind": "append", "content": "x"}]}]}"#,
        );
        write_feature(temp.path(), "b", r#"{"id": "b", "dependsOn": ["a"]}"#);

        let err = engine(temp.path())
            .run(&["a".to_string()], &AnswerMap::new())
            .unwrap_err();
        assert!(matches!(err, WeftError::CircularDependency { .. }));
        assert!(!temp.path().join("touched.txt").exists());
    }

    #[test]
    fn test_unknown_feature_is_fatal() {
        let temp = project(&["web"]);
        write_feature(temp.path(), "a", r#"{"id": "a", "dependsOn": ["ghost"]}"#);
        assert!(matches!(
            engine(temp.path()).run(&["a".to_string()], &AnswerMap::new()),
            Err(WeftError::UnknownFeature { feature }) if feature == "ghost"
        ));
    }
}

// =============================================================================
// Stage activation
// =============================================================================

mod activation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEATURE: &str = r#"{
        "id": "ui",
        "stages": [
            {"name": "always", "edits": [{"path": "always.txt", "kind": "append", "content": "x\n"}]},
            {
                "name": "react-only",
                "condition": {"type": "equals", "question": "framework", "value": "react"},
                "edits": [{"path": "react.txt", "kind": "append", "content": "x\n"}]
            }
        ]
    }"#;

    #[test]
    fn test_inactive_stage_skipped_and_reported() {
        let temp = project(&["web"]);
        write_feature(temp.path(), "ui", FEATURE);

        let report = engine(temp.path())
            .run(
                &["ui".to_string()],
                &answers(&[("framework", "vue".into())]),
            )
            .unwrap();

        assert_eq!(report.executed_stages.len(), 1);
        assert_eq!(report.skipped_stages.len(), 1);
        assert_eq!(report.skipped_stages[0].stage, "react-only");
        assert!(temp.path().join("always.txt").exists());
        assert!(!temp.path().join("react.txt").exists());
    }

    #[test]
    fn test_active_stage_runs() {
        let temp = project(&["web"]);
        write_feature(temp.path(), "ui", FEATURE);

        let report = engine(temp.path())
            .run(
                &["ui".to_string()],
                &answers(&[("framework", "react".into())]),
            )
            .unwrap();

        assert_eq!(report.executed_stages.len(), 2);
        assert!(report.skipped_stages.is_empty());
        assert!(temp.path().join("react.txt").exists());
    }

    #[test]
    fn test_absent_answer_skips_rather_than_errors() {
        let temp = project(&["web"]);
        write_feature(temp.path(), "ui", FEATURE);

        let report = engine(temp.path())
            .run(&["ui".to_string()], &AnswerMap::new())
            .unwrap();
        assert_eq!(report.skipped_stages.len(), 1);
    }
}

// =============================================================================
// Dependency handling
// =============================================================================

mod dependency_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_direct_add_written_with_caret() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "http",
            r#"{"id": "http", "stages": [{"name": "deps", "dependencies": [
                {"names": "axios", "workspace": "web", "version": "1.7.0"}
            ]}]}"#,
        );

        let report = engine(temp.path())
            .run(&["http".to_string()], &AnswerMap::new())
            .unwrap();
        assert_eq!(report.resolutions.len(), 1);
        assert_eq!(manifest(temp.path(), "web")["dependencies"]["axios"], "^1.7.0");
    }

    #[test]
    fn test_second_workspace_promotes_to_catalog() {
        let temp = project(&["web", "api"]);
        write_feature(
            temp.path(),
            "shared",
            r#"{"id": "shared", "stages": [{"name": "deps", "dependencies": [
                {"names": "zod", "workspace": "web", "version": "3.23.0"},
                {"names": "zod", "workspace": "api", "version": "3.23.0"}
            ]}]}"#,
        );

        engine(temp.path())
            .run(&["shared".to_string()], &AnswerMap::new())
            .unwrap();

        let descriptor: serde_yaml::Value = serde_yaml::from_str(
            &std::fs::read_to_string(temp.path().join("workspace.yaml")).unwrap(),
        )
        .unwrap();
        assert_eq!(descriptor["catalog"]["zod"], "^3.23.0");
        assert_eq!(
            manifest(temp.path(), "web")["dependencies"]["zod"],
            CATALOG_SENTINEL
        );
        assert_eq!(
            manifest(temp.path(), "api")["dependencies"]["zod"],
            CATALOG_SENTINEL
        );
    }

    #[test]
    fn test_workspace_placeholder_resolved_from_answers() {
        let temp = project(&["web", "api"]);
        write_feature(
            temp.path(),
            "logging",
            r#"{"id": "logging", "stages": [{"name": "deps", "dependencies": [
                {"names": "pino", "workspace": "{target}", "version": "9.0.0"}
            ]}]}"#,
        );

        engine(temp.path())
            .run(
                &["logging".to_string()],
                &answers(&[("target", "api".into())]),
            )
            .unwrap();
        assert_eq!(manifest(temp.path(), "api")["dependencies"]["pino"], "^9.0.0");
    }

    #[test]
    fn test_unresolved_placeholder_is_fatal() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "logging",
            r#"{"id": "logging", "stages": [{"name": "deps", "dependencies": [
                {"names": "pino", "workspace": "{target}"}
            ]}]}"#,
        );

        assert!(matches!(
            engine(temp.path()).run(&["logging".to_string()], &AnswerMap::new()),
            Err(WeftError::UnresolvedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_conflict_skipped_run_continues() {
        let temp = project(&["web"]);
        std::fs::write(
            temp.path().join("packages/web/package.json"),
            r#"{"name": "web", "dependencies": {"lodash": "^4.17.0"}}"#,
        )
        .unwrap();
        write_feature(
            temp.path(),
            "legacy",
            r#"{"id": "legacy", "stages": [{"name": "deps",
                "dependencies": [{"names": "lodash", "workspace": "web", "version": "3.0.0"}],
                "edits": [{"path": "after.txt", "kind": "append", "content": "ran\n"}]
            }]}"#,
        );

        // autoCatalog would promote the existing dependency; turn it off to
        // exercise the conflict path.
        let mut settings = Settings::default();
        settings.dependency_management.auto_catalog = false;
        let registry = FeatureRegistry::load_dir(&temp.path().join("features")).unwrap();
        let engine = CompositionEngine::new(temp.path().to_path_buf(), registry, settings);

        let report = engine.run(&["legacy".to_string()], &AnswerMap::new()).unwrap();
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.resolutions.is_empty());
        // The manifest is untouched and the rest of the stage still ran.
        assert_eq!(
            manifest(temp.path(), "web")["dependencies"]["lodash"],
            "^4.17.0"
        );
        assert!(temp.path().join("after.txt").exists());
    }
}

// =============================================================================
// Scripts, templates, edits
// =============================================================================

mod action_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_actions_run_in_fixed_order() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "ordered",
            r#"{"id": "ordered", "stages": [
                {"name": "one", "scripts": [{"command": "first"}]},
                {"name": "two", "scripts": [{"command": "second"}, {"command": "third"}]}
            ]}"#,
        );

        let runner = RecordingRunner::default();
        let registry = FeatureRegistry::load_dir(&temp.path().join("features")).unwrap();
        let engine =
            CompositionEngine::new(temp.path().to_path_buf(), registry, Settings::default())
                .with_scripts(Box::new(runner.clone()));

        engine.run(&["ordered".to_string()], &AnswerMap::new()).unwrap();
        assert_eq!(
            *runner.commands.lock().unwrap(),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn test_script_failure_aborts_run() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "broken",
            r#"{"id": "broken", "stages": [
                {"name": "fails", "scripts": [{"command": "boom"}]},
                {"name": "never", "edits": [{"path": "never.txt", "kind": "append", "content": "x"}]}
            ]}"#,
        );

        let registry = FeatureRegistry::load_dir(&temp.path().join("features")).unwrap();
        let engine =
            CompositionEngine::new(temp.path().to_path_buf(), registry, Settings::default())
                .with_scripts(Box::new(FailingRunner));

        let err = engine
            .run(&["broken".to_string()], &AnswerMap::new())
            .unwrap_err();
        assert!(matches!(err, WeftError::ScriptExecution { .. }));
        assert!(!temp.path().join("never.txt").exists());
    }

    #[test]
    fn test_templates_render_with_answers() {
        let temp = project(&["web"]);
        let tpl_dir = temp.path().join("features/scaffold/templates");
        std::fs::create_dir_all(&tpl_dir).unwrap();
        std::fs::write(tpl_dir.join("index.ts.hbs"), "export const app = \"{{appName}}\";\n")
            .unwrap();
        write_feature(
            temp.path(),
            "scaffold",
            r#"{"id": "scaffold", "stages": [{"name": "files", "templates": [
                {"source": "templates/index.ts.hbs", "target": "packages/{target}/src/index.ts"}
            ]}]}"#,
        );

        engine(temp.path())
            .run(
                &["scaffold".to_string()],
                &answers(&[("target", "web".into()), ("appName", "shop".into())]),
            )
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("packages/web/src/index.ts")).unwrap(),
            "export const app = \"shop\";\n"
        );
    }

    #[test]
    fn test_edits_applied_last() {
        let temp = project(&["web"]);
        write_feature(
            temp.path(),
            "git",
            r#"{"id": "git", "stages": [{"name": "ignore", "edits": [
                {"path": ".gitignore", "kind": "append", "content": "node_modules/\n"},
                {"path": ".gitignore", "kind": "append", "content": "dist/\n"}
            ]}]}"#,
        );

        engine(temp.path())
            .run(&["git".to_string()], &AnswerMap::new())
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(temp.path().join(".gitignore")).unwrap(),
            "node_modules/\ndist/\n"
        );
    }
}
