//! Graph ordering and activation evaluation at the public API.

use pretty_assertions::assert_eq;

use weft::{
    evaluate, resolution_order, ActivationCondition, AnswerMap, AnswerValue, Feature,
    FeatureRegistry, WeftError,
};

fn feature(id: &str, deps: &[&str]) -> Feature {
    Feature {
        id: id.to_string(),
        description: None,
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
        configuration: Vec::new(),
        stages: Vec::new(),
        dir: None,
    }
}

fn registry(features: Vec<Feature>) -> FeatureRegistry {
    let mut registry = FeatureRegistry::new();
    for f in features {
        registry.register(f).unwrap();
    }
    registry
}

fn answers(pairs: &[(&str, AnswerValue)]) -> AnswerMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Graph resolver
// =============================================================================

#[test]
fn test_diamond_graph_orders_once_each() {
    let reg = registry(vec![
        feature("app", &["ui", "data"]),
        feature("ui", &["base"]),
        feature("data", &["base"]),
        feature("base", &[]),
    ]);

    let order = resolution_order(&reg, &["app".to_string()]).unwrap();
    assert_eq!(order, vec!["base", "ui", "data", "app"]);
}

#[test]
fn test_selection_order_is_respected_for_roots() {
    let reg = registry(vec![feature("x", &[]), feature("y", &[])]);
    let order = resolution_order(&reg, &["y".to_string(), "x".to_string()]).unwrap();
    assert_eq!(order, vec!["y", "x"]);
}

#[test]
fn test_long_cycle_reports_cycle_error() {
    let reg = registry(vec![
        feature("a", &["b"]),
        feature("b", &["c"]),
        feature("c", &["a"]),
    ]);
    assert!(matches!(
        resolution_order(&reg, &["a".to_string()]),
        Err(WeftError::CircularDependency { .. })
    ));
}

// =============================================================================
// Activation evaluator truth table
// =============================================================================

#[test]
fn test_equals_truth_table() {
    let cond = ActivationCondition::equals("x", "y");
    assert!(evaluate(&cond, &answers(&[("x", "y".into())]), "f"));
    assert!(!evaluate(&cond, &AnswerMap::new(), "f"));
}

#[test]
fn test_and_with_includes_value() {
    let cond = ActivationCondition::and(vec![
        ActivationCondition::equals("a", 1i64),
        ActivationCondition::includes_value("b", "z"),
    ]);

    let truthy = answers(&[
        ("a", 1i64.into()),
        ("b", AnswerValue::Array(vec!["z".into()])),
    ]);
    assert!(evaluate(&cond, &truthy, "f"));

    let flipped_a = answers(&[
        ("a", 2i64.into()),
        ("b", AnswerValue::Array(vec!["z".into()])),
    ]);
    assert!(!evaluate(&cond, &flipped_a, "f"));

    let flipped_b = answers(&[
        ("a", 1i64.into()),
        ("b", AnswerValue::Array(vec!["q".into()])),
    ]);
    assert!(!evaluate(&cond, &flipped_b, "f"));
}

#[test]
fn test_evaluation_is_idempotent() {
    let cond = ActivationCondition::or(vec![
        ActivationCondition::is_one_of("db", ["postgres", "mysql"]),
        ActivationCondition::equals("offline", true),
    ]);
    let map = answers(&[("db", "postgres".into())]);

    let first = evaluate(&cond, &map, "f");
    let second = evaluate(&cond, &map, "f");
    assert_eq!(first, second);
    assert!(first);
}

#[test]
fn test_nested_condition_from_definition_json() {
    let cond: ActivationCondition = serde_json::from_str(
        r#"{
            "type": "or",
            "conditions": [
                {"type": "equals", "question": "framework", "value": "react"},
                {"type": "and", "conditions": [
                    {"type": "equals", "question": "framework", "value": "vue"},
                    {"type": "includes-value", "question": "extras", "value": "ssr"}
                ]}
            ]
        }"#,
    )
    .unwrap();

    assert!(evaluate(&cond, &answers(&[("framework", "react".into())]), "f"));

    let vue_ssr = answers(&[
        ("framework", "vue".into()),
        ("extras", AnswerValue::Array(vec!["ssr".into()])),
    ]);
    assert!(evaluate(&cond, &vue_ssr, "f"));

    let vue_plain = answers(&[("framework", "vue".into())]);
    assert!(!evaluate(&cond, &vue_plain, "f"));
}
