use personalizer_core::{Action, Feature, Selection, TrainingCase};
use std::fs;

fn read(name: &str) -> String {
    fs::read_to_string(format!("../personalizer-training/tests/fixtures/{name}"))
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"))
}

#[test]
fn feature_fixture_has_five_features() {
    let features: Vec<Feature> =
        serde_json::from_str(&read("features.json")).expect("features fixture should parse");
    assert_eq!(features.len(), 5);
    assert!(features.iter().all(|f| !f.values.is_empty()));
}

#[test]
fn action_fixture_has_four_actions() {
    let actions: Vec<Action> =
        serde_json::from_str(&read("actions.json")).expect("actions fixture should parse");
    assert_eq!(actions.len(), 4);
    assert_eq!(actions[0].id, "Sleepy Sample");
    assert_eq!(actions[0].features.len(), 2);
}

#[test]
fn training_fixture_supports_all_selection_shapes() {
    let cases: Vec<TrainingCase> =
        serde_json::from_str(&read("training.json")).expect("training fixture should parse");
    assert_eq!(cases.len(), 4);

    let simple = &cases[0];
    let order: Vec<&str> = simple.features.iter().map(|(k, _)| k).collect();
    assert_eq!(order, vec!["Location", "Color"]);

    let listed = &cases[2];
    assert_eq!(listed.features.len(), 3);
    assert!(listed
        .features
        .iter()
        .any(|(k, s)| k == "Mood" && *s == Selection::Skip));

    let raw = &cases[3];
    assert!(matches!(
        raw.features.iter().next(),
        Some(("Location", Selection::Raw(_)))
    ));
}
