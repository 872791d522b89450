mod common;

use common::{fixture_actions, fixture_features, small_actions, small_features, FakeBackend};
use personalizer_core::{Selections, TrainingCase};
use personalizer_training::{
    load_cases, BatchOptions, BatchSummary, CaseOutcome, Trainer, TrainingError,
};

fn case(name: &str, features: Selections, exclude: &[&str], expected: &str) -> TrainingCase {
    TrainingCase {
        name: name.into(),
        features,
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
        expected: expected.into(),
    }
}

fn bedroom_pastel() -> Selections {
    Selections::new().with("Location", "Bedroom").with("Color", "Pastel")
}

#[test]
fn simple_case_passes_and_rewards_one() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["ComfortableSample", "SleepySample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let result = trainer
        .run_case(&case(
            "SimpleCase",
            bedroom_pastel(),
            &["ComfortableSample"],
            "SleepySample",
        ))
        .expect("case should run");
    drop(trainer);

    assert!(result.passed);
    assert_eq!(result.ranked_top, "SleepySample");
    assert_eq!(result.reward, 1.0);
    assert_eq!(backend.reward_for(&result.event_id), vec![1.0]);

    let sent = &backend.requests[0];
    assert_eq!(sent.event_id, result.event_id);
    assert!(sent.actions.iter().all(|a| a.id != "ComfortableSample"));
    assert_eq!(sent.context_features.len(), 2);
}

#[test]
fn mismatch_is_a_result_with_zero_reward() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["ComfortableSample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let result = trainer
        .run_case(&case("Miss", bedroom_pastel(), &[], "SleepySample"))
        .expect("a mismatch is not an error");
    drop(trainer);

    assert!(!result.passed);
    assert_eq!(result.ranked_top, "ComfortableSample");
    assert_eq!(backend.rewards.len(), 1);
    assert_eq!(backend.reward_for(&result.event_id), vec![0.0]);
}

#[test]
fn every_run_submits_exactly_one_reward() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["SleepySample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let cases = [
        case("a", bedroom_pastel(), &[], "SleepySample"),
        case("b", bedroom_pastel(), &[], "ComfortableSample"),
        case("c", bedroom_pastel(), &["SleepySample"], "ComfortableSample"),
    ];
    let results: Vec<_> = cases
        .iter()
        .map(|c| trainer.run_case(c).expect("case should run"))
        .collect();
    drop(trainer);

    assert_eq!(backend.requests.len(), 3);
    assert_eq!(backend.rewards.len(), 3);
    for r in &results {
        let expected = if r.ranked_top == r.expected { 1.0 } else { 0.0 };
        assert_eq!(backend.reward_for(&r.event_id), vec![expected]);
    }
    assert_eq!(
        results.iter().map(|r| r.passed).collect::<Vec<_>>(),
        vec![true, false, true]
    );
}

#[test]
fn custom_scorer_shapes_reward_only() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["ComfortableSample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend)
        .with_scorer(|top, expected| if top == expected { 1.0 } else { 0.25 });

    let result = trainer
        .run_case(&case("Partial", bedroom_pastel(), &[], "SleepySample"))
        .expect("case should run");
    drop(trainer);

    assert!(!result.passed);
    assert_eq!(result.reward, 0.25);
    assert_eq!(backend.reward_for(&result.event_id), vec![0.25]);
}

#[test]
fn structural_errors_send_nothing() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::default();
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let err = trainer
        .run_case(&case(
            "Everything excluded",
            bedroom_pastel(),
            &["SleepySample", "ComfortableSample"],
            "SleepySample",
        ))
        .unwrap_err();
    assert!(matches!(err, TrainingError::InvalidRequest(_)));

    let err = trainer
        .run_case(&case(
            "Bad feature",
            Selections::new().with("Smell", "Fresh"),
            &[],
            "SleepySample",
        ))
        .unwrap_err();
    assert!(matches!(err, TrainingError::UnknownFeature(_)));
    drop(trainer);

    assert!(backend.requests.is_empty());
    assert!(backend.rewards.is_empty());
}

#[test]
fn batch_continues_past_structural_errors() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["SleepySample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let cases = vec![
        case("good", bedroom_pastel(), &[], "SleepySample"),
        case(
            "unknown feature",
            Selections::new().with("Weather", "Rainy"),
            &[],
            "SleepySample",
        ),
        case("wrong guess", bedroom_pastel(), &[], "ComfortableSample"),
    ];

    let reports: Vec<_> = trainer.run_all(&cases, BatchOptions::default()).collect();
    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["good", "unknown feature", "wrong guess"]
    );
    assert!(reports[0].passed());
    assert!(matches!(
        &reports[1].outcome,
        CaseOutcome::Failed(TrainingError::UnknownFeature(name)) if name == "Weather"
    ));
    assert!(matches!(&reports[2].outcome, CaseOutcome::Completed(r) if !r.passed));

    let summary = BatchSummary::from_reports(&reports);
    assert_eq!(
        summary,
        BatchSummary {
            total: 3,
            passed: 1,
            failed: 1,
            errors: 1
        }
    );
    drop(reports);
    drop(trainer);
    assert_eq!(backend.rewards.len(), 2);
}

#[test]
fn stop_on_error_halts_after_first_failure() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["SleepySample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let cases = vec![
        case("bad", Selections::new().with("Weather", "Rainy"), &[], "x"),
        case("never run", bedroom_pastel(), &[], "SleepySample"),
    ];
    let reports: Vec<_> = trainer
        .run_all(cases, BatchOptions { stop_on_error: true })
        .collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_error());
    drop(trainer);
    assert!(backend.requests.is_empty());
}

#[test]
fn batch_is_lazy() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend::preferring(&["SleepySample"]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let cases = vec![
        case("one", bedroom_pastel(), &[], "SleepySample"),
        case("two", bedroom_pastel(), &[], "SleepySample"),
    ];
    let first: Vec<_> = trainer
        .run_all(&cases, BatchOptions::default())
        .take(1)
        .collect();
    assert_eq!(first.len(), 1);
    drop(trainer);
    assert_eq!(backend.requests.len(), 1);
}

#[test]
fn transport_failures_are_reported_distinctly() {
    let features = small_features();
    let actions = small_actions();
    let mut backend = FakeBackend {
        offline: true,
        ..FakeBackend::default()
    };
    let mut trainer = Trainer::new(&features, &actions, &mut backend);
    let cases = vec![case("offline", bedroom_pastel(), &[], "SleepySample")];
    let reports: Vec<_> = trainer.run_all(&cases, BatchOptions::default()).collect();
    assert!(matches!(&reports[0].outcome, CaseOutcome::Failed(e) if e.is_transport()));
}

#[test]
fn fixture_training_file_runs_end_to_end() {
    let features = fixture_features();
    let actions = fixture_actions();
    let cases = load_cases("tests/fixtures/training.json").expect("training fixture");
    let mut backend = FakeBackend::preferring(&[
        "Sleepy Sample",
        "Happy Sample",
        "Energetic Sample",
        "Comfortable Sample",
    ]);
    let mut trainer = Trainer::new(&features, &actions, &mut backend);

    let reports: Vec<_> = trainer.run_all(&cases, BatchOptions::default()).collect();
    let summary = BatchSummary::from_reports(&reports);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.errors, 0);
    // SimpleCase, RoughAndBright and RawContext match the preference order.
    assert_eq!(summary.passed, 3);
    assert!(reports
        .iter()
        .filter_map(|r| r.result())
        .any(|r| r.name == "MorningKitchen" && !r.passed));
    drop(reports);
    drop(trainer);

    let raw = &backend.requests[3];
    assert_eq!(raw.context_features[0]["lights"], "off");
    assert_eq!(raw.context_features[1]["time"], "night");
}
