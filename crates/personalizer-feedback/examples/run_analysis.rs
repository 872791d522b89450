//! Analyzes a hand-made set of training results and prints the run report.
//!
//! Run with: cargo run -p personalizer-feedback --example run_analysis

use personalizer_core::TrainingResult;
use personalizer_feedback::RunAnalyzer;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let results = vec![
        // The service keeps preferring the energetic sample in the bedroom
        result("bedroom-1", "Energetic Sample", "Sleepy Sample"),
        result("bedroom-2", "Energetic Sample", "Sleepy Sample"),
        result("bedroom-3", "Sleepy Sample", "Sleepy Sample"),
        result("bedroom-4", "Energetic Sample", "Sleepy Sample"),
        // Kitchen cases look fine
        result("kitchen-1", "Happy Sample", "Happy Sample"),
        result("kitchen-2", "Happy Sample", "Happy Sample"),
    ];

    let analyzer = RunAnalyzer::default();
    let report = analyzer.report("example", &results);

    println!(
        "{} cases, pass rate {:.1}%, average reward {:.2}",
        report.overall.total,
        report.overall.pass_rate() * 100.0,
        report.overall.average_reward()
    );
    for (expected, stats) in &report.by_expected {
        println!(
            "  {expected}: {}/{} passed",
            stats.passed, stats.total
        );
    }
    for pattern in &report.patterns {
        println!("  ! {pattern}");
    }

    println!("\n{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn result(name: &str, top: &str, expected: &str) -> TrainingResult {
    let passed = top == expected;
    TrainingResult {
        name: name.to_string(),
        passed,
        ranked_top: top.to_string(),
        expected: expected.to_string(),
        reward: if passed { 1.0 } else { 0.0 },
        event_id: format!("evt-{name}"),
        ranking: Vec::new(),
    }
}
