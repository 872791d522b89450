#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Retrospective analysis of a training run.
//!
//! Takes the [`TrainingResult`]s of one batch and turns them into statistics,
//! a list of noticeable patterns and a serializable [`RunReport`]. Nothing is
//! persisted; the report lives as long as the run that produced it.

use personalizer_core::TrainingResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

// Pattern detection thresholds
/// Minimum number of cases expecting an action before its miss rate is judged
const PATTERN_MIN_CASES_PER_ACTION: usize = 3;
/// Miss rate (60%) above which an expected action is flagged
const PATTERN_HIGH_MISS_THRESHOLD: f32 = 0.6;
/// Overall miss rate (50%) for run-wide issues
const PATTERN_OVERALL_MISS_THRESHOLD: f32 = 0.5;
/// How often the same wrong answer must occur to be reported as a confusion
const PATTERN_MIN_CONFUSIONS: usize = 2;

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

const REPORT_VERSION: &str = "0.1.0";

/// Statistics aggregated from training results.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStatistics {
    /// Total number of results (passed + missed).
    pub total: usize,
    pub passed: usize,
    pub missed: usize,
    pub total_reward: f32,
}

impl OutcomeStatistics {
    fn record(&mut self, result: &TrainingResult) {
        self.total += 1;
        if result.passed {
            self.passed += 1;
        } else {
            self.missed += 1;
        }
        if result.reward.is_finite() {
            self.total_reward += result.reward;
        }
    }

    /// Share of passed results (0.0 to 1.0).
    #[must_use]
    pub fn pass_rate(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.passed as f32 / self.total as f32
        }
    }

    /// Share of missed results (0.0 to 1.0).
    #[must_use]
    pub fn miss_rate(&self) -> f32 {
        debug_assert!(
            self.passed + self.missed == self.total,
            "OutcomeStatistics totals are inconsistent"
        );
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.pass_rate()
    }

    #[must_use]
    pub fn average_reward(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.total_reward / self.total as f32
        }
    }
}

/// An expected action the backend repeatedly replaced with another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub expected: String,
    pub chosen: String,
    pub count: usize,
}

/// Summary of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub version: String,
    /// Free-form label of the run (e.g. the training file name)
    pub label: String,
    pub ts: String,
    pub overall: OutcomeStatistics,
    /// Statistics keyed by the expected action
    pub by_expected: BTreeMap<String, OutcomeStatistics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confusions: Vec<Confusion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
}

/// Analyzes the results of one run.
#[derive(Debug)]
pub struct RunAnalyzer {
    /// Minimum number of results before run-wide patterns are reported
    min_cases: usize,
}

impl Default for RunAnalyzer {
    fn default() -> Self {
        Self { min_cases: 4 }
    }
}

impl RunAnalyzer {
    #[must_use]
    pub fn new(min_cases: usize) -> Self {
        Self { min_cases }
    }

    /// Aggregate results by a grouping key (e.g. expected or chosen action).
    #[must_use]
    pub fn aggregate_results(
        &self,
        results: &[TrainingResult],
        key_fn: impl Fn(&TrainingResult) -> Option<String>,
    ) -> HashMap<String, OutcomeStatistics> {
        let mut stats: HashMap<String, OutcomeStatistics> = HashMap::new();
        for result in results {
            if let Some(key) = key_fn(result) {
                stats.entry(key).or_default().record(result);
            }
        }
        stats
    }

    fn summarize(&self, results: &[TrainingResult]) -> OutcomeStatistics {
        let mut stats = OutcomeStatistics::default();
        for result in results {
            stats.record(result);
        }
        stats
    }

    /// Wrong answers that occurred at least [`PATTERN_MIN_CONFUSIONS`] times,
    /// most frequent first.
    #[must_use]
    pub fn confusions(&self, results: &[TrainingResult]) -> Vec<Confusion> {
        let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
        for r in results.iter().filter(|r| !r.passed) {
            *counts
                .entry((r.expected.as_str(), r.ranked_top.as_str()))
                .or_insert(0) += 1;
        }
        let mut confusions: Vec<Confusion> = counts
            .into_iter()
            .filter(|(_, count)| *count >= PATTERN_MIN_CONFUSIONS)
            .map(|((expected, chosen), count)| Confusion {
                expected: expected.to_string(),
                chosen: chosen.to_string(),
                count,
            })
            .collect();
        confusions.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.expected.cmp(&b.expected))
                .then_with(|| a.chosen.cmp(&b.chosen))
        });
        confusions
    }

    /// Heuristic patterns worth a human look.
    #[must_use]
    pub fn analyze_patterns(&self, results: &[TrainingResult]) -> Vec<String> {
        let mut patterns = Vec::new();

        let by_expected = self.aggregate_results(results, |r| Some(r.expected.clone()));
        let mut flagged: Vec<_> = by_expected
            .iter()
            .filter(|(_, s)| {
                s.total >= PATTERN_MIN_CASES_PER_ACTION
                    && s.miss_rate() > PATTERN_HIGH_MISS_THRESHOLD
            })
            .collect();
        flagged.sort_by(|a, b| a.0.cmp(b.0));
        for (action, stats) in flagged {
            patterns.push(format!(
                "High miss rate ({:.1}%) for expected action '{}'",
                stats.miss_rate() * 100.0,
                action
            ));
        }

        for c in self.confusions(results) {
            patterns.push(format!(
                "'{}' chosen {} times where '{}' was expected",
                c.chosen, c.count, c.expected
            ));
        }

        let overall = self.summarize(results);
        if overall.total >= self.min_cases && overall.miss_rate() > PATTERN_OVERALL_MISS_THRESHOLD
        {
            patterns.push(format!(
                "Overall miss rate is high ({:.1}%)",
                overall.miss_rate() * 100.0
            ));
        }

        patterns
    }

    #[must_use]
    pub fn report(&self, label: &str, results: &[TrainingResult]) -> RunReport {
        RunReport {
            version: REPORT_VERSION.to_string(),
            label: label.to_string(),
            ts: iso8601_now(),
            overall: self.summarize(results),
            by_expected: self
                .aggregate_results(results, |r| Some(r.expected.clone()))
                .into_iter()
                .collect(),
            confusions: self.confusions(results),
            patterns: self.analyze_patterns(results),
        }
    }
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}
