//! Sequenzielles Batch-Training über viele Fälle.

use std::borrow::Borrow;

use personalizer_core::{RankBackend, TrainingCase, TrainingResult};
use serde::Serialize;

use crate::error::TrainingError;
use crate::log::warn_event;
use crate::runner::Trainer;

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Nach dem ersten strukturellen Fehler abbrechen, statt ihn zu melden
    /// und weiterzumachen.
    pub stop_on_error: bool,
}

/// Was mit einem Fall passiert ist.
#[derive(Debug)]
pub enum CaseOutcome {
    /// Der Fall lief durch; `passed` kann trotzdem `false` sein.
    Completed(TrainingResult),
    /// Kontextaufbau oder Backend sind für diesen Fall gescheitert.
    Failed(TrainingError),
}

#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub outcome: CaseOutcome,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        matches!(&self.outcome, CaseOutcome::Completed(r) if r.passed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Failed(_))
    }

    pub fn result(&self) -> Option<&TrainingResult> {
        match &self.outcome {
            CaseOutcome::Completed(r) => Some(r),
            CaseOutcome::Failed(_) => None,
        }
    }
}

/// Lazy Iterator über Fallberichte, in Eingabereihenfolge.
///
/// Fälle laufen einzeln nacheinander; die Belohnung eines Falls ist gesendet,
/// bevor der nächste gerankt wird.
pub struct BatchRun<'t, 'c, B, I> {
    trainer: &'t mut Trainer<'c, B>,
    cases: I,
    options: BatchOptions,
    halted: bool,
}

impl<'t, 'c, B, I, C> Iterator for BatchRun<'t, 'c, B, I>
where
    B: RankBackend,
    I: Iterator<Item = C>,
    C: Borrow<TrainingCase>,
{
    type Item = CaseReport;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let case = self.cases.next()?;
        let case: &TrainingCase = case.borrow();
        let outcome = match self.trainer.run_case(case) {
            Ok(result) => CaseOutcome::Completed(result),
            Err(e) => {
                warn_event!("training case '{}' failed: {}", case.name, e);
                if self.options.stop_on_error {
                    self.halted = true;
                }
                CaseOutcome::Failed(e)
            }
        };
        Some(CaseReport {
            name: case.name.clone(),
            outcome,
        })
    }
}

impl<'c, B: RankBackend> Trainer<'c, B> {
    /// Führt `cases` lazy aus. Jedes Element ist ein [`CaseReport`].
    pub fn run_all<I>(&mut self, cases: I, options: BatchOptions) -> BatchRun<'_, 'c, B, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<TrainingCase>,
    {
        BatchRun {
            trainer: self,
            cases: cases.into_iter(),
            options,
            halted: false,
        }
    }
}

/// Zähler für bestandene, verfehlte und fehlerhafte Fälle eines Batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn record(&mut self, report: &CaseReport) {
        self.total += 1;
        match &report.outcome {
            CaseOutcome::Completed(r) if r.passed => self.passed += 1,
            CaseOutcome::Completed(_) => self.failed += 1,
            CaseOutcome::Failed(_) => self.errors += 1,
        }
    }

    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a CaseReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.record(report);
        }
        summary
    }
}
