//! Trainingssteuerung für den Personalizer-Harness.
//!
//! Baut Kontexte aus Feature-Auswahlen, rankt über einen [`RankBackend`]-
//! Adapter, leitet Belohnungen für benannte Trainingsfälle ab und treibt die
//! interaktive Konsolenschleife.
//!
//! [`RankBackend`]: personalizer_core::RankBackend

mod log;

pub mod batch;
pub mod catalog;
pub mod client;
pub mod console;
pub mod context;
pub mod error;
pub mod interactive;
pub mod runner;

pub use batch::{BatchOptions, BatchRun, BatchSummary, CaseOutcome, CaseReport};
pub use catalog::{load_cases, ActionCatalog, FeatureCatalog};
pub use client::{RankClient, Ranking};
pub use console::{run_console, InteractiveOutcome};
pub use context::ContextBuilder;
pub use error::{Result, TrainingError};
pub use interactive::{Effect, Event, InteractiveSession, Rounds, SessionState, Termination};
pub use runner::{exact_match, Scorer, Trainer};
