//! Führt benannte Trainingsfälle gegen das Backend aus und meldet Feedback.

use personalizer_core::{RankBackend, Selections, TrainingCase, TrainingResult};

use crate::catalog::{ActionCatalog, FeatureCatalog};
use crate::client::{RankClient, Ranking};
use crate::context::ContextBuilder;
use crate::error::Result;
use crate::log::debug_event;

/// Bildet `(ranked_top, expected)` auf eine Belohnung in `[0.0, 1.0]` ab.
pub type Scorer = Box<dyn Fn(&str, &str) -> f32>;

/// Standard-Bewertung: 1.0 bei exakter Übereinstimmung, sonst 0.0.
pub fn exact_match(ranked_top: &str, expected: &str) -> f32 {
    if ranked_top == expected {
        1.0
    } else {
        0.0
    }
}

/// Besitzt den Rank-Client eines Laufs und leiht sich die Kataloge.
pub struct Trainer<'c, B> {
    features: &'c FeatureCatalog,
    actions: &'c ActionCatalog,
    client: RankClient<B>,
    scorer: Scorer,
}

impl<'c, B: RankBackend> Trainer<'c, B> {
    pub fn new(features: &'c FeatureCatalog, actions: &'c ActionCatalog, backend: B) -> Self {
        Self {
            features,
            actions,
            client: RankClient::new(backend),
            scorer: Box::new(exact_match),
        }
    }

    /// Tauscht die Bewertung aus, ohne den Ablauf zu ändern.
    pub fn with_scorer(mut self, scorer: impl Fn(&str, &str) -> f32 + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn features(&self) -> &'c FeatureCatalog {
        self.features
    }

    pub fn actions(&self) -> &'c ActionCatalog {
        self.actions
    }

    pub fn client(&self) -> &RankClient<B> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut RankClient<B> {
        &mut self.client
    }

    pub fn into_client(self) -> RankClient<B> {
        self.client
    }

    /// Baut den Kontext aus `selections` und rankt den Katalog ohne `exclude`.
    pub fn rank(&mut self, selections: &Selections, exclude: &[String]) -> Result<Ranking> {
        let context = ContextBuilder::new(self.features).build(selections)?;
        self.client.rank(self.actions.as_slice(), &context, exclude)
    }

    /// Führt einen Fall aus und sendet dafür immer genau eine Belohnung.
    ///
    /// Weicht das Ranking von `case.expected` ab, ist das ein normales Ergebnis
    /// mit `passed == false`; nur strukturelle Fehler kommen als `Err` zurück.
    pub fn run_case(&mut self, case: &TrainingCase) -> Result<TrainingResult> {
        let ranking = self.rank(&case.features, &case.exclude)?;
        let passed = ranking.top() == case.expected;
        let reward = (self.scorer)(ranking.top(), &case.expected);
        self.client.reward(&ranking.event_id, reward)?;

        debug_event!(
            "case '{}': top={} expected={} reward={}",
            case.name,
            ranking.top(),
            case.expected,
            reward
        );

        Ok(TrainingResult {
            name: case.name.clone(),
            passed,
            ranked_top: ranking.reward_action_id,
            expected: case.expected.clone(),
            reward,
            event_id: ranking.event_id,
            ranking: ranking.ranking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_binary() {
        assert_eq!(exact_match("a", "a"), 1.0);
        assert_eq!(exact_match("a", "b"), 0.0);
        assert_eq!(exact_match("a", "A"), 0.0);
    }
}
