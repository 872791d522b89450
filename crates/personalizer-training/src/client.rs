//! Adapter um ein [`RankBackend`]: Request-Aufbau, lokaler Ausschluss und
//! Buchführung über Event-IDs für spätere Belohnungen.

use std::collections::HashMap;

use personalizer_core::{Action, Context, RankBackend, RankRequest, RankedAction};
use uuid::Uuid;

use crate::error::{Result, TrainingError};
use crate::log::{debug_event, warn_event};

/// Ergebnis eines einzelnen Rank-Aufrufs.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Korrelations-ID für die Belohnung.
    pub event_id: String,
    /// Kandidaten in der Reihenfolge des Backends.
    pub ranking: Vec<RankedAction>,
    /// Die Aktion, für die das Backend eine Belohnung erwartet (seine erste Wahl).
    pub reward_action_id: String,
}

impl Ranking {
    pub fn top(&self) -> &str {
        &self.reward_action_id
    }
}

/// Kapselt ein Backend: ausgeschlossene Aktionen werden nie verschickt,
/// Belohnungen nur für selbst vergebene Event-IDs angenommen.
///
/// Keine Wiederholungen; Transportfehler kommen als
/// [`TrainingError::BackendUnavailable`] zurück.
#[derive(Debug)]
pub struct RankClient<B> {
    backend: B,
    issued: HashMap<String, Vec<String>>,
}

impl<B: RankBackend> RankClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            issued: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Die mit dem Event verschickten Aktions-IDs, falls es von hier stammt.
    pub fn sent_actions(&self, event_id: &str) -> Option<&[String]> {
        self.issued.get(event_id).map(Vec::as_slice)
    }

    pub fn rank(&mut self, actions: &[Action], context: &Context, exclude: &[String]) -> Result<Ranking> {
        let candidates: Vec<Action> = actions
            .iter()
            .filter(|a| !exclude.contains(&a.id))
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Err(TrainingError::InvalidRequest(
                "no actions left after applying exclusions",
            ));
        }
        if context.is_empty() {
            return Err(TrainingError::InvalidRequest(
                "context must contain at least one attribute bag",
            ));
        }

        let sent: Vec<String> = candidates.iter().map(|a| a.id.clone()).collect();
        let request = RankRequest {
            context_features: context.bags().to_vec(),
            actions: candidates,
            excluded_actions: exclude.to_vec(),
            event_id: Uuid::new_v4().to_string(),
            defer_activation: false,
        };

        debug_event!(
            "rank event {} with {} actions, {} context bags",
            request.event_id,
            sent.len(),
            context.len()
        );

        let response = self
            .backend
            .rank(&request)
            .map_err(|e| TrainingError::BackendUnavailable(Box::new(e)))?;

        if let Some(echoed) = response.event_id.as_deref() {
            if echoed != request.event_id {
                return Err(TrainingError::InvalidResponse(format!(
                    "event id mismatch: sent {}, got {}",
                    request.event_id, echoed
                )));
            }
        }
        if !sent.contains(&response.reward_action_id) {
            return Err(TrainingError::InvalidResponse(format!(
                "reward action '{}' was not among the candidates",
                response.reward_action_id
            )));
        }

        let mut ranking = response.ranking;
        let before = ranking.len();
        ranking.retain(|r| sent.contains(&r.id));
        if ranking.len() != before {
            warn_event!(
                "backend ranked {} unknown action(s) for event {}; dropped",
                before - ranking.len(),
                request.event_id
            );
        }

        self.issued.insert(request.event_id.clone(), sent);

        Ok(Ranking {
            event_id: request.event_id,
            ranking,
            reward_action_id: response.reward_action_id,
        })
    }

    /// Sendet die Belohnung für ein von [`RankClient::rank`] vergebenes Event.
    ///
    /// Doppeltes Senden ist ein Fehler des Aufrufers; beide Aufrufe gehen
    /// trotzdem raus.
    pub fn reward(&mut self, event_id: &str, value: f32) -> Result<()> {
        if !self.issued.contains_key(event_id) {
            return Err(TrainingError::UnknownRequest(event_id.to_string()));
        }
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(TrainingError::InvalidReward(value));
        }
        debug_event!("reward {} for event {}", value, event_id);
        self.backend
            .reward(event_id, value)
            .map_err(|e| TrainingError::BackendUnavailable(Box::new(e)))
    }
}
