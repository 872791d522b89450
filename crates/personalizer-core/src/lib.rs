//! Kern-Typen und -Traits des Personalizer-Harness.
//!
//! Die eigentliche Ranking-Logik lebt in einem externen Dienst. Dieses Crate
//! beschreibt nur, was lokal geformt und interpretiert wird: Kataloge,
//! Kontexte, Trainingsfälle und die Schnittstelle zum Backend.

pub mod case;
pub mod catalog;

pub use case::{Selection, Selections, TrainingCase, TrainingResult};
pub use catalog::{Action, AttributeBag, Feature, FeatureValue};

use serde::{Deserialize, Serialize};

/// Die Situation zum Zeitpunkt eines Ranking-Aufrufs: eine geordnete Folge
/// von Attribut-Bags.
///
/// Die Reihenfolge entspricht der Reihenfolge, in der Features ausgewählt
/// bzw. deklariert wurden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(pub Vec<AttributeBag>);

impl Context {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn bags(&self) -> &[AttributeBag] {
        &self.0
    }
}

/// Anfrage an den Ranking-Dienst (Feldnamen wie auf der Leitung).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    pub context_features: Vec<AttributeBag>,
    pub actions: Vec<Action>,
    pub excluded_actions: Vec<String>,
    pub event_id: String,
    #[serde(default)]
    pub defer_activation: bool,
}

/// Eine Aktion in der vom Dienst gelieferten Reihenfolge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f32>,
}

/// Antwort des Ranking-Dienstes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    #[serde(alias = "rankedActions")]
    pub ranking: Vec<RankedAction>,
    #[serde(default)]
    pub event_id: Option<String>,
    pub reward_action_id: String,
}

/// Fähigkeit, Aktionen zu ranken und Belohnungen entgegenzunehmen.
///
/// In Produktion steckt dahinter der HTTP-Client des Dienstes, in Tests ein
/// deterministischer Fake.
pub trait RankBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    fn rank(&mut self, request: &RankRequest) -> Result<RankResponse, Self::Error>;
    fn reward(&mut self, event_id: &str, value: f32) -> Result<(), Self::Error>;
}

impl<B: RankBackend + ?Sized> RankBackend for &mut B {
    type Error = B::Error;

    fn rank(&mut self, request: &RankRequest) -> Result<RankResponse, Self::Error> {
        (**self).rank(request)
    }

    fn reward(&mut self, event_id: &str, value: f32) -> Result<(), Self::Error> {
        (**self).reward(event_id, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rank_request_uses_wire_names() {
        let req = RankRequest {
            context_features: vec![json!({"time": "morning"}).as_object().cloned().unwrap()],
            actions: vec![Action {
                id: "salad".into(),
                features: vec![json!({"taste": "salty"}).as_object().cloned().unwrap()],
            }],
            excluded_actions: vec!["pasta".into()],
            event_id: "e-1".into(),
            defer_activation: false,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contextFeatures"][0]["time"], "morning");
        assert_eq!(v["excludedActions"][0], "pasta");
        assert_eq!(v["eventId"], "e-1");
        assert_eq!(v["actions"][0]["id"], "salad");
    }

    #[test]
    fn rank_response_accepts_both_ranking_names() {
        let a: RankResponse = serde_json::from_value(json!({
            "ranking": [{"id": "salad", "probability": 0.9}],
            "eventId": "e-1",
            "rewardActionId": "salad"
        }))
        .unwrap();
        let b: RankResponse = serde_json::from_value(json!({
            "rankedActions": [{"id": "salad"}],
            "rewardActionId": "salad"
        }))
        .unwrap();
        assert_eq!(a.reward_action_id, b.reward_action_id);
        assert_eq!(a.ranking[0].id, b.ranking[0].id);
        assert!(b.event_id.is_none());
    }
}
