#![allow(dead_code)]

use std::fmt;

use personalizer_core::{
    Action, Feature, RankBackend, RankRequest, RankResponse, RankedAction,
};
use personalizer_training::{ActionCatalog, FeatureCatalog};
use serde_json::json;

#[derive(Debug)]
pub struct Offline;

impl fmt::Display for Offline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("backend offline")
    }
}

impl std::error::Error for Offline {}

/// Deterministic stand-in for the ranking service: candidates are ordered by
/// their position in `preference` (unknown ids last, in request order).
#[derive(Default)]
pub struct FakeBackend {
    pub preference: Vec<String>,
    pub requests: Vec<RankRequest>,
    pub rewards: Vec<(String, f32)>,
    pub offline: bool,
    /// Ranking works, only reward submissions fail.
    pub rejects_rewards: bool,
}

impl FakeBackend {
    pub fn preferring(ids: &[&str]) -> Self {
        Self {
            preference: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn reward_for(&self, event_id: &str) -> Vec<f32> {
        self.rewards
            .iter()
            .filter(|(id, _)| id == event_id)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl RankBackend for FakeBackend {
    type Error = Offline;

    fn rank(&mut self, request: &RankRequest) -> Result<RankResponse, Offline> {
        if self.offline {
            return Err(Offline);
        }
        self.requests.push(request.clone());
        let mut ids: Vec<&str> = request.actions.iter().map(|a| a.id.as_str()).collect();
        ids.sort_by_key(|id| {
            self.preference
                .iter()
                .position(|p| p == id)
                .unwrap_or(usize::MAX)
        });
        let ranking: Vec<RankedAction> = ids
            .iter()
            .map(|id| RankedAction {
                id: id.to_string(),
                probability: None,
            })
            .collect();
        Ok(RankResponse {
            reward_action_id: ranking[0].id.clone(),
            ranking,
            event_id: Some(request.event_id.clone()),
        })
    }

    fn reward(&mut self, event_id: &str, value: f32) -> Result<(), Offline> {
        if self.offline || self.rejects_rewards {
            return Err(Offline);
        }
        self.rewards.push((event_id.to_string(), value));
        Ok(())
    }
}

/// `{Location: [Bedroom, Kitchen], Color: [Pastel, Bright]}`.
pub fn small_features() -> FeatureCatalog {
    let features: Vec<Feature> = serde_json::from_value(json!([
        {"name": "Location", "values": [{"label": "Bedroom"}, {"label": "Kitchen"}]},
        {"name": "Color", "values": [{"label": "Pastel"}, {"label": "Bright"}]}
    ]))
    .expect("feature catalog should parse");
    FeatureCatalog::new(features).expect("feature catalog should be valid")
}

/// `{SleepySample, ComfortableSample}`.
pub fn small_actions() -> ActionCatalog {
    let actions: Vec<Action> = serde_json::from_value(json!([
        {"id": "SleepySample", "features": [{"energy": 1}]},
        {"id": "ComfortableSample", "features": [{"energy": 2}]}
    ]))
    .expect("action catalog should parse");
    ActionCatalog::new(actions).expect("action catalog should be valid")
}

pub fn fixture_features() -> FeatureCatalog {
    FeatureCatalog::load("tests/fixtures/features.json").expect("features fixture")
}

pub fn fixture_actions() -> ActionCatalog {
    ActionCatalog::load("tests/fixtures/actions.json").expect("actions fixture")
}
