//! Laden und Prüfen der Feature-/Aktionskataloge und der Trainingsdateien.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use personalizer_core::{Action, Feature, TrainingCase};
use serde::de::DeserializeOwned;

use crate::error::{Result, TrainingError};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Unveränderliche Menge benannter Features.
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    features: Vec<Feature>,
}

impl FeatureCatalog {
    /// Baut den Katalog; doppelte Namen und Features ohne Werte sind ein Fehler.
    pub fn new(features: Vec<Feature>) -> Result<Self> {
        let mut seen = HashSet::new();
        for feature in &features {
            if feature.values.is_empty() {
                return Err(TrainingError::InvalidCatalog(format!(
                    "feature '{}' has no values",
                    feature.name
                )));
            }
            if !seen.insert(feature.name.as_str()) {
                return Err(TrainingError::InvalidCatalog(format!(
                    "duplicate feature '{}'",
                    feature.name
                )));
            }
        }
        Ok(Self { features })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(read_json(path.as_ref())?)
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Unveränderliche Menge rankbarer Aktionen.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<Action>) -> Result<Self> {
        let mut seen = HashSet::new();
        for action in &actions {
            if !seen.insert(action.id.as_str()) {
                return Err(TrainingError::InvalidCatalog(format!(
                    "duplicate action '{}'",
                    action.id
                )));
            }
        }
        Ok(Self { actions })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(read_json(path.as_ref())?)
    }

    pub fn get(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Lädt eine Liste von Trainingsfällen aus einer JSON-Datei.
pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<TrainingCase>> {
    read_json(path.as_ref())
}
