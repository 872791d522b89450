//! Trainingsfälle und ihre Ergebnisse.
//!
//! Ein [`TrainingCase`] beschreibt ein benanntes Szenario: welche Feature-Werte
//! den Kontext bilden, welche Aktionen ausgeschlossen werden und welche Aktion
//! als richtig gilt. Fälle stammen entweder aus Code oder aus einer JSON-Datei
//! und landen beide in derselben Form.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::catalog::AttributeBag;
use crate::RankedAction;

/// Auswahl für ein einzelnes Feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Das Feature trägt nichts zum Kontext bei.
    Skip,
    /// Ein Label aus dem Feature-Katalog.
    Label(String),
    /// Ein roher Attribut-Bag, der unverändert übernommen wird.
    Raw(AttributeBag),
}

impl Selection {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Selection::Skip),
            Value::String(s) if s.trim().is_empty() => Ok(Selection::Skip),
            Value::String(s) => Ok(Selection::Label(s)),
            Value::Number(n) => Ok(Selection::Label(n.to_string())),
            Value::Bool(b) => Ok(Selection::Label(b.to_string())),
            Value::Object(bag) => Ok(Selection::Raw(bag)),
            Value::Array(_) => Err("a selection must be a label, an object or null".into()),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Selection::Skip => Value::Null,
            Selection::Label(l) => Value::String(l.clone()),
            Selection::Raw(bag) => Value::Object(bag.clone()),
        }
    }
}

impl From<&str> for Selection {
    /// Ein leeres Label bedeutet "überspringen", wie `null` in JSON.
    fn from(label: &str) -> Self {
        if label.trim().is_empty() {
            Selection::Skip
        } else {
            Selection::Label(label.to_string())
        }
    }
}

/// Geordnete Zuordnung Feature-Name → [`Selection`].
///
/// Die Reihenfolge der Einträge entspricht der Reihenfolge im Dokument bzw.
/// beim Aufbau und bestimmt die Reihenfolge im Kontext (serde_json mit
/// `preserve_order`). In JSON ist sowohl ein Objekt als auch eine Liste von
/// Objekten erlaubt; Listen werden der Reihe nach aneinandergehängt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Selections(Vec<(String, Selection)>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hängt eine Auswahl an und gibt `self` zurück.
    pub fn with(mut self, feature: impl Into<String>, selection: impl Into<Selection>) -> Self {
        self.push(feature, selection);
        self
    }

    pub fn push(&mut self, feature: impl Into<String>, selection: impl Into<Selection>) {
        self.0.push((feature.into(), selection.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.0.iter().map(|(f, s)| (f.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, S: Into<Selection>> FromIterator<(K, S)> for Selections {
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        Selections(
            iter.into_iter()
                .map(|(k, s)| (k.into(), s.into()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for Selections {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let maps = match value {
            Value::Object(map) => vec![map],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    _ => Err("a list of selections may only contain objects".to_string()),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(
                    "expected an object of feature selections or a list of such objects".into(),
                )
            }
        };
        maps.into_iter()
            .flatten()
            .map(|(feature, value)| Selection::from_value(value).map(|s| (feature, s)))
            .collect::<Result<Vec<_>, _>>()
            .map(Selections)
    }
}

impl Serialize for Selections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0
            .iter()
            .map(|(feature, selection)| (feature.clone(), selection.to_value()))
            .collect::<Map<String, Value>>()
            .serialize(serializer)
    }
}

/// Ein benanntes Trainings-Szenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCase {
    /// Name, nur für Berichte.
    pub name: String,
    /// Feature-Auswahl, aus der der Kontext gebaut wird.
    #[serde(default)]
    pub features: Selections,
    /// Aktionen, die nicht gerankt werden dürfen.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Die Aktion, die der Dienst idealerweise wählt.
    pub expected: String,
}

/// Ergebnis eines einzelnen Trainingslaufs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub name: String,
    /// `true`, wenn die vom Dienst gewählte Aktion der erwarteten entspricht.
    pub passed: bool,
    pub ranked_top: String,
    pub expected: String,
    /// Gemeldete Belohnung (0.0 bis 1.0).
    pub reward: f32,
    pub event_id: String,
    #[serde(default)]
    pub ranking: Vec<RankedAction>,
}
