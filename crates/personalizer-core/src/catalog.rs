//! Kataloge für Features und Aktionen.
//!
//! Beide Kataloge werden einmal beim Start geladen und danach nur gelesen.
//! Ein [`Feature`] bildet symbolische Werte (Labels) auf Attribut-Bags ab,
//! eine [`Action`] trägt beliebig viele Feature-Vektoren.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ein frei geformtes JSON-Objekt mit Attributen.
pub type AttributeBag = Map<String, Value>;

/// Ein benanntes, auswählbares Feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Eindeutiger Name innerhalb des Katalogs (z. B. "Location").
    pub name: String,
    /// Optionale Frage für den interaktiven Modus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Geordnete Liste der auswählbaren Werte, nie leer.
    pub values: Vec<FeatureValue>,
}

/// Ein auswählbarer Wert eines Features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    /// Menschenlesbares Label, gleichzeitig der symbolische Wert.
    pub label: String,
    /// Attribute, die beim Bau des Kontexts verwendet werden.
    #[serde(default)]
    pub payload: AttributeBag,
}

impl Feature {
    /// Text, mit dem im interaktiven Modus nach dem Feature gefragt wird.
    pub fn prompt(&self) -> String {
        self.prompt
            .clone()
            .unwrap_or_else(|| format!("Select {}", self.name))
    }

    /// Sucht einen Wert anhand seines Labels (Groß-/Kleinschreibung egal).
    pub fn value(&self, label: &str) -> Option<&FeatureValue> {
        self.values
            .iter()
            .find(|v| v.label.eq_ignore_ascii_case(label))
    }

    /// Liefert den Wert zur 1-basierten Menü-Position. `0` ist für "überspringen"
    /// reserviert und liefert daher `None`.
    pub fn value_at(&self, index: usize) -> Option<&FeatureValue> {
        index.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Der Attribut-Bag, den ein Wert zum Kontext beiträgt.
    ///
    /// Ohne explizite Payload wird `{ <name>: <label> }` verwendet.
    pub fn payload_for(&self, value: &FeatureValue) -> AttributeBag {
        if value.payload.is_empty() {
            let mut bag = AttributeBag::new();
            bag.insert(self.name.clone(), Value::String(value.label.clone()));
            bag
        } else {
            value.payload.clone()
        }
    }
}

/// Eine rankbare Aktion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Eindeutige Kennung im Katalog.
    pub id: String,
    /// Feature-Vektoren; die Reihenfolge bleibt bei der Serialisierung erhalten.
    #[serde(default)]
    pub features: Vec<AttributeBag>,
}
