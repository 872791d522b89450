//! Macht aus einer Feature-Auswahl einen [`Context`] für das Ranking.

use personalizer_core::{Context, Selection, Selections};

use crate::catalog::FeatureCatalog;
use crate::error::{Result, TrainingError};

/// Löst eine Auswahl gegen einen [`FeatureCatalog`] auf. Rein, ohne Zustand.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder<'c> {
    catalog: &'c FeatureCatalog,
}

impl<'c> ContextBuilder<'c> {
    pub fn new(catalog: &'c FeatureCatalog) -> Self {
        Self { catalog }
    }

    /// Baut den Kontext in Auswahlreihenfolge. Übersprungene Features tragen
    /// nichts bei; es entstehen nie mehr Bags als `selections` Einträge hat.
    pub fn build(&self, selections: &Selections) -> Result<Context> {
        let mut bags = Vec::with_capacity(selections.len());
        for (name, selection) in selections.iter() {
            let feature = self
                .catalog
                .get(name)
                .ok_or_else(|| TrainingError::UnknownFeature(name.to_string()))?;
            match selection {
                Selection::Skip => {}
                Selection::Raw(bag) => bags.push(bag.clone()),
                Selection::Label(label) => {
                    let value = feature.value(label).ok_or_else(|| {
                        TrainingError::UnknownFeatureValue {
                            feature: name.to_string(),
                            value: label.clone(),
                        }
                    })?;
                    bags.push(feature.payload_for(value));
                }
            }
        }
        Ok(Context(bags))
    }
}
