//! Laboratory panel over the observation window
//!
//! Chemistry, haematology, coagulation and blood gas values, averaged over
//! the window. Labs are matched by subject and time, so draws recorded
//! without an admission link are included.

use rustc_hash::FxHashMap;

use crate::algorithm::context::{StayContext, ValueSummary};
use crate::codes::Concept;

/// Lab concepts reported in the cohort table, in column order
pub const PANEL: [Concept; 32] = [
    Concept::Wbc,
    Concept::Hemoglobin,
    Concept::Hematocrit,
    Concept::Platelets,
    Concept::Neutrophils,
    Concept::Lymphocytes,
    Concept::Bands,
    Concept::Sodium,
    Concept::Potassium,
    Concept::Chloride,
    Concept::Bicarbonate,
    Concept::Bun,
    Concept::Creatinine,
    Concept::Glucose,
    Concept::Calcium,
    Concept::IonizedCalcium,
    Concept::Magnesium,
    Concept::Phosphate,
    Concept::AnionGap,
    Concept::Albumin,
    Concept::Bilirubin,
    Concept::Alt,
    Concept::Ast,
    Concept::Alp,
    Concept::Lactate,
    Concept::Pt,
    Concept::Ptt,
    Concept::Inr,
    Concept::Ph,
    Concept::Pao2,
    Concept::Paco2,
    Concept::BaseExcess,
];

/// Window summaries of every panel concept with data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabPanel {
    values: FxHashMap<Concept, ValueSummary>,
}

impl LabPanel {
    /// Query the whole panel in one pass over the stay's lab events
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        let mut grouped: FxHashMap<Concept, Vec<f64>> = FxHashMap::default();
        for reading in ctx.lab_readings(&PANEL) {
            grouped.entry(reading.concept).or_default().push(reading.value);
        }
        let values = grouped
            .into_iter()
            .filter_map(|(concept, values)| Some((concept, ValueSummary::of(values)?)))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn summary(&self, concept: Concept) -> Option<ValueSummary> {
        self.values.get(&concept).copied()
    }

    #[must_use]
    pub fn mean(&self, concept: Concept) -> Option<f64> {
        self.summary(concept).map(|s| s.mean)
    }

    /// Number of concepts with at least one value
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
