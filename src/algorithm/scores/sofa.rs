//! Simplified Sequential Organ Failure Assessment (SOFA)
//!
//! One binary dysfunction flag per organ system. The score is evaluated
//! both over the observation window (reported) and over the window around
//! the suspicion-of-infection time (Sepsis-3 inclusion).

use serde::{Deserialize, Serialize};

use crate::algorithm::context::StayContext;
use crate::algorithm::scores::sirs::{criterion, sum_present};
use crate::codes::Concept;

/// Window extremes the SOFA flags are evaluated on
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SofaInputs {
    pub creatinine_max: Option<f64>,
    pub bilirubin_max: Option<f64>,
    pub mbp_min: Option<f64>,
    pub pao2_min: Option<f64>,
    pub platelets_min: Option<f64>,
}

impl SofaInputs {
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        Self {
            creatinine_max: ctx.lab_summary(&[Concept::Creatinine]).map(|s| s.max),
            bilirubin_max: ctx.lab_summary(&[Concept::Bilirubin]).map(|s| s.max),
            mbp_min: ctx.chart_summary(&[Concept::MeanBp]).map(|s| s.min),
            pao2_min: ctx.lab_summary(&[Concept::Pao2]).map(|s| s.min),
            platelets_min: ctx.lab_summary(&[Concept::Platelets]).map(|s| s.min),
        }
    }
}

/// Per-organ SOFA flags; `None` marks an organ system without data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SofaScore {
    pub renal: Option<u8>,
    pub liver: Option<u8>,
    pub cardiovascular: Option<u8>,
    pub respiration: Option<u8>,
    pub coagulation: Option<u8>,
}

impl SofaScore {
    #[must_use]
    pub fn from_inputs(inputs: &SofaInputs) -> Self {
        Self {
            renal: criterion([inputs.creatinine_max.map(|v| v >= 1.2)]),
            liver: criterion([inputs.bilirubin_max.map(|v| v >= 1.2)]),
            cardiovascular: criterion([inputs.mbp_min.map(|v| v < 70.0)]),
            respiration: criterion([inputs.pao2_min.map(|v| v < 400.0)]),
            coagulation: criterion([inputs.platelets_min.map(|v| v < 150.0)]),
        }
    }

    /// Compute the score over the context's window
    #[must_use]
    pub fn calculate(ctx: &StayContext<'_>) -> Self {
        Self::from_inputs(&SofaInputs::collect(ctx))
    }

    /// Number of dysfunctional organ systems, in `0..=5`
    #[must_use]
    pub fn total(&self) -> Option<u8> {
        sum_present(&[
            self.renal,
            self.liver,
            self.cardiovascular,
            self.respiration,
            self.coagulation,
        ])
    }
}
