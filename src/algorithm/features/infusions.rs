//! Vasopressor exposure
//!
//! Rates are standardised to mcg/kg/min (units/min for vasopressin) and
//! converted to a norepinephrine-equivalent dose.

use crate::algorithm::context::StayContext;
use crate::codes::{Concept, EventTable};
use crate::models::InputEvent;

/// Norepinephrine-equivalent factor of a vasopressor
#[must_use]
pub const fn norepinephrine_factor(concept: Concept) -> Option<f64> {
    match concept {
        Concept::Norepinephrine | Concept::Epinephrine => Some(1.0),
        Concept::Dopamine => Some(0.01),
        Concept::Phenylephrine => Some(0.1),
        Concept::Vasopressin => Some(2.5),
        _ => None,
    }
}

/// Rate in mcg/kg/min, or units/min for vasopressin; `None` for unknown units
#[must_use]
pub fn standardized_rate(concept: Concept, infusion: &InputEvent) -> Option<f64> {
    let rate = infusion.rate?;
    let unit = infusion.rateuom.as_deref()?.trim().to_lowercase();

    if concept == Concept::Vasopressin {
        return match unit.as_str() {
            "units/min" => Some(rate),
            "units/hour" => Some(rate / 60.0),
            _ => None,
        };
    }

    match unit.as_str() {
        "mcg/kg/min" => Some(rate),
        "mg/kg/min" => Some(rate * 1000.0),
        "mcg/min" => infusion
            .patientweight
            .filter(|weight| *weight > 0.0)
            .map(|weight| rate / weight),
        _ => None,
    }
}

/// Vasopressor use over the observation window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VasopressorExposure {
    /// Any vasopressor infusion running inside the window
    pub vasopressor: bool,
    /// Highest norepinephrine-equivalent dose among those infusions
    pub norepinephrine_equivalent_max: Option<f64>,
}

impl VasopressorExposure {
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        let itemids = ctx.codes.codes_of(&Concept::VASOPRESSORS);
        let infusions = ctx.store.infusions(ctx.stay.stay_id, &itemids, &ctx.window);
        let norepinephrine_equivalent_max = infusions
            .iter()
            .filter_map(|infusion| {
                let concept = ctx.codes.concept_of(EventTable::Input, infusion.itemid)?;
                Some(standardized_rate(concept, infusion)? * norepinephrine_factor(concept)?)
            })
            .max_by(f64::total_cmp);

        Self {
            vasopressor: !infusions.is_empty(),
            norepinephrine_equivalent_max,
        }
    }
}
