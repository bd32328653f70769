//! Oxford Acute Severity of Illness Score (OASIS)
//!
//! Ten ordinal sub-scores, each mapped through a fixed breakpoint table.
//! Breakpoints are tried in order and the first match wins. A sub-score
//! without data stays `None` in the output and contributes nothing to the
//! total.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::algorithm::context::StayContext;
use crate::algorithm::features::StayFeatures;
use crate::algorithm::features::vitals::{max, min};
use crate::algorithm::scores::sirs::sum_present;

/// Intercept of the OASIS in-hospital mortality model
pub const MORTALITY_INTERCEPT: f64 = -6.1746;
/// Per-point coefficient of the OASIS in-hospital mortality model
pub const MORTALITY_COEFFICIENT: f64 = 0.1275;

/// Values the OASIS sub-scores are computed from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OasisInputs {
    /// Minutes from hospital admission to ICU admission
    pub preiculos_minutes: Option<f64>,
    pub age: Option<i64>,
    pub gcs_min: Option<f64>,
    pub heart_rate_min: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub mbp_min: Option<f64>,
    pub mbp_max: Option<f64>,
    pub resp_rate_min: Option<f64>,
    pub resp_rate_max: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    /// Urine output over the observation window, in mL
    pub urine_output: Option<f64>,
    pub mechanical_ventilation: Option<bool>,
    /// Elective admission with a surgical service; `None` when the admission type is unknown
    pub elective_surgery: Option<bool>,
}

impl OasisInputs {
    /// Gather the inputs from the stay's aggregated features and admission
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>, features: &StayFeatures) -> Self {
        let stay = ctx.stay;
        let admission = ctx.store.admission(stay.hadm_id);
        let vitals = &features.vitals;

        Self {
            preiculos_minutes: admission
                .map(|admission| (stay.intime - admission.admittime).num_seconds() as f64 / 60.0),
            age: ctx
                .store
                .patient(stay.subject_id)
                .and_then(|patient| patient.age_at(stay.intime)),
            gcs_min: vitals.gcs_min,
            heart_rate_min: min(vitals.heart_rate),
            heart_rate_max: max(vitals.heart_rate),
            mbp_min: min(vitals.mbp),
            mbp_max: max(vitals.mbp),
            resp_rate_min: min(vitals.resp_rate),
            resp_rate_max: max(vitals.resp_rate),
            temp_min_c: min(vitals.temperature),
            temp_max_c: max(vitals.temperature),
            urine_output: features.urine_output,
            mechanical_ventilation: Some(features.procedures.mechanical_ventilation),
            elective_surgery: admission.and_then(|admission| admission.is_elective()).map(
                |elective| {
                    let cutoff = stay.intime + Duration::hours(24);
                    elective
                        && ctx
                            .store
                            .services(stay.hadm_id)
                            .iter()
                            .any(|service| service.transfertime <= cutoff && service.is_surgical())
                },
            ),
        }
    }
}

/// The ten OASIS sub-scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OasisScore {
    pub preiculos: Option<u8>,
    pub age: Option<u8>,
    pub gcs: Option<u8>,
    pub heart_rate: Option<u8>,
    pub mbp: Option<u8>,
    pub resp_rate: Option<u8>,
    pub temp: Option<u8>,
    pub urine_output: Option<u8>,
    pub mechvent: Option<u8>,
    pub electivesurgery: Option<u8>,
}

impl OasisScore {
    #[must_use]
    pub fn from_inputs(inputs: &OasisInputs) -> Self {
        Self {
            preiculos: inputs.preiculos_minutes.map(preiculos_score),
            age: inputs.age.map(age_score),
            gcs: inputs.gcs_min.map(gcs_score),
            heart_rate: heart_rate_score(inputs.heart_rate_min, inputs.heart_rate_max),
            mbp: mbp_score(inputs.mbp_min, inputs.mbp_max),
            resp_rate: resp_rate_score(inputs.resp_rate_min, inputs.resp_rate_max),
            temp: temp_score(inputs.temp_min_c, inputs.temp_max_c),
            urine_output: inputs.urine_output.map(urine_output_score),
            mechvent: inputs.mechanical_ventilation.map(|vent| if vent { 9 } else { 0 }),
            electivesurgery: inputs
                .elective_surgery
                .map(|elective| if elective { 0 } else { 6 }),
        }
    }

    /// Sum of the present sub-scores; `None` when every sub-score is missing
    #[must_use]
    pub fn total(&self) -> Option<u8> {
        sum_present(&[
            self.preiculos,
            self.age,
            self.gcs,
            self.heart_rate,
            self.mbp,
            self.resp_rate,
            self.temp,
            self.urine_output,
            self.mechvent,
            self.electivesurgery,
        ])
    }

    /// Predicted in-hospital mortality
    #[must_use]
    pub fn mortality_probability(&self) -> Option<f64> {
        self.total().map(probability)
    }
}

/// Logistic transform of an OASIS total
#[must_use]
pub fn probability(oasis: u8) -> f64 {
    1.0 / (1.0 + (-(MORTALITY_INTERCEPT + MORTALITY_COEFFICIENT * f64::from(oasis))).exp())
}

#[must_use]
pub fn preiculos_score(minutes: f64) -> u8 {
    if minutes < 10.2 {
        5
    } else if minutes < 297.0 {
        3
    } else if minutes < 1440.0 {
        0
    } else if minutes < 18708.0 {
        2
    } else {
        1
    }
}

#[must_use]
pub fn age_score(age: i64) -> u8 {
    match age {
        ..24 => 0,
        24..=53 => 3,
        54..=77 => 6,
        78..=89 => 9,
        _ => 7,
    }
}

#[must_use]
pub fn gcs_score(gcs: f64) -> u8 {
    if gcs < 8.0 {
        10
    } else if gcs < 14.0 {
        4
    } else if gcs == 14.0 {
        3
    } else {
        0
    }
}

fn lt(value: Option<f64>, bound: f64) -> bool {
    value.is_some_and(|v| v < bound)
}

fn gt(value: Option<f64>, bound: f64) -> bool {
    value.is_some_and(|v| v > bound)
}

fn between(value: Option<f64>, low: f64, high: f64) -> bool {
    value.is_some_and(|v| (low..=high).contains(&v))
}

/// `None` only when both extremes are missing
fn either(min: Option<f64>, max: Option<f64>, score: impl FnOnce() -> u8) -> Option<u8> {
    (min.is_some() || max.is_some()).then(score)
}

#[must_use]
pub fn heart_rate_score(min: Option<f64>, max: Option<f64>) -> Option<u8> {
    either(min, max, || {
        if gt(max, 125.0) {
            6
        } else if lt(min, 33.0) {
            4
        } else if between(max, 107.0, 125.0) {
            3
        } else if between(max, 89.0, 106.0) {
            1
        } else {
            0
        }
    })
}

#[must_use]
pub fn mbp_score(min: Option<f64>, max: Option<f64>) -> Option<u8> {
    either(min, max, || {
        if lt(min, 20.65) {
            4
        } else if lt(min, 51.0) {
            3
        } else if gt(max, 143.44) {
            3
        } else if min.is_some_and(|v| (51.0..61.33).contains(&v)) {
            2
        } else {
            0
        }
    })
}

#[must_use]
pub fn resp_rate_score(min: Option<f64>, max: Option<f64>) -> Option<u8> {
    either(min, max, || {
        if lt(min, 6.0) {
            10
        } else if gt(max, 44.0) {
            9
        } else if gt(max, 30.0) {
            6
        } else if gt(max, 22.0) || lt(min, 13.0) {
            1
        } else {
            0
        }
    })
}

#[must_use]
pub fn temp_score(min: Option<f64>, max: Option<f64>) -> Option<u8> {
    either(min, max, || {
        if gt(max, 39.88) {
            6
        } else if between(min, 33.22, 35.93) || between(max, 33.22, 35.93) {
            4
        } else if lt(min, 33.22) {
            3
        } else if min.is_some_and(|v| v > 35.93 && v <= 36.39) || between(max, 36.89, 39.88) {
            2
        } else {
            0
        }
    })
}

#[must_use]
pub fn urine_output_score(urine_output: f64) -> u8 {
    if urine_output < 671.09 {
        10
    } else if urine_output > 6896.80 {
        8
    } else if urine_output <= 1426.99 {
        5
    } else if (1427.00..=2544.14).contains(&urine_output) {
        1
    } else {
        0
    }
}
