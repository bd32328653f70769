//! Height, weight and BMI
//!
//! Height is charted in centimetres and inches, often both at the same
//! time. Readings taken together are reconciled into one value per chart
//! time and the stay's height is the median of those. Weight is the mean
//! over the first calendar day of the stay.

use itertools::Itertools;

use crate::algorithm::context::{StayContext, ValueSummary};
use crate::codes::Concept;

/// Largest difference in cm at which paired readings are considered to agree
pub const HEIGHT_AGREEMENT_CM: f64 = 5.0;

/// Stay-level body measurements
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Anthropometry {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
}

impl Anthropometry {
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        let height_cm = stay_height(&ctx.with_window(ctx.stay.whole_stay()));
        let weight_kg = ValueSummary::of(
            ctx.with_window(ctx.stay.first_calendar_day())
                .chart_readings(&[Concept::WeightKg, Concept::WeightLb])
                .into_iter()
                .map(|reading| reading.value),
        )
        .map(|summary| summary.mean);

        Self {
            height_cm,
            weight_kg,
            bmi: bmi(weight_kg, height_cm),
        }
    }
}

/// Reconcile a centimetre reading and an inch reading (already in cm) taken together
///
/// Agreeing readings and conflicting readings both resolve to the centimetre
/// value; a lone reading is used as is.
#[must_use]
pub fn reconcile_height(cm: Option<f64>, inches_as_cm: Option<f64>) -> Option<f64> {
    match (cm, inches_as_cm) {
        (Some(cm), Some(converted)) => {
            if (cm - converted).abs() > HEIGHT_AGREEMENT_CM {
                log::debug!("Height readings disagree: {cm:.1} cm vs {converted:.1} cm from inches");
            }
            Some(cm)
        }
        (cm, converted) => cm.or(converted),
    }
}

/// Median of the reconciled heights over the context window
fn stay_height(ctx: &StayContext<'_>) -> Option<f64> {
    let heights = ctx
        .chart_readings(&[Concept::HeightCm, Concept::HeightIn])
        .into_iter()
        .into_group_map_by(|reading| reading.time)
        .into_values()
        .filter_map(|readings| {
            let value_of = |concept| {
                readings
                    .iter()
                    .find(|reading| reading.concept == concept)
                    .map(|reading| reading.value)
            };
            reconcile_height(value_of(Concept::HeightCm), value_of(Concept::HeightIn))
        })
        .collect_vec();
    median(heights)
}

/// Median, averaging the two middle values of an even count
#[must_use]
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Body-mass index from weight in kg and height in cm
#[must_use]
pub fn bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let weight = weight_kg.filter(|weight| *weight > 25.0)?;
    let height_m = height_cm.filter(|height| *height > 0.0)? / 100.0;
    Some(weight / (height_m * height_m))
}
