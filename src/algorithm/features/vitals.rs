//! Bedside vital signs over the observation window

use itertools::Itertools;

use crate::algorithm::context::{StayContext, ValueSummary};
use crate::codes::Concept;

/// Window summaries of the charted vitals
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VitalSigns {
    pub heart_rate: Option<ValueSummary>,
    pub sbp: Option<ValueSummary>,
    pub dbp: Option<ValueSummary>,
    pub mbp: Option<ValueSummary>,
    pub resp_rate: Option<ValueSummary>,
    /// Celsius, Fahrenheit readings converted
    pub temperature: Option<ValueSummary>,
    pub spo2: Option<ValueSummary>,
    pub glucose: Option<ValueSummary>,
    /// Lowest total Glasgow Coma Scale
    pub gcs_min: Option<f64>,
}

impl VitalSigns {
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        Self {
            heart_rate: ctx.chart_summary(&[Concept::HeartRate]),
            sbp: ctx.chart_summary(&[Concept::SystolicBp]),
            dbp: ctx.chart_summary(&[Concept::DiastolicBp]),
            mbp: ctx.chart_summary(&[Concept::MeanBp]),
            resp_rate: ctx.chart_summary(&[Concept::RespRate]),
            temperature: ctx.chart_summary(&[Concept::TemperatureF, Concept::TemperatureC]),
            spo2: ctx.chart_summary(&[Concept::Spo2]),
            glucose: ctx.chart_summary(&[Concept::GlucoseChart]),
            gcs_min: gcs_min(ctx),
        }
    }
}

/// Lowest GCS total among chart times where eye, verbal and motor are all recorded
fn gcs_min(ctx: &StayContext<'_>) -> Option<f64> {
    ctx.chart_readings(&[Concept::GcsEye, Concept::GcsVerbal, Concept::GcsMotor])
        .into_iter()
        .into_group_map_by(|reading| reading.time)
        .into_values()
        .filter_map(|readings| {
            let component = |concept| {
                readings
                    .iter()
                    .find(|reading| reading.concept == concept)
                    .map(|reading| reading.value)
            };
            Some(
                component(Concept::GcsEye)?
                    + component(Concept::GcsVerbal)?
                    + component(Concept::GcsMotor)?,
            )
        })
        .min_by(f64::total_cmp)
}

/// Mean of a summary, when present
#[must_use]
pub fn mean(summary: Option<ValueSummary>) -> Option<f64> {
    summary.map(|s| s.mean)
}

/// Minimum of a summary, when present
#[must_use]
pub fn min(summary: Option<ValueSummary>) -> Option<f64> {
    summary.map(|s| s.min)
}

/// Maximum of a summary, when present
#[must_use]
pub fn max(summary: Option<ValueSummary>) -> Option<f64> {
    summary.map(|s| s.max)
}
