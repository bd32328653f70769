//! Systemic Inflammatory Response Syndrome (SIRS) criteria
//!
//! Four binary components over the observation window. A component with no
//! data is missing; the total counts the components present and is missing
//! only when all four are.

use serde::{Deserialize, Serialize};

use crate::algorithm::context::StayContext;
use crate::codes::Concept;
use crate::codes::units::celsius_to_fahrenheit;

/// Lower temperature bound in °F (36.0 °C)
pub const TEMP_LOW_F: f64 = 96.8;
/// Upper temperature bound in °F (38.0 °C)
pub const TEMP_HIGH_F: f64 = 100.4;

/// Window extremes the SIRS criteria are evaluated on
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SirsInputs {
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub resp_rate_max: Option<f64>,
    pub paco2_min: Option<f64>,
    pub wbc_min: Option<f64>,
    pub wbc_max: Option<f64>,
    pub bands_max: Option<f64>,
}

impl SirsInputs {
    /// Collect the inputs for a stay's observation window
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        let temperature = ctx.chart_summary(&[Concept::TemperatureF, Concept::TemperatureC]);
        let wbc = ctx.lab_summary(&[Concept::Wbc]);
        Self {
            temp_min_c: temperature.map(|s| s.min),
            temp_max_c: temperature.map(|s| s.max),
            heart_rate_max: ctx.chart_summary(&[Concept::HeartRate]).map(|s| s.max),
            resp_rate_max: ctx.chart_summary(&[Concept::RespRate]).map(|s| s.max),
            paco2_min: ctx.lab_summary(&[Concept::Paco2]).map(|s| s.min),
            wbc_min: wbc.map(|s| s.min),
            wbc_max: wbc.map(|s| s.max),
            bands_max: ctx.lab_summary(&[Concept::Bands]).map(|s| s.max),
        }
    }
}

/// Per-component SIRS result; `None` marks a component without data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SirsScore {
    pub temperature: Option<u8>,
    pub heart_rate: Option<u8>,
    pub respiration: Option<u8>,
    pub white_cells: Option<u8>,
}

impl SirsScore {
    /// Evaluate the four criteria
    #[must_use]
    pub fn from_inputs(inputs: &SirsInputs) -> Self {
        let temp_min_f = inputs.temp_min_c.map(to_fahrenheit);
        let temp_max_f = inputs.temp_max_c.map(to_fahrenheit);

        Self {
            temperature: criterion(
                [
                    temp_min_f.map(|t| t < TEMP_LOW_F),
                    temp_max_f.map(|t| t > TEMP_HIGH_F),
                ],
            ),
            heart_rate: criterion([inputs.heart_rate_max.map(|hr| hr > 90.0)]),
            respiration: criterion([
                inputs.resp_rate_max.map(|rr| rr > 20.0),
                inputs.paco2_min.map(|paco2| paco2 < 32.0),
            ]),
            white_cells: criterion([
                inputs.wbc_min.map(|wbc| wbc < 4.0),
                inputs.wbc_max.map(|wbc| wbc > 12.0),
                inputs.bands_max.map(|bands| bands > 10.0),
            ]),
        }
    }

    /// Compute the score for a stay's observation window
    #[must_use]
    pub fn calculate(ctx: &StayContext<'_>) -> Self {
        Self::from_inputs(&SirsInputs::collect(ctx))
    }

    /// Number of criteria met, in `0..=4`; `None` when no component has data
    #[must_use]
    pub fn total(&self) -> Option<u8> {
        sum_present(&[
            self.temperature,
            self.heart_rate,
            self.respiration,
            self.white_cells,
        ])
    }
}

/// A binary criterion met by any of its conditions; missing when all are
pub(crate) fn criterion<const N: usize>(conditions: [Option<bool>; N]) -> Option<u8> {
    conditions
        .iter()
        .flatten()
        .fold(None, |met, condition| Some(u8::from(met == Some(1) || *condition)))
}

/// Sum of the present components; `None` when all are missing
pub(crate) fn sum_present(components: &[Option<u8>]) -> Option<u8> {
    components
        .iter()
        .flatten()
        .fold(None, |total: Option<u8>, score| {
            Some(total.unwrap_or(0).saturating_add(*score))
        })
}

/// Celsius to Fahrenheit rounded to 0.01 °F, so converted bound values compare exactly
fn to_fahrenheit(celsius: f64) -> f64 {
    (celsius_to_fahrenheit(celsius) * 100.0).round() / 100.0
}
