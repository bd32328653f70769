//! Unit conversion and plausibility ranges
//!
//! Raw readings are converted to the reporting unit of their concept
//! (temperature in Celsius, weight in kg, height in cm, FiO2 in percent)
//! and dropped when outside the physiological range.

use super::Concept;

/// Pounds to kilograms
pub const LB_TO_KG: f64 = 0.453_592_37;
/// Inches to centimetres
pub const INCH_TO_CM: f64 = 2.54;

#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) / 1.8
}

#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Open interval check, `None` meaning unbounded
fn within(value: f64, lower: Option<f64>, upper: Option<f64>) -> bool {
    lower.is_none_or(|lower| value > lower) && upper.is_none_or(|upper| value < upper)
}

/// Convert a raw reading to its reporting unit, or `None` when implausible
#[must_use]
pub fn normalize(concept: Concept, value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    match concept {
        Concept::HeartRate => within(value, Some(0.0), Some(300.0)).then_some(value),
        Concept::SystolicBp => within(value, Some(0.0), Some(400.0)).then_some(value),
        Concept::DiastolicBp | Concept::MeanBp => {
            within(value, Some(0.0), Some(300.0)).then_some(value)
        }
        Concept::RespRate => within(value, Some(0.0), Some(70.0)).then_some(value),
        Concept::TemperatureF => {
            within(value, Some(70.0), Some(120.0)).then(|| fahrenheit_to_celsius(value))
        }
        Concept::TemperatureC => within(value, Some(10.0), Some(50.0)).then_some(value),
        Concept::Spo2 => (value > 0.0 && value <= 100.0).then_some(value),
        Concept::GlucoseChart => within(value, Some(0.0), None).then_some(value),
        Concept::GcsEye | Concept::GcsVerbal | Concept::GcsMotor => {
            (0.0..=6.0).contains(&value).then_some(value)
        }
        Concept::FiO2 => {
            let percent = if value <= 1.0 { value * 100.0 } else { value };
            (percent > 20.0 && percent <= 100.0).then_some(percent)
        }
        Concept::WeightKg => within(value, Some(25.0), None).then_some(value),
        Concept::WeightLb => {
            let kg = value * LB_TO_KG;
            within(kg, Some(25.0), None).then_some(kg)
        }
        Concept::HeightCm => within(value, Some(120.0), Some(230.0)).then_some(value),
        Concept::HeightIn => {
            let cm = value * INCH_TO_CM;
            within(cm, Some(120.0), Some(230.0)).then_some(cm)
        }
        Concept::BaseExcess | Concept::UrineOutput | Concept::GuIrrigantIn => Some(value),
        _ => (value >= 0.0).then_some(value),
    }
}
