//! Health-related models
//!
//! Coded diagnoses attached to hospital admissions.

pub mod diagnosis;

pub use diagnosis::{DiagnosisCode, IcdVersion};
