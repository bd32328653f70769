//! Infection detection

pub mod suspicion;

pub use suspicion::{SuspicionEvent, first_suspicion, pair_antibiotic, suspicion_events};
