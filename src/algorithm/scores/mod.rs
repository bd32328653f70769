//! Severity score calculators
//!
//! Each calculator is a pure reduction of a stay's windowed events. Missing
//! data yields a missing score, never an error.

pub mod oasis;
pub mod sirs;
pub mod sofa;

pub use oasis::{OasisInputs, OasisScore};
pub use sirs::{SirsInputs, SirsScore};
pub use sofa::{SofaInputs, SofaScore};
