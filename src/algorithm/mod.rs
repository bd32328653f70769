//! Cohort construction algorithms
//!
//! Scores and features are pure reductions of a stay's windowed events;
//! the cohort filter and assembler work on whole stay sets.

pub mod assembly;
pub mod cohort;
pub mod context;
pub mod features;
pub mod infection;
pub mod scores;

pub use context::{Reading, StayContext, ValueSummary};
