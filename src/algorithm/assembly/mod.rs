//! Cohort assembly: outcome flags and the wide per-stay row

pub mod assembler;
pub mod feature_row;
pub mod outcome;

pub use assembler::{CohortAssembler, StayComponents};
pub use feature_row::{FeatureRow, cohort_schema, column_names, to_record_batch};
pub use outcome::{Outcomes, death_time};
