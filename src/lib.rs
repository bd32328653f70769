//! Sepsis/SIRS ICU cohort extraction over MIMIC-IV Parquet tables.
//!
//! The pipeline loads the clinical source tables into an in-memory event
//! store, scores every ICU stay (SIRS, SOFA, OASIS), applies the cohort
//! filter chain and writes one feature row per eligible stay.

pub mod algorithm;
pub mod codes;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod synthetic;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{OutputConfig, PipelineConfig, SuspicionConfig};
pub use error::{CohortError, Result};
pub use pipeline::{CohortOutput, CohortPipeline, write_cohort};

// Event store
pub use store::{EventSource, EventStore, EventStoreBuilder, LoadOptions, TimeWindow};
pub use synthetic::generate_store;

// Coding systems
pub use codes::{CodeRevision, Concept, ItemCodeMap};

// Results
pub use algorithm::assembly::{FeatureRow, cohort_schema};
pub use algorithm::cohort::{CohortAudit, Inclusion};

// Arrow types
pub use arrow::datatypes::Schema as ArrowSchema;
pub use arrow::record_batch::RecordBatch;

// Utility functions
pub use utils::{DEFAULT_BATCH_SIZE, read_parquet, read_table};
