//! Error handling for the cohort pipeline.
//!
//! Missing clinical values are not errors; they travel as `Option`. Everything
//! in here is fatal to a run and points at a problem in the source tables or
//! the configuration.

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the cohort pipeline
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error reading or writing JSON (configuration, audit report)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is missing from a source table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// Table being read
        table: String,
        /// Missing column
        column: String,
    },

    /// A column could not be interpreted as the expected type
    #[error("Column '{column}' is not a {expected} array")]
    InvalidDataType {
        /// Column name
        column: String,
        /// Human-readable expected type
        expected: String,
    },

    /// A required table is absent from the data directory
    #[error("Table '{table}' not found at {}", path.display())]
    TableNotFound {
        /// Table name
        table: String,
        /// Location searched
        path: PathBuf,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error producing the output table
    #[error("Output error: {0}")]
    Output(String),

    /// A background loading task panicked or was cancelled
    #[error("Task join error: {0}")]
    Task(String),
}

impl CohortError {
    /// Shorthand for a missing column in `table`
    pub fn column_not_found(table: &str, column: &str) -> Self {
        Self::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// Shorthand for a column with an unusable type
    pub fn invalid_data_type(column: &str, expected: &str) -> Self {
        Self::InvalidDataType {
            column: column.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Result type for cohort pipeline operations
pub type Result<T> = std::result::Result<T, CohortError>;
