//! IO utilities for reading source tables and writing the cohort

pub mod output;
pub mod parquet;

pub use output::{write_csv, write_parquet};
pub use parquet::{
    DEFAULT_BATCH_SIZE, find_parquet_files, read_parquet, read_table, resolve_table_path,
    validate_directory,
};
