//! Parquet file operations
//!
//! Tables of the event store are stored either as a single `<table>.parquet`
//! file or as a `<table>/` directory of Parquet parts. This module resolves
//! table locations and reads them into Arrow record batches, projecting only
//! the columns the loaders need.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use rayon::prelude::*;

use crate::error::{CohortError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("PARQUET_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
}

/// Validates that a directory exists and is a directory
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(CohortError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", dir.display()),
        )));
    }
    Ok(())
}

/// Locate a table inside the data directory
///
/// Prefers `<table>.parquet`, then a `<table>/` directory of parts.
#[must_use]
pub fn resolve_table_path(data_dir: &Path, table: &str) -> Option<PathBuf> {
    let file = data_dir.join(format!("{table}.parquet"));
    if file.is_file() {
        return Some(file);
    }
    let dir = data_dir.join(table);
    dir.is_dir().then_some(dir)
}

/// Projection mask selecting the named top-level columns
///
/// Returns `None` when none of the columns exist, in which case every column
/// is read.
#[must_use]
pub fn create_projection(
    columns: &[&str],
    file_schema: &Schema,
    parquet_schema: &parquet::schema::types::SchemaDescriptor,
) -> Option<ProjectionMask> {
    let projection = columns
        .iter()
        .filter_map(|name| file_schema.index_of(name).ok())
        .sorted()
        .collect_vec();

    if projection.is_empty() {
        log_warning(
            "No matching fields found in column projection, reading all columns",
            None,
        );
        None
    } else {
        Some(ProjectionMask::roots(parquet_schema, projection))
    }
}

/// Read a parquet file into Arrow record batches
///
/// Only `columns` are read when given; columns absent from the file are left
/// for the caller to report.
pub fn read_parquet(path: &Path, columns: Option<&[&str]>) -> Result<Vec<RecordBatch>> {
    let start = std::time::Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = File::open(path)?;
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE));

    if let Some(columns) = columns {
        let mask = create_projection(columns, builder.schema(), builder.parquet_schema());
        if let Some(mask) = mask {
            builder = builder.with_projection(mask);
        }
    }

    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    log_operation_complete("read", path, batches.len(), Some(start.elapsed()));
    Ok(batches)
}

/// Find all Parquet files in a directory, sorted by name
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir)?;

    let parquet_files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .filter_ok(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "parquet"))
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .sorted()
        .collect_vec();

    if parquet_files.is_empty() {
        log_warning("No Parquet files found in directory", Some(dir));
    }

    Ok(parquet_files)
}

/// Read every batch of a table, reading directory parts in parallel
///
/// Returns `Ok(None)` when the table does not exist in `data_dir`.
pub fn read_table(
    data_dir: &Path,
    table: &str,
    columns: &[&str],
) -> Result<Option<Vec<RecordBatch>>> {
    let Some(path) = resolve_table_path(data_dir, table) else {
        return Ok(None);
    };

    if path.is_file() {
        return read_parquet(&path, Some(columns)).map(Some);
    }

    let parts = find_parquet_files(&path)?;
    let batches = parts
        .par_iter()
        .map(|part| read_parquet(part, Some(columns)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect_vec();

    log::info!(
        "Loaded {} batches from {} parts of table '{table}'",
        batches.len(),
        parts.len()
    );
    Ok(Some(batches))
}
