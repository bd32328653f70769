//! Writers for the final cohort table

use std::fs::File;
use std::path::Path;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Write a batch as CSV with a header row
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let start = std::time::Instant::now();
    log_operation_start("Writing CSV", path);

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;

    log_operation_complete("wrote", path, batch.num_rows(), Some(start.elapsed()));
    Ok(())
}

/// Write a batch as a Snappy-compressed Parquet file
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let start = std::time::Instant::now();
    log_operation_start("Writing Parquet", path);

    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    log_operation_complete("wrote", path, batch.num_rows(), Some(start.elapsed()));
    Ok(())
}
