//! Utility modules: Arrow access, Parquet IO, logging

pub mod arrow;
pub mod io;
pub mod logging;

pub use io::{DEFAULT_BATCH_SIZE, read_parquet, read_table};
