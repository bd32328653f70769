//! Utilities for working with Arrow arrays.
//!
//! Source tables come from several exports whose column types drift (ids as
//! Int32 or Int64, timestamps with or without time zone, dates instead of
//! timestamps). Columns are looked up by name and cast to the type the loader
//! expects; a cast that fails is a malformed table and therefore an error.

use arrow::array::{Array, ArrayRef};
use arrow::compute::kernels::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{CohortError, Result};

/// Get a column from a record batch, cast to the expected data type
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column array (converted if necessary) if found
/// * `Ok(None)` - If the column is not found and `required` is false
/// * `Err` - If the column is missing and required, or the cast fails
pub fn get_column(
    batch: &RecordBatch,
    table: &str,
    column_name: &str,
    expected_type: &DataType,
    required: bool,
) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(column_name) else {
        if required {
            return Err(CohortError::column_not_found(table, column_name));
        }
        debug!("Optional column '{column_name}' not found in table '{table}'");
        return Ok(None);
    };

    let column = batch.column(idx);
    let actual_type = column.data_type();
    if actual_type == expected_type {
        return Ok(Some(column.clone()));
    }

    debug!("Converting column '{column_name}' from {actual_type:?} to {expected_type:?}");
    let converted = cast::cast(column, expected_type).map_err(|err| {
        log::error!("Cannot convert column '{column_name}' in table '{table}': {err}");
        CohortError::invalid_data_type(column_name, &expected_type.to_string())
    })?;
    Ok(Some(converted))
}

/// Downcast a column to a specific array type with clear error messages
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| CohortError::invalid_data_type(column_name, expected_type_name))
}
