//! Typed column readers for Arrow record batches
//!
//! Each reader resolves a column once per batch and then hands out
//! per-row optional values, so loaders can skip rows with null keys without
//! re-looking-up the column.

use arrow::array::{Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;

use crate::error::Result;
use crate::utils::arrow::array_utils::{downcast_array, get_column};

/// A column resolved to a concrete array type; absent optional columns read as null
#[derive(Debug, Clone)]
pub struct TypedColumn<A> {
    array: Option<A>,
}

impl<A: Array + Clone + 'static> TypedColumn<A> {
    fn resolve(
        batch: &RecordBatch,
        table: &str,
        column_name: &str,
        data_type: &DataType,
        type_name: &str,
        required: bool,
    ) -> Result<Self> {
        let array = match get_column(batch, table, column_name, data_type, required)? {
            Some(array) => Some(downcast_array::<A>(&array, column_name, type_name)?.clone()),
            None => None,
        };
        Ok(Self { array })
    }

    fn valid(&self, row: usize) -> Option<&A> {
        self.array
            .as_ref()
            .filter(|array| row < array.len() && !array.is_null(row))
    }
}

impl TypedColumn<Int64Array> {
    /// Integer column (identifiers, item codes, counts)
    pub fn int64(batch: &RecordBatch, table: &str, column: &str, required: bool) -> Result<Self> {
        Self::resolve(batch, table, column, &DataType::Int64, "Int64", required)
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<i64> {
        self.valid(row).map(|array| array.value(row))
    }
}

impl TypedColumn<Float64Array> {
    /// Floating point column (measurement values)
    pub fn float64(batch: &RecordBatch, table: &str, column: &str, required: bool) -> Result<Self> {
        Self::resolve(batch, table, column, &DataType::Float64, "Float64", required)
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<f64> {
        self.valid(row).map(|array| array.value(row))
    }
}

impl TypedColumn<StringArray> {
    /// Text column; empty strings read as null
    pub fn utf8(batch: &RecordBatch, table: &str, column: &str, required: bool) -> Result<Self> {
        Self::resolve(batch, table, column, &DataType::Utf8, "String", required)
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&str> {
        self.valid(row)
            .map(|array| array.value(row))
            .filter(|value| !value.trim().is_empty())
    }
}

impl TypedColumn<TimestampMicrosecondArray> {
    /// Timestamp column; dates are read as midnight, zones are dropped
    pub fn timestamp(batch: &RecordBatch, table: &str, column: &str, required: bool) -> Result<Self> {
        Self::resolve(
            batch,
            table,
            column,
            &DataType::Timestamp(TimeUnit::Microsecond, None),
            "Timestamp(Microsecond)",
            required,
        )
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<NaiveDateTime> {
        self.valid(row)
            .and_then(|array| array.value_as_datetime(row))
    }
}
