//! Arrow data handling utilities

pub mod array_utils;
pub mod extractors;

pub use array_utils::{downcast_array, get_column};
pub use extractors::TypedColumn;
