//! Coding systems: item codes, diagnosis code sets, drug vocabulary, units

pub mod antibiotics;
pub mod icd;
pub mod item_codes;
pub mod units;

pub use antibiotics::is_antibiotic;
pub use icd::IcdCodeSet;
pub use item_codes::{CodeRevision, Concept, EventTable, ItemCodeMap};
pub use units::normalize;
