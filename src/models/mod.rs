//! Typed records read from the clinical event store
//!
//! These are immutable snapshots of source rows; the pipeline never mutates
//! them after loading.

pub mod events;
pub mod health;
pub mod stay;

pub use events::{
    ChartEvent, InputEvent, LabEvent, Measurement, MicrobiologyCulture, OutputEvent,
    Prescription, ProcedureEvent, ServiceTransfer, Timed,
};
pub use health::diagnosis::{DiagnosisCode, IcdVersion};
pub use stay::{Admission, IcuStay, Patient};

/// Patient identifier
pub type SubjectId = i64;
/// Hospital admission identifier
pub type HadmId = i64;
/// ICU stay identifier
pub type StayId = i64;
/// Item code of a measured concept
pub type ItemId = i64;
