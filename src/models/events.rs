//! Time-stamped clinical facts
//!
//! Numeric values are optional because the source tables carry free-text and
//! null readings; queries drop them rather than treating them as zero.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{HadmId, ItemId, StayId, SubjectId};
use crate::store::TimeWindow;

/// Anything with a single reference timestamp
pub trait Timed {
    fn time(&self) -> NaiveDateTime;
}

/// A charted bedside observation (vitals, devices)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEvent {
    pub stay_id: StayId,
    pub charttime: NaiveDateTime,
    pub itemid: ItemId,
    pub valuenum: Option<f64>,
}

/// A laboratory result; the admission link is absent for outpatient draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabEvent {
    pub subject_id: SubjectId,
    pub hadm_id: Option<HadmId>,
    pub charttime: NaiveDateTime,
    pub itemid: ItemId,
    pub valuenum: Option<f64>,
}

/// A fluid output measurement (urine, drains)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub stay_id: StayId,
    pub charttime: NaiveDateTime,
    pub itemid: ItemId,
    pub value: Option<f64>,
}

/// An infusion or bolus with a start and end time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub stay_id: StayId,
    pub starttime: NaiveDateTime,
    pub endtime: NaiveDateTime,
    pub itemid: ItemId,
    pub rate: Option<f64>,
    pub rateuom: Option<String>,
    pub patientweight: Option<f64>,
}

impl InputEvent {
    /// Whether the infusion runs at any point inside the window
    #[must_use]
    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        window.overlaps(self.starttime, self.endtime)
    }
}

/// A procedure such as ventilation or dialysis, with a start and end time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureEvent {
    pub stay_id: StayId,
    pub starttime: NaiveDateTime,
    pub endtime: NaiveDateTime,
    pub itemid: ItemId,
}

impl ProcedureEvent {
    /// Whether the procedure is ongoing at any point inside the window
    #[must_use]
    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        window.overlaps(self.starttime, self.endtime)
    }
}

/// A medication order, used to detect antibiotic administration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub subject_id: SubjectId,
    pub hadm_id: HadmId,
    pub starttime: NaiveDateTime,
    pub stoptime: Option<NaiveDateTime>,
    pub drug: String,
    pub route: Option<String>,
}

/// A microbiology specimen (culture order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrobiologyCulture {
    pub subject_id: SubjectId,
    pub hadm_id: Option<HadmId>,
    /// Chart time when recorded, otherwise the chart date at midnight
    pub time: NaiveDateTime,
    pub spec_type_desc: Option<String>,
}

/// A transfer between hospital services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTransfer {
    pub subject_id: SubjectId,
    pub hadm_id: HadmId,
    pub transfertime: NaiveDateTime,
    pub curr_service: String,
}

impl ServiceTransfer {
    /// Surgical and orthopaedic services
    #[must_use]
    pub fn is_surgical(&self) -> bool {
        let service = self.curr_service.trim().to_uppercase();
        service.ends_with("SURG") || service == "ORTHO"
    }
}

/// A non-null numeric reading returned by a windowed query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub time: NaiveDateTime,
    pub itemid: ItemId,
    pub value: f64,
}

impl Timed for ChartEvent {
    fn time(&self) -> NaiveDateTime {
        self.charttime
    }
}

impl Timed for LabEvent {
    fn time(&self) -> NaiveDateTime {
        self.charttime
    }
}

impl Timed for OutputEvent {
    fn time(&self) -> NaiveDateTime {
        self.charttime
    }
}

impl Timed for InputEvent {
    fn time(&self) -> NaiveDateTime {
        self.starttime
    }
}

impl Timed for ProcedureEvent {
    fn time(&self) -> NaiveDateTime {
        self.starttime
    }
}

impl Timed for Prescription {
    fn time(&self) -> NaiveDateTime {
        self.starttime
    }
}

impl Timed for MicrobiologyCulture {
    fn time(&self) -> NaiveDateTime {
        self.time
    }
}

impl Timed for ServiceTransfer {
    fn time(&self) -> NaiveDateTime {
        self.transfertime
    }
}

impl Timed for Measurement {
    fn time(&self) -> NaiveDateTime {
        self.time
    }
}
