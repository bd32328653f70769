//! Patients, hospital admissions and ICU stays

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{HadmId, StayId, SubjectId};
use crate::store::TimeWindow;

/// Admission types counted as elective for the OASIS elective-surgery component
const ELECTIVE_ADMISSION_TYPES: [&str; 2] = ["ELECTIVE", "SURGICAL SAME DAY ADMISSION"];

/// Patient demographics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub subject_id: SubjectId,
    pub gender: Option<String>,
    /// Age in the patient's anchor year
    pub anchor_age: Option<i64>,
    /// Shifted year in which `anchor_age` applies
    pub anchor_year: Option<i64>,
    /// Date of death (out-of-hospital deaths included)
    pub dod: Option<NaiveDateTime>,
}

impl Patient {
    /// Age at the given time, derived from the anchor age and year
    #[must_use]
    pub fn age_at(&self, time: NaiveDateTime) -> Option<i64> {
        let anchor_age = self.anchor_age?;
        let anchor_year = self.anchor_year?;
        Some(anchor_age + i64::from(time.year()) - anchor_year)
    }
}

/// One hospital admission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub subject_id: SubjectId,
    pub hadm_id: HadmId,
    pub admittime: NaiveDateTime,
    pub dischtime: Option<NaiveDateTime>,
    pub deathtime: Option<NaiveDateTime>,
    pub admission_type: Option<String>,
    pub race: Option<String>,
}

impl Admission {
    /// Whether the admission was elective; `None` when the type is unknown
    #[must_use]
    pub fn is_elective(&self) -> Option<bool> {
        self.admission_type.as_deref().map(|kind| {
            let kind = kind.trim().to_uppercase();
            ELECTIVE_ADMISSION_TYPES.contains(&kind.as_str())
        })
    }
}

/// One continuous ICU episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcuStay {
    pub subject_id: SubjectId,
    pub hadm_id: HadmId,
    pub stay_id: StayId,
    pub first_careunit: Option<String>,
    pub intime: NaiveDateTime,
    pub outtime: Option<NaiveDateTime>,
}

impl IcuStay {
    /// ICU duration; unknown when the stay has no discharge time
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.outtime.map(|outtime| outtime - self.intime)
    }

    /// ICU duration in fractional hours
    #[must_use]
    pub fn los_hours(&self) -> Option<f64> {
        self.duration()
            .map(|duration| duration.num_seconds() as f64 / 3600.0)
    }

    /// Window of the given length starting at ICU admission
    #[must_use]
    pub fn observation_window(&self, length: Duration) -> TimeWindow {
        TimeWindow::starting_at(self.intime, length)
    }

    /// The calendar day of ICU admission; the next midnight belongs to the next day
    #[must_use]
    pub fn first_calendar_day(&self) -> TimeWindow {
        let midnight = self.intime.date().and_hms_opt(0, 0, 0).unwrap_or(self.intime);
        TimeWindow::new(midnight, midnight + Duration::days(1) - Duration::microseconds(1))
    }

    /// The whole stay; open-ended stays are bounded by the admission time itself
    #[must_use]
    pub fn whole_stay(&self) -> TimeWindow {
        TimeWindow::new(self.intime, self.outtime.unwrap_or(self.intime))
    }
}
