//! Mortality outcome flags

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Admission, IcuStay, Patient};

/// Death relative to ICU admission; all false when no death is recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcomes {
    pub death_48h: bool,
    pub death_90d: bool,
    pub hospital_death: bool,
}

/// In-hospital death time, otherwise the recorded date of death at midnight
#[must_use]
pub fn death_time(admission: Option<&Admission>, patient: Option<&Patient>) -> Option<NaiveDateTime> {
    admission
        .and_then(|admission| admission.deathtime)
        .or_else(|| {
            patient
                .and_then(|patient| patient.dod)
                .and_then(|dod| dod.date().and_hms_opt(0, 0, 0))
        })
}

impl Outcomes {
    #[must_use]
    pub fn derive(stay: &IcuStay, admission: Option<&Admission>, patient: Option<&Patient>) -> Self {
        let Some(death) = death_time(admission, patient) else {
            return Self::default();
        };
        Self {
            death_48h: death <= stay.intime + Duration::hours(48),
            death_90d: death <= stay.intime + Duration::days(90),
            hospital_death: admission
                .and_then(|admission| admission.dischtime)
                .is_some_and(|dischtime| death <= dischtime),
        }
    }
}
