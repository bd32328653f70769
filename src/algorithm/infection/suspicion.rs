//! Suspicion of infection
//!
//! An antibiotic paired with a culture close in time. A culture taken up to
//! 48h before the antibiotic dates the suspicion at the culture; otherwise a
//! culture up to 24h after dates it at the antibiotic. Each antibiotic is
//! paired with its earliest qualifying culture.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::codes::is_antibiotic;
use crate::config::SuspicionConfig;
use crate::models::{HadmId, IcuStay, MicrobiologyCulture, Prescription, SubjectId};
use crate::store::{EventSource, TimeWindow};

/// One antibiotic-culture pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspicionEvent {
    pub subject_id: SubjectId,
    pub hadm_id: HadmId,
    pub antibiotic: String,
    pub antibiotic_time: NaiveDateTime,
    pub culture_time: NaiveDateTime,
    pub specimen: Option<String>,
    pub suspected_infection_time: NaiveDateTime,
    /// Window over which SOFA is evaluated for the Sepsis-3 criterion
    pub sofa_window: TimeWindow,
}

impl SuspicionEvent {
    /// Deterministic ordering key: earliest suspicion first
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDateTime, NaiveDateTime, NaiveDateTime, NaiveDateTime) {
        (
            self.suspected_infection_time,
            self.antibiotic_time,
            self.culture_time,
            self.sofa_window.end,
        )
    }

    /// Whether the event is attributed to the stay
    #[must_use]
    pub fn belongs_to(&self, stay: &IcuStay, lookback: Duration) -> bool {
        stay.subject_id == self.subject_id
            && self.suspected_infection_time >= stay.intime - lookback
            && stay
                .outtime
                .is_none_or(|outtime| self.suspected_infection_time <= outtime)
    }
}

/// Pair one antibiotic with the cultures of its subject
///
/// `cultures` must be sorted by time.
#[must_use]
pub fn pair_antibiotic(
    prescription: &Prescription,
    cultures: &[MicrobiologyCulture],
    config: &SuspicionConfig,
) -> Option<SuspicionEvent> {
    let antibiotic_time = prescription.starttime;
    let earliest = antibiotic_time - config.culture_before();
    let latest = antibiotic_time + config.culture_after();

    let before = cultures
        .iter()
        .find(|culture| culture.time >= earliest && culture.time <= antibiotic_time);
    let (culture, suspected_infection_time) = match before {
        Some(culture) => (culture, culture.time),
        None => {
            let after = cultures
                .iter()
                .find(|culture| culture.time > antibiotic_time && culture.time <= latest)?;
            (after, antibiotic_time)
        }
    };

    Some(SuspicionEvent {
        subject_id: prescription.subject_id,
        hadm_id: prescription.hadm_id,
        antibiotic: prescription.drug.clone(),
        antibiotic_time,
        culture_time: culture.time,
        specimen: culture.spec_type_desc.clone(),
        suspected_infection_time,
        sofa_window: TimeWindow::around(
            suspected_infection_time,
            Duration::hours(config.sofa_hours_before),
            Duration::hours(config.sofa_hours_after),
        ),
    })
}

/// Every suspicion event of a subject, in tie-break order
#[must_use]
pub fn suspicion_events(
    store: &dyn EventSource,
    subject_id: SubjectId,
    config: &SuspicionConfig,
) -> Vec<SuspicionEvent> {
    let cultures = store.cultures(subject_id);
    if cultures.is_empty() {
        return Vec::new();
    }

    let mut events: Vec<SuspicionEvent> = store
        .prescriptions(subject_id)
        .iter()
        .filter(|prescription| is_antibiotic(prescription))
        .filter_map(|prescription| pair_antibiotic(prescription, cultures, config))
        .collect();
    events.sort_by_key(SuspicionEvent::sort_key);
    events
}

/// The first suspicion event attributed to the stay
#[must_use]
pub fn first_suspicion(
    store: &dyn EventSource,
    stay: &IcuStay,
    config: &SuspicionConfig,
) -> Option<SuspicionEvent> {
    suspicion_events(store, stay.subject_id, config)
        .into_iter()
        .find(|event| event.belongs_to(stay, config.stay_lookback()))
}
