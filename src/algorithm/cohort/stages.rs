//! Cohort stages
//!
//! The stages run in a fixed order, each one consuming the survivors of the
//! previous. Row-wise stages are expressed as [`FilterCriteria`]; the
//! first-stay stage works on the whole set.

use chrono::Duration;
use itertools::Itertools;

use super::candidate::Candidate;

/// Defines a criterion for filtering entities
pub trait FilterCriteria<T> {
    /// Determine if an entity meets the filter criteria
    fn meets_criteria(&self, entity: &T) -> bool;
}

/// A per-stay filter
#[derive(Debug, Clone)]
pub enum StayFilter {
    /// Sepsis-3 or SIRS inclusion
    Diagnosis,
    /// No pregnancy code for the subject
    NotPregnant,
    /// ICU duration of at least this long; stays without discharge time fail
    MinDuration(Duration),
    /// ICU duration of at most this long; stays without discharge time fail
    MaxDuration(Duration),
    /// Combined filter that requires all criteria to be met
    All(Vec<StayFilter>),
}

impl FilterCriteria<Candidate> for StayFilter {
    fn meets_criteria(&self, candidate: &Candidate) -> bool {
        match self {
            Self::Diagnosis => candidate.inclusion().is_some(),
            Self::NotPregnant => !candidate.pregnancy,
            Self::MinDuration(min) => candidate
                .stay
                .duration()
                .is_some_and(|duration| duration >= *min),
            Self::MaxDuration(max) => candidate
                .stay
                .duration()
                .is_some_and(|duration| duration <= *max),
            Self::All(filters) => filters.iter().all(|f| f.meets_criteria(candidate)),
        }
    }
}

/// One step of the cohort pipeline
#[derive(Debug, Clone)]
pub enum CohortStage {
    Diagnosis,
    FirstStay,
    Pregnancy,
    MinDuration(Duration),
    MaxDuration(Duration),
}

impl CohortStage {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Diagnosis => "diagnosis",
            Self::FirstStay => "first_stay",
            Self::Pregnancy => "pregnancy_exclusion",
            Self::MinDuration(_) => "min_icu_duration",
            Self::MaxDuration(_) => "max_icu_duration",
        }
    }

    /// Keep the candidates that pass this stage, preserving their order
    #[must_use]
    pub fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let filter = match self {
            Self::FirstStay => return first_stay_per_subject(candidates),
            Self::Diagnosis => StayFilter::Diagnosis,
            Self::Pregnancy => StayFilter::NotPregnant,
            Self::MinDuration(min) => StayFilter::MinDuration(*min),
            Self::MaxDuration(max) => StayFilter::MaxDuration(*max),
        };
        candidates
            .into_iter()
            .filter(|candidate| filter.meets_criteria(candidate))
            .collect()
    }
}

/// Per subject, the stay with the earliest ICU admission (lowest stay id on ties)
#[must_use]
pub fn first_stay_per_subject(candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .sorted_by_key(|c| (c.stay.subject_id, c.stay.intime, c.stay.stay_id))
        .dedup_by(|a, b| a.stay.subject_id == b.stay.subject_id)
        .collect()
}
