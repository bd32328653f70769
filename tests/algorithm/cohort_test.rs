//! Inclusion paths and cohort stages

use chrono::Duration;
use sepsis_cohort::algorithm::StayContext;
use sepsis_cohort::algorithm::cohort::{
    Candidate, CohortFilter, FilterCriteria, Inclusion, StayFilter,
};
use sepsis_cohort::codes::{Concept, ItemCodeMap};
use sepsis_cohort::config::SuspicionConfig;
use sepsis_cohort::models::IcdVersion;
use sepsis_cohort::store::{EventSource, EventStore, TimeWindow};

use crate::utils::{StoreFixture, at, test_config};

fn candidates(store: &EventStore) -> Vec<Candidate> {
    let codes = ItemCodeMap::latest();
    let config = SuspicionConfig::default();
    store
        .stays()
        .iter()
        .map(|stay| {
            let ctx = StayContext::new(store, &codes, stay, Duration::hours(24));
            Candidate::assess(&ctx, &config)
        })
        .collect()
}

#[test]
fn test_sepsis3_inclusion_from_suspicion() {
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, at(5, 12, 0), Duration::hours(60))
        // Culture before the antibiotic dates the suspicion at the culture
        .culture(1, 100, at(5, 6, 0))
        .antibiotic(1, 100, at(5, 14, 0), "Vancomycin")
        .lab(1, at(5, 9, 0), Concept::Creatinine, 2.4)
        .lab(1, at(5, 9, 0), Concept::Platelets, 80.0);
    let store = fixture.build();

    let candidate = &candidates(&store)[0];
    let suspicion = candidate.suspicion.as_ref().unwrap();
    assert_eq!(suspicion.suspected_infection_time, at(5, 6, 0));
    assert_eq!(suspicion.culture_time, at(5, 6, 0));
    assert_eq!(candidate.sofa_at_suspicion.and_then(|sofa| sofa.total()), Some(2));
    // The labs precede ICU admission, so the observation-window SOFA has no data
    assert_eq!(candidate.sofa.total(), None);
    assert_eq!(candidate.inclusion(), Some(Inclusion::Sepsis3));
}

#[test]
fn test_earliest_suspicion_event_decides_sepsis3() {
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, at(5, 12, 0), Duration::hours(72))
        .culture(1, 100, at(5, 8, 0))
        .antibiotic(1, 100, at(5, 14, 0), "Vancomycin")
        .antibiotic(1, 100, at(5, 10, 0), "Cefepime")
        // Later event, paired with a culture after the antibiotic
        .culture(1, 100, at(7, 13, 0))
        .antibiotic(1, 100, at(7, 12, 0), "Ceftriaxone")
        // Only inside the SOFA window of the earliest event
        .lab(1, at(5, 9, 0), Concept::Creatinine, 2.4)
        .lab(1, at(5, 9, 0), Concept::Platelets, 80.0);
    let store = fixture.build();

    let candidate = &candidates(&store)[0];
    let suspicion = candidate.suspicion.as_ref().unwrap();
    // Both early antibiotics date the suspicion at the same culture; the earlier antibiotic wins
    assert_eq!(suspicion.suspected_infection_time, at(5, 8, 0));
    assert_eq!(suspicion.antibiotic_time, at(5, 10, 0));
    assert_eq!(suspicion.antibiotic, "Cefepime");
    assert_eq!(suspicion.culture_time, at(5, 8, 0));
    assert_eq!(
        suspicion.sofa_window,
        TimeWindow::new(at(3, 8, 0), at(6, 8, 0))
    );

    assert_eq!(candidate.sofa_at_suspicion.and_then(|sofa| sofa.total()), Some(2));
    assert_eq!(candidate.sofa.total(), None);
    assert_eq!(candidate.inclusion(), Some(Inclusion::Sepsis3));
}

#[test]
fn test_culture_after_antibiotic_dates_suspicion_at_antibiotic() {
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, at(5, 12, 0), Duration::hours(60))
        .antibiotic(1, 100, at(5, 14, 0), "Piperacillin-Tazobactam")
        .culture(1, 100, at(6, 10, 0));
    let store = fixture.build();

    let suspicion = candidates(&store)[0].suspicion.clone().unwrap();
    assert_eq!(suspicion.suspected_infection_time, at(5, 14, 0));
    assert_eq!(suspicion.culture_time, at(6, 10, 0));
}

#[test]
fn test_topical_antibiotic_is_not_suspicion() {
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, at(5, 12, 0), Duration::hours(60))
        .antibiotic(1, 100, at(5, 14, 0), "Erythromycin 0.5% Ophth Oint")
        .culture(1, 100, at(5, 13, 0));
    let store = fixture.build();

    assert!(candidates(&store)[0].suspicion.is_none());
}

#[test]
fn test_sirs_diagnosis_and_score_paths() {
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, at(5, 12, 0), Duration::hours(60))
        .diagnosis(1, 100, "R65.20", IcdVersion::Icd10)
        .subject_with_stay(2, 20, at(5, 12, 0), Duration::hours(60))
        .sirs_positive(2, 20, at(5, 12, 0))
        .subject_with_stay(3, 30, at(5, 12, 0), Duration::hours(60))
        .chart(30, at(5, 13, 0), Concept::HeartRate, 80.0);
    let store = fixture.build();

    let inclusions: Vec<Option<Inclusion>> =
        candidates(&store).iter().map(Candidate::inclusion).collect();
    assert_eq!(
        inclusions,
        vec![Some(Inclusion::SirsDiagnosis), Some(Inclusion::SirsScore), None]
    );
    assert_eq!(Inclusion::SirsScore.as_str(), "sirs_score");
}

#[test]
fn test_sirs_score_path_requires_low_sofa() {
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, at(5, 12, 0), Duration::hours(60))
        .sirs_positive(1, 10, at(5, 12, 0))
        .lab(1, at(5, 14, 0), Concept::Creatinine, 3.0)
        .lab(1, at(5, 14, 0), Concept::Platelets, 60.0);
    let store = fixture.build();

    let candidate = &candidates(&store)[0];
    assert_eq!(candidate.sirs.total(), Some(2));
    assert_eq!(candidate.sofa.total(), Some(2));
    assert_eq!(candidate.inclusion(), None);
}

#[test]
fn test_stage_order_and_audit() {
    let mut fixture = StoreFixture::new();
    let t0 = at(5, 12, 0);
    fixture
        // Two eligible stays, the earlier one survives
        .subject_with_stay(1, 10, t0, Duration::hours(30))
        .sirs_positive(1, 10, t0)
        .stay(1, 100, 11, t0 + Duration::days(3), Duration::hours(30))
        .sirs_positive(1, 11, t0 + Duration::days(3))
        // Pregnancy code on any admission excludes the subject
        .subject_with_stay(2, 20, t0, Duration::hours(30))
        .sirs_positive(2, 20, t0)
        .diagnosis(2, 999, "V22.2", IcdVersion::Icd9)
        // Too short
        .subject_with_stay(3, 30, t0, Duration::hours(24) - Duration::minutes(1))
        .sirs_positive(3, 30, t0)
        // Exactly the minimum
        .subject_with_stay(4, 40, t0, Duration::hours(24))
        .sirs_positive(4, 40, t0)
        // Too long
        .subject_with_stay(5, 50, t0, Duration::hours(2401))
        .sirs_positive(5, 50, t0)
        // Not septic
        .subject_with_stay(6, 60, t0, Duration::hours(30));
    let store = fixture.build();

    let (cohort, audit) = CohortFilter::new(&test_config()).run(candidates(&store));
    let stays: Vec<i64> = cohort.iter().map(|c| c.stay.stay_id).collect();
    assert_eq!(stays, vec![10, 40]);

    assert_eq!(audit.initial_stays, 7);
    assert_eq!(audit.survivors_of("diagnosis"), Some(6));
    assert_eq!(audit.survivors_of("first_stay"), Some(5));
    assert_eq!(audit.survivors_of("pregnancy_exclusion"), Some(4));
    assert_eq!(audit.survivors_of("min_icu_duration"), Some(3));
    assert_eq!(audit.survivors_of("max_icu_duration"), Some(2));
    assert_eq!(audit.final_stays(), 2);
    assert!(audit.summary().contains("first_stay"));
}

#[test]
fn test_combined_stay_filter() {
    let mut fixture = StoreFixture::new();
    let t0 = at(5, 12, 0);
    fixture
        .subject_with_stay(1, 10, t0, Duration::hours(48))
        .sirs_positive(1, 10, t0)
        .subject_with_stay(2, 20, t0, Duration::hours(12))
        .sirs_positive(2, 20, t0);
    let store = fixture.build();

    let filter = StayFilter::All(vec![
        StayFilter::Diagnosis,
        StayFilter::NotPregnant,
        StayFilter::MinDuration(Duration::hours(24)),
    ]);
    let kept: Vec<i64> = candidates(&store)
        .iter()
        .filter(|candidate| filter.meets_criteria(candidate))
        .map(|candidate| candidate.stay.stay_id)
        .collect();
    assert_eq!(kept, vec![10]);
}
