//! Score calculators evaluated against in-memory stores

use chrono::Duration;
use sepsis_cohort::algorithm::StayContext;
use sepsis_cohort::algorithm::assembly::StayComponents;
use sepsis_cohort::algorithm::scores::oasis::age_score;
use sepsis_cohort::algorithm::scores::{SirsScore, SofaScore};
use sepsis_cohort::codes::{Concept, ItemCodeMap};
use sepsis_cohort::store::EventSource;

use crate::utils::{StoreFixture, at};

const SUBJECT: i64 = 1;
const STAY: i64 = 100;

fn single_stay() -> StoreFixture {
    let mut fixture = StoreFixture::new();
    fixture.subject_with_stay(SUBJECT, STAY, at(1, 8, 0), Duration::hours(72));
    fixture
}

#[test]
fn test_heart_rate_reading_sets_sirs_component() {
    let mut fixture = single_stay();
    fixture.chart(STAY, at(1, 10, 0), Concept::HeartRate, 140.0);
    let store = fixture.build();
    let codes = ItemCodeMap::latest();
    let stay = &store.stays()[0];
    let ctx = StayContext::new(&store, &codes, stay, Duration::hours(24));

    let sirs = SirsScore::calculate(&ctx);
    assert_eq!(sirs.heart_rate, Some(1));
    assert_eq!(sirs.temperature, None);
    assert_eq!(sirs.total(), Some(1));

    let components = StayComponents::collect(&ctx);
    assert_eq!(
        components.features.vitals.heart_rate.map(|summary| summary.mean),
        Some(140.0)
    );
    assert_eq!(components.oasis.heart_rate, Some(6));
}

#[test]
fn test_readings_outside_window_are_ignored() {
    let mut fixture = single_stay();
    fixture
        .chart(STAY, at(1, 7, 59), Concept::HeartRate, 150.0)
        .chart(STAY, at(2, 8, 1), Concept::HeartRate, 150.0)
        .chart(STAY, at(2, 8, 0), Concept::RespRate, 30.0);
    let store = fixture.build();
    let codes = ItemCodeMap::latest();
    let ctx = StayContext::new(&store, &codes, &store.stays()[0], Duration::hours(24));

    let sirs = SirsScore::calculate(&ctx);
    assert_eq!(sirs.heart_rate, None);
    // The window end is inclusive
    assert_eq!(sirs.respiration, Some(1));
}

#[test]
fn test_fahrenheit_temperature_is_converted() {
    let mut fixture = single_stay();
    fixture
        .chart(STAY, at(1, 9, 0), Concept::TemperatureF, 101.3)
        .chart(STAY, at(1, 12, 0), Concept::TemperatureC, 37.0);
    let store = fixture.build();
    let codes = ItemCodeMap::latest();
    let ctx = StayContext::new(&store, &codes, &store.stays()[0], Duration::hours(24));

    assert_eq!(SirsScore::calculate(&ctx).temperature, Some(1));
}

#[test]
fn test_sofa_counts_dysfunctional_organs() {
    let mut fixture = single_stay();
    fixture
        .lab(SUBJECT, at(1, 9, 0), Concept::Creatinine, 2.1)
        .lab(SUBJECT, at(1, 9, 0), Concept::Platelets, 90.0)
        .lab(SUBJECT, at(1, 9, 0), Concept::Bilirubin, 0.6)
        .chart(STAY, at(1, 9, 0), Concept::MeanBp, 85.0);
    let store = fixture.build();
    let codes = ItemCodeMap::latest();
    let ctx = StayContext::new(&store, &codes, &store.stays()[0], Duration::hours(24));

    let sofa = SofaScore::calculate(&ctx);
    assert_eq!(sofa.renal, Some(1));
    assert_eq!(sofa.coagulation, Some(1));
    assert_eq!(sofa.liver, Some(0));
    assert_eq!(sofa.cardiovascular, Some(0));
    assert_eq!(sofa.respiration, None);
    assert_eq!(sofa.total(), Some(2));
}

#[test]
fn test_oasis_age_boundary() {
    assert_eq!(age_score(53), 3);
    assert_eq!(age_score(54), 6);

    for (age, expected) in [(53, 3), (54, 6)] {
        let mut fixture = StoreFixture::new();
        fixture
            .patient(SUBJECT, "F", age)
            .admission(SUBJECT, 1000, at(1, 2, 0), "EW EMER.")
            .stay(SUBJECT, 1000, STAY, at(1, 8, 0), Duration::hours(48));
        let store = fixture.build();
        let codes = ItemCodeMap::latest();
        let ctx = StayContext::new(&store, &codes, &store.stays()[0], Duration::hours(24));

        let oasis = StayComponents::collect(&ctx).oasis;
        assert_eq!(oasis.age, Some(expected));
        // Six hours between hospital and ICU admission
        assert_eq!(oasis.preiculos, Some(0));
        assert_eq!(oasis.electivesurgery, Some(6));
        assert_eq!(oasis.mechvent, Some(0));
    }
}

#[test]
fn test_oasis_ventilation_and_urine() {
    let mut fixture = single_stay();
    fixture
        .procedure(STAY, at(1, 2, 0), at(1, 12, 0), Concept::InvasiveVentilation)
        .output(STAY, at(1, 14, 0), Concept::UrineOutput, 400.0)
        .output(STAY, at(1, 20, 0), Concept::UrineOutput, 200.0);
    let store = fixture.build();
    let codes = ItemCodeMap::latest();
    let ctx = StayContext::new(&store, &codes, &store.stays()[0], Duration::hours(24));

    let components = StayComponents::collect(&ctx);
    assert!(components.features.procedures.mechanical_ventilation);
    assert_eq!(components.features.urine_output, Some(600.0));
    assert_eq!(components.oasis.mechvent, Some(9));
    assert_eq!(components.oasis.urine_output, Some(10));
}
