//! Feature aggregation over the observation window

use chrono::Duration;
use sepsis_cohort::algorithm::StayContext;
use sepsis_cohort::algorithm::features::StayFeatures;
use sepsis_cohort::codes::{Concept, ItemCodeMap};
use sepsis_cohort::store::{EventSource, EventStore};

use crate::utils::{StoreFixture, at};

const SUBJECT: i64 = 7;
const STAY: i64 = 700;

fn features_of(store: &EventStore) -> StayFeatures {
    let codes = ItemCodeMap::latest();
    let ctx = StayContext::new(store, &codes, &store.stays()[0], Duration::hours(24));
    StayFeatures::collect(&ctx)
}

fn fixture() -> StoreFixture {
    let mut fixture = StoreFixture::new();
    fixture.subject_with_stay(SUBJECT, STAY, at(3, 18, 0), Duration::hours(96));
    fixture
}

#[test]
fn test_pf_ratio_missing_when_fio2_is_zero() {
    let mut fixture = fixture();
    fixture
        .lab(SUBJECT, at(3, 20, 0), Concept::Pao2, 90.0)
        .chart(STAY, at(3, 20, 0), Concept::FiO2, 0.0);
    let features = features_of(&fixture.build());

    assert_eq!(features.labs.mean(Concept::Pao2), Some(90.0));
    assert_eq!(features.fio2_mean, None);
    assert_eq!(features.pf_ratio, None);
}

#[test]
fn test_pf_ratio_uses_window_averages() {
    let mut fixture = fixture();
    fixture
        .lab(SUBJECT, at(3, 20, 0), Concept::Pao2, 70.0)
        .lab(SUBJECT, at(4, 2, 0), Concept::Pao2, 90.0)
        .chart(STAY, at(3, 20, 0), Concept::FiO2, 0.4)
        .chart(STAY, at(4, 2, 0), Concept::FiO2, 40.0);
    let features = features_of(&fixture.build());

    assert_eq!(features.fio2_mean, Some(40.0));
    assert_eq!(features.pf_ratio, Some(2.0));
}

#[test]
fn test_neutrophil_lymphocyte_ratio() {
    let mut fixture = fixture();
    fixture
        .lab(SUBJECT, at(3, 21, 0), Concept::Neutrophils, 85.0)
        .lab(SUBJECT, at(3, 21, 0), Concept::Lymphocytes, 5.0);
    let features = features_of(&fixture.build());

    assert_eq!(features.nlr, Some(17.0));
    assert_eq!(features.labs.len(), 2);
}

#[test]
fn test_gcs_requires_all_components_at_one_time() {
    let mut fixture = fixture();
    fixture
        .chart(STAY, at(3, 19, 0), Concept::GcsEye, 3.0)
        .chart(STAY, at(3, 19, 0), Concept::GcsVerbal, 4.0)
        .chart(STAY, at(3, 19, 0), Concept::GcsMotor, 6.0)
        .chart(STAY, at(3, 23, 0), Concept::GcsEye, 1.0)
        .chart(STAY, at(3, 23, 0), Concept::GcsMotor, 1.0);
    let features = features_of(&fixture.build());

    assert_eq!(features.vitals.gcs_min, Some(13.0));
}

#[test]
fn test_urine_output_net_of_irrigant() {
    let mut fixture = fixture();
    fixture
        .output(STAY, at(3, 22, 0), Concept::UrineOutput, 900.0)
        .output(STAY, at(4, 4, 0), Concept::UrineOutput, 600.0)
        .output(STAY, at(4, 4, 0), Concept::GuIrrigantIn, 500.0)
        .output(STAY, at(5, 4, 0), Concept::UrineOutput, 5000.0);
    let features = features_of(&fixture.build());

    assert_eq!(features.urine_output, Some(1000.0));
}

#[test]
fn test_vasopressor_norepinephrine_equivalent() {
    let mut fixture = fixture();
    fixture
        .infusion(STAY, at(3, 10, 0), at(3, 19, 0), Concept::Norepinephrine, 0.1, "mcg/kg/min")
        .infusion(STAY, at(4, 1, 0), at(4, 5, 0), Concept::Dopamine, 10.0, "mcg/kg/min")
        .infusion(STAY, at(5, 1, 0), at(5, 5, 0), Concept::Epinephrine, 1.0, "mcg/kg/min");
    let features = features_of(&fixture.build());

    assert!(features.vasopressors.vasopressor);
    let dose = features.vasopressors.norepinephrine_equivalent_max.unwrap();
    assert!((dose - 0.1).abs() < 1e-9);
}

#[test]
fn test_no_vasopressor_without_infusions() {
    let features = features_of(&fixture().build());
    assert!(!features.vasopressors.vasopressor);
    assert_eq!(features.vasopressors.norepinephrine_equivalent_max, None);
    assert!(!features.procedures.renal_replacement_therapy);
}

#[test]
fn test_height_weight_and_bmi() {
    let mut fixture = fixture();
    fixture
        .chart(STAY, at(3, 19, 0), Concept::WeightKg, 80.0)
        // Next calendar day, outside the weight window
        .chart(STAY, at(4, 0, 0), Concept::WeightKg, 160.0)
        .chart(STAY, at(4, 1, 0), Concept::WeightKg, 120.0)
        .chart(STAY, at(5, 9, 0), Concept::HeightCm, 200.0)
        .chart(STAY, at(5, 9, 0), Concept::HeightIn, 70.0);
    let features = features_of(&fixture.build());

    let body = features.anthropometry;
    assert_eq!(body.weight_kg, Some(80.0));
    assert_eq!(body.height_cm, Some(200.0));
    let bmi = body.bmi.unwrap();
    assert!((bmi - 20.0).abs() < 1e-9);
}
