//! Cohort invariants over seeded synthetic populations

use rustc_hash::FxHashSet;
use sepsis_cohort::algorithm::StayContext;
use sepsis_cohort::algorithm::cohort::Candidate;
use sepsis_cohort::codes::{IcdCodeSet, ItemCodeMap};
use sepsis_cohort::store::EventSource;
use sepsis_cohort::{CohortPipeline, generate_store};

use crate::utils::test_config;

#[test]
fn test_cohort_invariants_hold() {
    for seed in [1, 7, 42] {
        let store = generate_store(150, seed);
        let output = CohortPipeline::new(test_config()).run(&store).unwrap();
        assert!(!output.rows.is_empty(), "seed {seed} produced an empty cohort");

        let mut subjects = FxHashSet::default();
        for row in &output.rows {
            assert!(subjects.insert(row.subject_id), "subject {} appears twice", row.subject_id);

            let los = row.icu_los_hours.unwrap();
            assert!((24.0..=2400.0).contains(&los), "stay {} has LOS {los}", row.stay_id);

            assert!(
                !IcdCodeSet::pregnancy().any(store.diagnoses(row.subject_id)),
                "subject {} has a pregnancy code",
                row.subject_id
            );

            assert!(row.sirs.is_none_or(|sirs| sirs <= 4));
            assert!(row.sofa.is_none_or(|sofa| sofa <= 5));
            assert!(row.inclusion.is_some());
            assert!(row.oasis_prob.is_none_or(|p| (0.0..=1.0).contains(&p)));
        }

        let ordered = output
            .rows
            .windows(2)
            .all(|pair| (pair[0].subject_id, pair[0].stay_id) < (pair[1].subject_id, pair[1].stay_id));
        assert!(ordered);
    }
}

#[test]
fn test_kept_stay_is_the_first_eligible_one() {
    let store = generate_store(200, 3);
    let config = test_config();
    let output = CohortPipeline::new(config.clone()).run(&store).unwrap();
    let codes = ItemCodeMap::for_revision(config.code_revision);

    for row in &output.rows {
        let first_eligible = store
            .stays()
            .iter()
            .filter(|stay| stay.subject_id == row.subject_id)
            .find(|stay| {
                let ctx = StayContext::new(&store, &codes, stay, config.observation_window());
                Candidate::assess(&ctx, &config.suspicion).inclusion().is_some()
            })
            .unwrap();
        assert_eq!(first_eligible.stay_id, row.stay_id);
    }
}

#[test]
fn test_runs_are_reproducible() {
    let first = CohortPipeline::new(test_config())
        .run(&generate_store(80, 11))
        .unwrap();
    let second = CohortPipeline::new(test_config())
        .run(&generate_store(80, 11))
        .unwrap();
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.audit, second.audit);
}
