//! End-to-end runs over in-memory stores

use arrow::array::{Array, BooleanArray, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::Duration;
use rustc_hash::FxHashMap;
use sepsis_cohort::algorithm::StayContext;
use sepsis_cohort::algorithm::assembly::CohortAssembler;
use sepsis_cohort::algorithm::cohort::Candidate;
use sepsis_cohort::codes::{Concept, ItemCodeMap};
use sepsis_cohort::config::SuspicionConfig;
use sepsis_cohort::models::IcdVersion;
use sepsis_cohort::store::EventSource;
use sepsis_cohort::{
    CohortAudit, CohortPipeline, EventStore, cohort_schema, read_parquet, write_cohort,
};

use crate::utils::{StoreFixture, at, test_config};

fn mixed_store() -> EventStore {
    let t0 = at(10, 8, 0);
    let mut fixture = StoreFixture::new();
    fixture
        .subject_with_stay(1, 10, t0, Duration::hours(48))
        .chart(10, t0 + Duration::hours(2), Concept::HeartRate, 140.0)
        .chart(10, t0 + Duration::hours(2), Concept::RespRate, 24.0)
        .chart(10, t0 + Duration::hours(2), Concept::MeanBp, 75.0)
        .subject_with_stay(2, 20, t0, Duration::hours(30))
        .diagnosis(2, 200, "99591", IcdVersion::Icd9)
        .subject_with_stay(3, 30, t0, Duration::hours(30))
        .sirs_positive(3, 30, t0)
        .diagnosis(3, 300, "O80", IcdVersion::Icd10)
        .subject_with_stay(4, 40, t0, Duration::hours(30));
    fixture.build()
}

#[test]
fn test_pipeline_builds_cohort_rows() {
    let store = mixed_store();
    let output = CohortPipeline::new(test_config()).run(&store).unwrap();

    let stays: Vec<i64> = output.rows.iter().map(|row| row.stay_id).collect();
    assert_eq!(stays, vec![10, 20]);

    let first = &output.rows[0];
    assert_eq!(first.heart_rate_mean, Some(140.0));
    assert_eq!(first.sirs, Some(2));
    assert_eq!(first.sofa, Some(0));
    assert_eq!(first.inclusion.as_deref(), Some("sirs_score"));
    assert_eq!(first.age, Some(60));
    assert_eq!(first.icu_los_hours, Some(48.0));
    assert!(first.oasis.is_some());
    assert!(!first.hospital_death);

    let second = &output.rows[1];
    assert_eq!(second.inclusion.as_deref(), Some("sirs_diagnosis"));
    assert_eq!(second.heart_rate_mean, None);
    assert_eq!(second.sirs, None);

    assert_eq!(output.audit.initial_stays, 4);
    assert_eq!(output.audit.survivors_of("diagnosis"), Some(3));
    assert_eq!(output.audit.final_stays(), 2);
}

#[test]
fn test_results_do_not_depend_on_thread_count() {
    let store = mixed_store();
    let mut single = test_config();
    single.threads = Some(1);
    let mut many = test_config();
    many.threads = Some(4);

    let a = CohortPipeline::new(single).run(&store).unwrap();
    let b = CohortPipeline::new(many).run(&store).unwrap();
    assert_eq!(a.rows, b.rows);
}

#[test]
fn test_record_batch_matches_schema() {
    let store = mixed_store();
    let output = CohortPipeline::new(test_config()).run(&store).unwrap();
    let batch = output.to_record_batch().unwrap();

    let schema = cohort_schema();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), schema.fields().len());
    assert_eq!(batch.schema().field(0).name(), "subject_id");

    let stay_ids = batch
        .column_by_name("stay_id")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(stay_ids.values().to_vec(), vec![10, 20]);

    let inclusion = batch
        .column_by_name("inclusion")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(inclusion.value(1), "sirs_diagnosis");

    let sirs = batch.column_by_name("sirs").unwrap();
    assert!(sirs.is_null(1));
}

#[test]
fn test_write_cohort_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config().with_output_dir(dir.path());
    config.output.show_progress = false;

    let store = mixed_store();
    let output = CohortPipeline::new(config.clone()).run(&store).unwrap();
    let written = write_cohort(&output, &config.output).unwrap();
    assert_eq!(written.len(), 3);
    assert!(written.iter().all(|path| path.exists()));

    let csv = std::fs::read_to_string(dir.path().join("cohort.csv")).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("subject_id,hadm_id,stay_id,intime"));
    assert_eq!(lines.count(), 2);

    let audit: CohortAudit = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("cohort_audit.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(audit.final_stays(), 2);
    assert_eq!(audit.stages.len(), 5);
}

#[test]
fn test_empty_store_gives_empty_cohort() {
    let store = StoreFixture::new().build();
    let output = CohortPipeline::new(test_config()).run(&store).unwrap();
    assert!(output.rows.is_empty());
    assert_eq!(output.audit.final_stays(), 0);
    assert_eq!(output.to_record_batch().unwrap().num_rows(), 0);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = test_config();
    config.observation_hours = 0;
    let store = mixed_store();
    assert!(CohortPipeline::new(config).run(&store).is_err());
}

fn bool_column(batch: &RecordBatch, name: &str) -> Vec<bool> {
    let column = batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<BooleanArray>()
        .unwrap();
    (0..column.len()).map(|idx| column.value(idx)).collect()
}

#[test]
fn test_outcome_flags_in_written_output() {
    let t0 = at(10, 8, 0);
    let mut fixture = StoreFixture::new();
    fixture
        // Dies in hospital 30h after ICU admission
        .subject_with_stay(1, 10, t0, Duration::hours(48))
        .sirs_positive(1, 10, t0)
        .died_in_hospital(1, 10, t0, t0 + Duration::hours(30))
        // Date of death after discharge and beyond 90 days
        .subject_with_stay(2, 20, t0, Duration::hours(48))
        .sirs_positive(2, 20, t0)
        .date_of_death(2, t0 + Duration::days(100))
        // Date of death on day 90, evaluated at midnight
        .subject_with_stay(3, 30, t0, Duration::hours(48))
        .sirs_positive(3, 30, t0)
        .date_of_death(3, t0 + Duration::days(90) + Duration::hours(12))
        // Survivor
        .subject_with_stay(4, 40, t0, Duration::hours(48))
        .sirs_positive(4, 40, t0);
    let store = fixture.build();

    let dir = tempfile::tempdir().unwrap();
    let config = test_config().with_output_dir(dir.path());
    let output = CohortPipeline::new(config.clone()).run(&store).unwrap();
    write_cohort(&output, &config.output).unwrap();

    let batches = read_parquet(&dir.path().join("cohort.parquet"), None).unwrap();
    let batch = arrow::compute::concat_batches(&batches[0].schema(), &batches).unwrap();
    let stay_ids = batch
        .column_by_name("stay_id")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(stay_ids.values().to_vec(), vec![10, 20, 30, 40]);

    assert_eq!(bool_column(&batch, "death_48h"), vec![true, false, false, false]);
    assert_eq!(bool_column(&batch, "death_90d"), vec![true, false, true, false]);
    assert_eq!(bool_column(&batch, "hospital_death"), vec![true, false, false, false]);
}

#[test]
fn test_assembler_keeps_one_row_per_stay() {
    let store = mixed_store();
    let codes = ItemCodeMap::latest();
    let suspicion = SuspicionConfig::default();
    let stay = &store.stays()[0];
    let ctx = StayContext::new(&store, &codes, stay, Duration::hours(24));
    let candidate = Candidate::assess(&ctx, &suspicion);

    let cohort = vec![candidate.clone(), candidate];
    let rows = CohortAssembler::new(&store).assemble(&cohort, &FxHashMap::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stay_id, stay.stay_id);
    // Missing components leave nulls rather than dropping the row
    assert_eq!(rows[0].oasis, None);
    assert_eq!(rows[0].heart_rate_mean, None);
}
