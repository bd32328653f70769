//! Loading the event store from Parquet tables on disk

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use sepsis_cohort::store::{EventSource, EventStore, LoadOptions};
use sepsis_cohort::{CohortError, CohortPipeline};

use crate::utils::{at, test_config};

fn micros(time: NaiveDateTime) -> Option<i64> {
    Some(time.and_utc().timestamp_micros())
}

fn ints(values: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(values.to_vec()))
}

fn floats(values: &[f64]) -> ArrayRef {
    Arc::new(Float64Array::from(values.to_vec()))
}

fn texts(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn times(values: &[NaiveDateTime]) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from(
        values.iter().map(|time| micros(*time)).collect::<Vec<_>>(),
    ))
}

fn write_batch(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    let batch = RecordBatch::try_from_iter(columns).unwrap();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Two subjects: subject 1 meets the SIRS criteria, subject 2 does not
fn write_tables(dir: &Path) {
    let t0 = at(2, 6, 0);
    write_batch(
        &dir.join("patients.parquet"),
        vec![
            ("subject_id", ints(&[1, 2])),
            ("gender", texts(&["F", "M"])),
            ("anchor_age", ints(&[70, 45])),
            ("anchor_year", ints(&[2150, 2150])),
        ],
    );
    write_batch(
        &dir.join("admissions.parquet"),
        vec![
            ("subject_id", ints(&[1, 2])),
            ("hadm_id", ints(&[11, 21])),
            ("admittime", times(&[t0 - Duration::hours(3), t0])),
            ("dischtime", times(&[t0 + Duration::days(6), t0 + Duration::days(4)])),
            ("admission_type", texts(&["URGENT", "ELECTIVE"])),
            ("race", texts(&["BLACK/AFRICAN AMERICAN", "WHITE"])),
        ],
    );
    write_batch(
        &dir.join("icustays.parquet"),
        vec![
            ("subject_id", ints(&[1, 2])),
            ("hadm_id", ints(&[11, 21])),
            ("stay_id", ints(&[111, 211])),
            ("first_careunit", texts(&["Medical Intensive Care Unit (MICU)", "Coronary Care Unit (CCU)"])),
            ("intime", times(&[t0, t0])),
            ("outtime", times(&[t0 + Duration::hours(50), t0 + Duration::hours(40)])),
        ],
    );

    // Chart events split over a directory of parts
    let chart_dir = dir.join("chartevents");
    std::fs::create_dir(&chart_dir).unwrap();
    write_batch(
        &chart_dir.join("part-0.parquet"),
        vec![
            ("subject_id", ints(&[1, 1, 1])),
            ("stay_id", ints(&[111, 111, 111])),
            ("charttime", times(&[t0 + Duration::hours(1); 3])),
            ("itemid", ints(&[220045, 220210, 220052])),
            ("valuenum", floats(&[118.0, 27.0, 82.0])),
        ],
    );
    write_batch(
        &chart_dir.join("part-1.parquet"),
        vec![
            ("subject_id", ints(&[2, 2])),
            ("stay_id", ints(&[211, 211])),
            ("charttime", times(&[t0 + Duration::hours(1); 2])),
            ("itemid", ints(&[220045, 220052])),
            ("valuenum", floats(&[72.0, 85.0])),
        ],
    );

    write_batch(
        &dir.join("labevents.parquet"),
        vec![
            ("subject_id", ints(&[1, 2])),
            ("hadm_id", ints(&[11, 21])),
            ("charttime", times(&[t0 + Duration::hours(2); 2])),
            ("itemid", ints(&[50912, 50912])),
            ("valuenum", floats(&[0.8, 0.9])),
        ],
    );
    write_batch(
        &dir.join("diagnoses_icd.parquet"),
        vec![
            ("subject_id", ints(&[1, 2, 2])),
            ("hadm_id", ints(&[11, 21, 21])),
            ("seq_num", ints(&[1, 1, 2])),
            ("icd_code", texts(&["J189", "I214", "XXXX"])),
            ("icd_version", ints(&[10, 10, 11])),
        ],
    );
}

#[test]
fn test_load_store_from_parquet() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());

    let store = EventStore::load(dir.path(), &LoadOptions::default()).unwrap();
    let summary = store.summary();
    assert_eq!(summary.patients, 2);
    assert_eq!(summary.admissions, 2);
    assert_eq!(summary.stays, 2);
    assert_eq!(summary.chart_events, 5);
    assert_eq!(summary.lab_events, 2);
    // Unknown ICD version is skipped
    assert_eq!(summary.diagnoses, 2);
    // Optional tables are absent
    assert_eq!(summary.prescriptions, 0);

    let stay = store.stay(111).unwrap();
    assert_eq!(stay.intime, at(2, 6, 0));
    assert_eq!(stay.los_hours(), Some(50.0));
    assert_eq!(store.patient(1).and_then(|p| p.gender.as_deref()), Some("F"));
}

#[test]
fn test_pipeline_over_parquet_tables() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());
    let store = EventStore::load(dir.path(), &LoadOptions::default()).unwrap();

    let output = CohortPipeline::new(test_config()).run(&store).unwrap();
    assert_eq!(output.rows.len(), 1);
    let row = &output.rows[0];
    assert_eq!(row.stay_id, 111);
    assert_eq!(row.inclusion.as_deref(), Some("sirs_score"));
    assert_eq!(row.heart_rate_mean, Some(118.0));
    assert_eq!(row.creatinine_mean, Some(0.8));
    assert_eq!(row.age, Some(70));
}

#[test]
fn test_subject_filter_limits_loading() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());

    let store = EventStore::load(dir.path(), &LoadOptions::with_subjects([2])).unwrap();
    assert_eq!(store.summary().stays, 1);
    assert_eq!(store.stays()[0].stay_id, 211);
    assert_eq!(store.summary().chart_events, 2);
}

#[test]
fn test_missing_required_table_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());
    std::fs::remove_file(dir.path().join("labevents.parquet")).unwrap();

    let err = EventStore::load(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, CohortError::TableNotFound { ref table, .. } if table == "labevents"));
}

#[test]
fn test_missing_required_column_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());
    write_batch(
        &dir.path().join("patients.parquet"),
        vec![("gender", texts(&["F"]))],
    );

    let err = EventStore::load(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, CohortError::ColumnNotFound { .. }));
}

#[tokio::test]
async fn test_async_load_matches_sync_load() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());

    let sync_store = EventStore::load(dir.path(), &LoadOptions::default()).unwrap();
    let async_store = EventStore::load_async(dir.path().to_path_buf(), LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(sync_store.summary(), async_store.summary());
    assert_eq!(sync_store.stays(), async_store.stays());
}
