//! The cohort table row
//!
//! One row per surviving stay. Field order is the column order of the
//! written table and must not change.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use chrono::naive::serde::{ts_milliseconds, ts_milliseconds_option};
use serde::{Deserialize, Serialize};

use crate::error::{CohortError, Result};

/// One stay of the cohort with every score, feature and outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub subject_id: i64,
    pub hadm_id: i64,
    pub stay_id: i64,
    #[serde(with = "ts_milliseconds")]
    pub intime: NaiveDateTime,
    #[serde(with = "ts_milliseconds_option")]
    pub outtime: Option<NaiveDateTime>,
    pub icu_los_hours: Option<f64>,
    pub first_careunit: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub race: Option<String>,
    pub admission_type: Option<String>,
    pub inclusion: Option<String>,
    #[serde(with = "ts_milliseconds_option")]
    pub suspected_infection_time: Option<NaiveDateTime>,
    pub sirs: Option<u8>,
    pub sofa: Option<u8>,
    pub oasis: Option<u8>,
    pub oasis_prob: Option<f64>,
    pub preiculos_score: Option<u8>,
    pub age_score: Option<u8>,
    pub gcs_score: Option<u8>,
    pub heart_rate_score: Option<u8>,
    pub mbp_score: Option<u8>,
    pub resp_rate_score: Option<u8>,
    pub temp_score: Option<u8>,
    pub urineoutput_score: Option<u8>,
    pub mechvent_score: Option<u8>,
    pub electivesurgery_score: Option<u8>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub heart_rate_mean: Option<f64>,
    pub sbp_mean: Option<f64>,
    pub dbp_mean: Option<f64>,
    pub mbp_mean: Option<f64>,
    pub resp_rate_mean: Option<f64>,
    pub temperature_mean: Option<f64>,
    pub spo2_mean: Option<f64>,
    pub glucose_chart_mean: Option<f64>,
    pub gcs_min: Option<f64>,
    pub wbc_mean: Option<f64>,
    pub hemoglobin_mean: Option<f64>,
    pub hematocrit_mean: Option<f64>,
    pub platelets_mean: Option<f64>,
    pub neutrophils_mean: Option<f64>,
    pub lymphocytes_mean: Option<f64>,
    pub bands_mean: Option<f64>,
    pub sodium_mean: Option<f64>,
    pub potassium_mean: Option<f64>,
    pub chloride_mean: Option<f64>,
    pub bicarbonate_mean: Option<f64>,
    pub bun_mean: Option<f64>,
    pub creatinine_mean: Option<f64>,
    pub glucose_mean: Option<f64>,
    pub calcium_mean: Option<f64>,
    pub ionized_calcium_mean: Option<f64>,
    pub magnesium_mean: Option<f64>,
    pub phosphate_mean: Option<f64>,
    pub anion_gap_mean: Option<f64>,
    pub albumin_mean: Option<f64>,
    pub bilirubin_mean: Option<f64>,
    pub alt_mean: Option<f64>,
    pub ast_mean: Option<f64>,
    pub alp_mean: Option<f64>,
    pub lactate_mean: Option<f64>,
    pub pt_mean: Option<f64>,
    pub ptt_mean: Option<f64>,
    pub inr_mean: Option<f64>,
    pub ph_mean: Option<f64>,
    pub pao2_mean: Option<f64>,
    pub paco2_mean: Option<f64>,
    pub fio2_mean: Option<f64>,
    pub base_excess_mean: Option<f64>,
    pub nlr: Option<f64>,
    pub pf_ratio: Option<f64>,
    pub urine_output: Option<f64>,
    pub vasopressor: bool,
    pub norepinephrine_equivalent_max: Option<f64>,
    pub mechanical_ventilation: bool,
    pub renal_replacement_therapy: bool,
    pub death_48h: bool,
    pub death_90d: bool,
    pub hospital_death: bool,
}

fn id(name: &str) -> Field {
    Field::new(name, DataType::Int64, false)
}

fn int(name: &str) -> Field {
    Field::new(name, DataType::Int64, true)
}

fn required_time(name: &str) -> Field {
    Field::new(name, DataType::Timestamp(TimeUnit::Millisecond, None), false)
}

fn time(name: &str) -> Field {
    Field::new(name, DataType::Timestamp(TimeUnit::Millisecond, None), true)
}

fn text(name: &str) -> Field {
    Field::new(name, DataType::Utf8, true)
}

fn score(name: &str) -> Field {
    Field::new(name, DataType::UInt8, true)
}

fn float(name: &str) -> Field {
    Field::new(name, DataType::Float64, true)
}

fn flag(name: &str) -> Field {
    Field::new(name, DataType::Boolean, false)
}

/// Arrow schema of the cohort table
#[must_use]
pub fn cohort_schema() -> Schema {
    Schema::new(vec![
        id("subject_id"),
        id("hadm_id"),
        id("stay_id"),
        required_time("intime"),
        time("outtime"),
        float("icu_los_hours"),
        text("first_careunit"),
        text("gender"),
        int("age"),
        text("race"),
        text("admission_type"),
        text("inclusion"),
        time("suspected_infection_time"),
        score("sirs"),
        score("sofa"),
        score("oasis"),
        float("oasis_prob"),
        score("preiculos_score"),
        score("age_score"),
        score("gcs_score"),
        score("heart_rate_score"),
        score("mbp_score"),
        score("resp_rate_score"),
        score("temp_score"),
        score("urineoutput_score"),
        score("mechvent_score"),
        score("electivesurgery_score"),
        float("height_cm"),
        float("weight_kg"),
        float("bmi"),
        float("heart_rate_mean"),
        float("sbp_mean"),
        float("dbp_mean"),
        float("mbp_mean"),
        float("resp_rate_mean"),
        float("temperature_mean"),
        float("spo2_mean"),
        float("glucose_chart_mean"),
        float("gcs_min"),
        float("wbc_mean"),
        float("hemoglobin_mean"),
        float("hematocrit_mean"),
        float("platelets_mean"),
        float("neutrophils_mean"),
        float("lymphocytes_mean"),
        float("bands_mean"),
        float("sodium_mean"),
        float("potassium_mean"),
        float("chloride_mean"),
        float("bicarbonate_mean"),
        float("bun_mean"),
        float("creatinine_mean"),
        float("glucose_mean"),
        float("calcium_mean"),
        float("ionized_calcium_mean"),
        float("magnesium_mean"),
        float("phosphate_mean"),
        float("anion_gap_mean"),
        float("albumin_mean"),
        float("bilirubin_mean"),
        float("alt_mean"),
        float("ast_mean"),
        float("alp_mean"),
        float("lactate_mean"),
        float("pt_mean"),
        float("ptt_mean"),
        float("inr_mean"),
        float("ph_mean"),
        float("pao2_mean"),
        float("paco2_mean"),
        float("fio2_mean"),
        float("base_excess_mean"),
        float("nlr"),
        float("pf_ratio"),
        float("urine_output"),
        flag("vasopressor"),
        float("norepinephrine_equivalent_max"),
        flag("mechanical_ventilation"),
        flag("renal_replacement_therapy"),
        flag("death_48h"),
        flag("death_90d"),
        flag("hospital_death"),
    ])
}

/// Shared reference to the cohort schema
#[must_use]
pub fn cohort_schema_ref() -> SchemaRef {
    Arc::new(cohort_schema())
}

/// Column names in output order
#[must_use]
pub fn column_names() -> Vec<String> {
    cohort_schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect()
}

/// Convert rows to a record batch with the cohort schema
pub fn to_record_batch(rows: &[FeatureRow]) -> Result<RecordBatch> {
    let fields: Vec<FieldRef> = cohort_schema_ref().fields().iter().cloned().collect();
    serde_arrow::to_record_batch(&fields, &rows)
        .map_err(|e| CohortError::Output(format!("Failed to convert cohort rows to Arrow: {e}")))
}
