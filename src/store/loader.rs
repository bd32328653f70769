//! Parquet loaders for the event store
//!
//! Each source table maps to one record type through [`FromBatch`]. Batches
//! are converted in parallel; rows with a null key are skipped, null values
//! are kept as missing. Optional tables that are absent load as empty with a
//! warning, while a missing required table fails the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{CohortError, Result};
use crate::models::{
    Admission, ChartEvent, DiagnosisCode, IcdVersion, IcuStay, InputEvent, LabEvent,
    MicrobiologyCulture, OutputEvent, Patient, Prescription, ProcedureEvent, ServiceTransfer,
    SubjectId,
};
use crate::store::{EventStore, EventStoreBuilder};
use crate::utils::arrow::TypedColumn;
use crate::utils::io::{read_table, validate_directory};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Options applied while loading the source tables
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Restrict every table to these subjects
    pub subject_filter: Option<FxHashSet<SubjectId>>,
}

impl LoadOptions {
    #[must_use]
    pub fn with_subjects(subjects: impl IntoIterator<Item = SubjectId>) -> Self {
        Self {
            subject_filter: Some(subjects.into_iter().collect()),
        }
    }

    fn keeps(&self, subject_id: SubjectId) -> bool {
        self.subject_filter
            .as_ref()
            .is_none_or(|subjects| subjects.contains(&subject_id))
    }
}

/// A record type read from one source table
pub trait FromBatch: Sized + Send + 'static {
    /// Table name (file `<name>.parquet` or directory `<name>/`)
    const TABLE: &'static str;
    /// Columns read from the table; optional ones may be absent
    const COLUMNS: &'static [&'static str];
    /// Whether the pipeline cannot run without this table
    const REQUIRED: bool;

    /// Convert one batch, skipping rows with null keys or filtered subjects
    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>>;
}

/// Read and convert every record of `T`'s table
pub fn load_records<T: FromBatch>(data_dir: &Path, options: &LoadOptions) -> Result<Vec<T>> {
    let start = Instant::now();
    let Some(batches) = read_table(data_dir, T::TABLE, T::COLUMNS)? else {
        if T::REQUIRED {
            return Err(CohortError::TableNotFound {
                table: T::TABLE.to_string(),
                path: data_dir.to_path_buf(),
            });
        }
        log_warning(
            &format!("Optional table '{}' not found, dependent features will be missing", T::TABLE),
            Some(data_dir),
        );
        return Ok(Vec::new());
    };

    let records: Vec<T> = batches
        .par_iter()
        .map(|batch| T::from_batch(batch, options))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    log_operation_complete(
        &format!("converted table '{}'", T::TABLE),
        data_dir,
        records.len(),
        Some(start.elapsed()),
    );
    Ok(records)
}

impl EventStore {
    /// Load every source table from `data_dir` and index it
    pub fn load(data_dir: &Path, options: &LoadOptions) -> Result<Self> {
        validate_directory(data_dir)?;
        let start = Instant::now();
        log_operation_start("Loading event store from", data_dir);

        let mut builder = EventStoreBuilder::new();
        builder
            .extend(load_records::<Patient>(data_dir, options)?)
            .extend(load_records::<Admission>(data_dir, options)?)
            .extend(load_records::<IcuStay>(data_dir, options)?)
            .extend(load_records::<ChartEvent>(data_dir, options)?)
            .extend(load_records::<LabEvent>(data_dir, options)?)
            .extend(load_records::<OutputEvent>(data_dir, options)?)
            .extend(load_records::<InputEvent>(data_dir, options)?)
            .extend(load_records::<ProcedureEvent>(data_dir, options)?)
            .extend(load_records::<DiagnosisCode>(data_dir, options)?)
            .extend(load_records::<Prescription>(data_dir, options)?)
            .extend(load_records::<MicrobiologyCulture>(data_dir, options)?)
            .extend(load_records::<ServiceTransfer>(data_dir, options)?);

        let store = builder.build();
        log_operation_complete(
            "indexed",
            data_dir,
            store.summary().stays,
            Some(start.elapsed()),
        );
        Ok(store)
    }

    /// Load every source table concurrently on blocking tasks
    pub async fn load_async(data_dir: PathBuf, options: LoadOptions) -> Result<Self> {
        validate_directory(&data_dir)?;
        let start = Instant::now();
        log_operation_start("Loading event store asynchronously from", &data_dir);

        let data_dir = Arc::new(data_dir);
        let options = Arc::new(options);

        let (
            patients,
            admissions,
            stays,
            chart,
            labs,
            outputs,
            inputs,
            procedures,
            diagnoses,
            prescriptions,
            cultures,
            services,
        ) = futures::try_join!(
            spawn_load::<Patient>(&data_dir, &options),
            spawn_load::<Admission>(&data_dir, &options),
            spawn_load::<IcuStay>(&data_dir, &options),
            spawn_load::<ChartEvent>(&data_dir, &options),
            spawn_load::<LabEvent>(&data_dir, &options),
            spawn_load::<OutputEvent>(&data_dir, &options),
            spawn_load::<InputEvent>(&data_dir, &options),
            spawn_load::<ProcedureEvent>(&data_dir, &options),
            spawn_load::<DiagnosisCode>(&data_dir, &options),
            spawn_load::<Prescription>(&data_dir, &options),
            spawn_load::<MicrobiologyCulture>(&data_dir, &options),
            spawn_load::<ServiceTransfer>(&data_dir, &options),
        )?;

        let mut builder = EventStoreBuilder::new();
        builder
            .extend(patients)
            .extend(admissions)
            .extend(stays)
            .extend(chart)
            .extend(labs)
            .extend(outputs)
            .extend(inputs)
            .extend(procedures)
            .extend(diagnoses)
            .extend(prescriptions)
            .extend(cultures)
            .extend(services);

        let store = builder.build();
        log_operation_complete(
            "indexed",
            &data_dir,
            store.summary().stays,
            Some(start.elapsed()),
        );
        Ok(store)
    }
}

async fn spawn_load<T: FromBatch>(
    data_dir: &Arc<PathBuf>,
    options: &Arc<LoadOptions>,
) -> Result<Vec<T>> {
    let data_dir = Arc::clone(data_dir);
    let options = Arc::clone(options);
    tokio::task::spawn_blocking(move || load_records::<T>(&data_dir, &options))
        .await
        .map_err(|e| CohortError::Task(e.to_string()))?
}

impl FromBatch for Patient {
    const TABLE: &'static str = "patients";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "gender", "anchor_age", "anchor_year", "dod"];
    const REQUIRED: bool = true;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let gender = TypedColumn::utf8(batch, Self::TABLE, "gender", true)?;
        let anchor_age = TypedColumn::int64(batch, Self::TABLE, "anchor_age", true)?;
        let anchor_year = TypedColumn::int64(batch, Self::TABLE, "anchor_year", true)?;
        let dod = TypedColumn::timestamp(batch, Self::TABLE, "dod", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    subject_id,
                    gender: gender.get(row).map(str::to_string),
                    anchor_age: anchor_age.get(row),
                    anchor_year: anchor_year.get(row),
                    dod: dod.get(row),
                })
            })
            .collect())
    }
}

impl FromBatch for Admission {
    const TABLE: &'static str = "admissions";
    const COLUMNS: &'static [&'static str] = &[
        "subject_id",
        "hadm_id",
        "admittime",
        "dischtime",
        "deathtime",
        "admission_type",
        "race",
    ];
    const REQUIRED: bool = true;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", true)?;
        let admittime = TypedColumn::timestamp(batch, Self::TABLE, "admittime", true)?;
        let dischtime = TypedColumn::timestamp(batch, Self::TABLE, "dischtime", true)?;
        let deathtime = TypedColumn::timestamp(batch, Self::TABLE, "deathtime", false)?;
        let admission_type = TypedColumn::utf8(batch, Self::TABLE, "admission_type", true)?;
        let race = TypedColumn::utf8(batch, Self::TABLE, "race", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    subject_id,
                    hadm_id: hadm_id.get(row)?,
                    admittime: admittime.get(row)?,
                    dischtime: dischtime.get(row),
                    deathtime: deathtime.get(row),
                    admission_type: admission_type.get(row).map(str::to_string),
                    race: race.get(row).map(str::to_string),
                })
            })
            .collect())
    }
}

impl FromBatch for IcuStay {
    const TABLE: &'static str = "icustays";
    const COLUMNS: &'static [&'static str] = &[
        "subject_id",
        "hadm_id",
        "stay_id",
        "first_careunit",
        "intime",
        "outtime",
    ];
    const REQUIRED: bool = true;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", true)?;
        let stay_id = TypedColumn::int64(batch, Self::TABLE, "stay_id", true)?;
        let first_careunit = TypedColumn::utf8(batch, Self::TABLE, "first_careunit", false)?;
        let intime = TypedColumn::timestamp(batch, Self::TABLE, "intime", true)?;
        let outtime = TypedColumn::timestamp(batch, Self::TABLE, "outtime", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    subject_id,
                    hadm_id: hadm_id.get(row)?,
                    stay_id: stay_id.get(row)?,
                    first_careunit: first_careunit.get(row).map(str::to_string),
                    intime: intime.get(row)?,
                    outtime: outtime.get(row),
                })
            })
            .collect())
    }
}

impl FromBatch for ChartEvent {
    const TABLE: &'static str = "chartevents";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "stay_id", "charttime", "itemid", "valuenum"];
    const REQUIRED: bool = true;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let stay_id = TypedColumn::int64(batch, Self::TABLE, "stay_id", true)?;
        let charttime = TypedColumn::timestamp(batch, Self::TABLE, "charttime", true)?;
        let itemid = TypedColumn::int64(batch, Self::TABLE, "itemid", true)?;
        let valuenum = TypedColumn::float64(batch, Self::TABLE, "valuenum", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    stay_id: stay_id.get(row)?,
                    charttime: charttime.get(row)?,
                    itemid: itemid.get(row)?,
                    valuenum: valuenum.get(row),
                })
            })
            .collect())
    }
}

impl FromBatch for LabEvent {
    const TABLE: &'static str = "labevents";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "hadm_id", "charttime", "itemid", "valuenum"];
    const REQUIRED: bool = true;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", false)?;
        let charttime = TypedColumn::timestamp(batch, Self::TABLE, "charttime", true)?;
        let itemid = TypedColumn::int64(batch, Self::TABLE, "itemid", true)?;
        let valuenum = TypedColumn::float64(batch, Self::TABLE, "valuenum", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    subject_id,
                    hadm_id: hadm_id.get(row),
                    charttime: charttime.get(row)?,
                    itemid: itemid.get(row)?,
                    valuenum: valuenum.get(row),
                })
            })
            .collect())
    }
}

impl FromBatch for OutputEvent {
    const TABLE: &'static str = "outputevents";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "stay_id", "charttime", "itemid", "value"];
    const REQUIRED: bool = false;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let stay_id = TypedColumn::int64(batch, Self::TABLE, "stay_id", true)?;
        let charttime = TypedColumn::timestamp(batch, Self::TABLE, "charttime", true)?;
        let itemid = TypedColumn::int64(batch, Self::TABLE, "itemid", true)?;
        let value = TypedColumn::float64(batch, Self::TABLE, "value", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    stay_id: stay_id.get(row)?,
                    charttime: charttime.get(row)?,
                    itemid: itemid.get(row)?,
                    value: value.get(row),
                })
            })
            .collect())
    }
}

impl FromBatch for InputEvent {
    const TABLE: &'static str = "inputevents";
    const COLUMNS: &'static [&'static str] = &[
        "subject_id",
        "stay_id",
        "starttime",
        "endtime",
        "itemid",
        "rate",
        "rateuom",
        "patientweight",
    ];
    const REQUIRED: bool = false;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let stay_id = TypedColumn::int64(batch, Self::TABLE, "stay_id", true)?;
        let starttime = TypedColumn::timestamp(batch, Self::TABLE, "starttime", true)?;
        let endtime = TypedColumn::timestamp(batch, Self::TABLE, "endtime", true)?;
        let itemid = TypedColumn::int64(batch, Self::TABLE, "itemid", true)?;
        let rate = TypedColumn::float64(batch, Self::TABLE, "rate", false)?;
        let rateuom = TypedColumn::utf8(batch, Self::TABLE, "rateuom", false)?;
        let patientweight = TypedColumn::float64(batch, Self::TABLE, "patientweight", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                subject_id.get(row).filter(|id| options.keeps(*id))?;
                let starttime = starttime.get(row)?;
                Some(Self {
                    stay_id: stay_id.get(row)?,
                    starttime,
                    endtime: endtime.get(row).unwrap_or(starttime),
                    itemid: itemid.get(row)?,
                    rate: rate.get(row),
                    rateuom: rateuom.get(row).map(str::to_string),
                    patientweight: patientweight.get(row),
                })
            })
            .collect())
    }
}

impl FromBatch for ProcedureEvent {
    const TABLE: &'static str = "procedureevents";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "stay_id", "starttime", "endtime", "itemid"];
    const REQUIRED: bool = false;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let stay_id = TypedColumn::int64(batch, Self::TABLE, "stay_id", true)?;
        let starttime = TypedColumn::timestamp(batch, Self::TABLE, "starttime", true)?;
        let endtime = TypedColumn::timestamp(batch, Self::TABLE, "endtime", true)?;
        let itemid = TypedColumn::int64(batch, Self::TABLE, "itemid", true)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                subject_id.get(row).filter(|id| options.keeps(*id))?;
                let starttime = starttime.get(row)?;
                Some(Self {
                    stay_id: stay_id.get(row)?,
                    starttime,
                    endtime: endtime.get(row).unwrap_or(starttime),
                    itemid: itemid.get(row)?,
                })
            })
            .collect())
    }
}

impl FromBatch for DiagnosisCode {
    const TABLE: &'static str = "diagnoses_icd";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "hadm_id", "seq_num", "icd_code", "icd_version"];
    const REQUIRED: bool = true;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", true)?;
        let seq_num = TypedColumn::int64(batch, Self::TABLE, "seq_num", true)?;
        let icd_code = TypedColumn::utf8(batch, Self::TABLE, "icd_code", true)?;
        let icd_version = TypedColumn::int64(batch, Self::TABLE, "icd_version", true)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                let version = icd_version.get(row).and_then(IcdVersion::from_i64);
                if version.is_none() {
                    log::debug!("Skipping diagnosis of subject {subject_id} with unknown ICD version");
                }
                Some(Self::new(
                    subject_id,
                    hadm_id.get(row)?,
                    seq_num.get(row).unwrap_or(0),
                    icd_code.get(row)?,
                    version?,
                ))
            })
            .collect())
    }
}

impl FromBatch for Prescription {
    const TABLE: &'static str = "prescriptions";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "hadm_id", "starttime", "stoptime", "drug", "route"];
    const REQUIRED: bool = false;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", true)?;
        let starttime = TypedColumn::timestamp(batch, Self::TABLE, "starttime", true)?;
        let stoptime = TypedColumn::timestamp(batch, Self::TABLE, "stoptime", false)?;
        let drug = TypedColumn::utf8(batch, Self::TABLE, "drug", true)?;
        let route = TypedColumn::utf8(batch, Self::TABLE, "route", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    subject_id,
                    hadm_id: hadm_id.get(row)?,
                    starttime: starttime.get(row)?,
                    stoptime: stoptime.get(row),
                    drug: drug.get(row)?.to_string(),
                    route: route.get(row).map(str::to_string),
                })
            })
            .collect())
    }
}

impl FromBatch for MicrobiologyCulture {
    const TABLE: &'static str = "microbiologyevents";
    const COLUMNS: &'static [&'static str] = &[
        "subject_id",
        "hadm_id",
        "chartdate",
        "charttime",
        "spec_type_desc",
    ];
    const REQUIRED: bool = false;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", false)?;
        let chartdate = TypedColumn::timestamp(batch, Self::TABLE, "chartdate", true)?;
        let charttime = TypedColumn::timestamp(batch, Self::TABLE, "charttime", false)?;
        let spec_type_desc = TypedColumn::utf8(batch, Self::TABLE, "spec_type_desc", false)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                let time = charttime.get(row).or_else(|| {
                    chartdate
                        .get(row)
                        .and_then(|date| date.date().and_hms_opt(0, 0, 0))
                })?;
                Some(Self {
                    subject_id,
                    hadm_id: hadm_id.get(row),
                    time,
                    spec_type_desc: spec_type_desc.get(row).map(str::to_string),
                })
            })
            .collect())
    }
}

impl FromBatch for ServiceTransfer {
    const TABLE: &'static str = "services";
    const COLUMNS: &'static [&'static str] =
        &["subject_id", "hadm_id", "transfertime", "curr_service"];
    const REQUIRED: bool = false;

    fn from_batch(batch: &RecordBatch, options: &LoadOptions) -> Result<Vec<Self>> {
        let subject_id = TypedColumn::int64(batch, Self::TABLE, "subject_id", true)?;
        let hadm_id = TypedColumn::int64(batch, Self::TABLE, "hadm_id", true)?;
        let transfertime = TypedColumn::timestamp(batch, Self::TABLE, "transfertime", true)?;
        let curr_service = TypedColumn::utf8(batch, Self::TABLE, "curr_service", true)?;

        Ok((0..batch.num_rows())
            .filter_map(|row| {
                let subject_id = subject_id.get(row).filter(|id| options.keeps(*id))?;
                Some(Self {
                    subject_id,
                    hadm_id: hadm_id.get(row)?,
                    transfertime: transfertime.get(row)?,
                    curr_service: curr_service.get(row)?.to_string(),
                })
            })
            .collect())
    }
}
