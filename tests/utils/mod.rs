use chrono::{Duration, NaiveDate, NaiveDateTime};
use sepsis_cohort::codes::{Concept, ItemCodeMap};
use sepsis_cohort::models::{
    Admission, ChartEvent, DiagnosisCode, HadmId, IcdVersion, IcuStay, InputEvent, ItemId,
    LabEvent, MicrobiologyCulture, OutputEvent, Patient, Prescription, ProcedureEvent, StayId,
    SubjectId,
};
use sepsis_cohort::store::{EventStore, EventStoreBuilder};
use sepsis_cohort::PipelineConfig;

/// Fixed reference day for fixtures
#[must_use]
pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2150, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Default configuration without progress bars and with a small worker pool
#[must_use]
pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.output.show_progress = false;
    config.threads = Some(2);
    config
}

/// Builds small in-memory event stores record by record
pub struct StoreFixture {
    builder: EventStoreBuilder,
    codes: ItemCodeMap,
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreFixture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: EventStore::builder(),
            codes: ItemCodeMap::latest(),
        }
    }

    /// First item code of a concept
    #[must_use]
    pub fn code(&self, concept: Concept) -> ItemId {
        self.codes.codes(concept)[0]
    }

    pub fn patient(&mut self, subject_id: SubjectId, gender: &str, age: i64) -> &mut Self {
        self.builder.add_patient(Patient {
            subject_id,
            gender: Some(gender.to_string()),
            anchor_age: Some(age),
            anchor_year: Some(2150),
            dod: None,
        });
        self
    }

    pub fn admission(
        &mut self,
        subject_id: SubjectId,
        hadm_id: HadmId,
        admittime: NaiveDateTime,
        admission_type: &str,
    ) -> &mut Self {
        self.builder.add_admission(Admission {
            subject_id,
            hadm_id,
            admittime,
            dischtime: Some(admittime + Duration::days(20)),
            deathtime: None,
            admission_type: Some(admission_type.to_string()),
            race: Some("WHITE".to_string()),
        });
        self
    }

    /// ICU stay lasting `los` from `intime`
    pub fn stay(
        &mut self,
        subject_id: SubjectId,
        hadm_id: HadmId,
        stay_id: StayId,
        intime: NaiveDateTime,
        los: Duration,
    ) -> &mut Self {
        self.builder.add_stay(IcuStay {
            subject_id,
            hadm_id,
            stay_id,
            first_careunit: Some("Medical Intensive Care Unit (MICU)".to_string()),
            intime,
            outtime: Some(intime + los),
        });
        self
    }

    pub fn chart(
        &mut self,
        stay_id: StayId,
        charttime: NaiveDateTime,
        concept: Concept,
        value: f64,
    ) -> &mut Self {
        let itemid = self.code(concept);
        self.builder.add_chart_event(ChartEvent {
            stay_id,
            charttime,
            itemid,
            valuenum: Some(value),
        });
        self
    }

    pub fn lab(
        &mut self,
        subject_id: SubjectId,
        charttime: NaiveDateTime,
        concept: Concept,
        value: f64,
    ) -> &mut Self {
        let itemid = self.code(concept);
        self.builder.add_lab_event(LabEvent {
            subject_id,
            hadm_id: None,
            charttime,
            itemid,
            valuenum: Some(value),
        });
        self
    }

    pub fn output(
        &mut self,
        stay_id: StayId,
        charttime: NaiveDateTime,
        concept: Concept,
        value: f64,
    ) -> &mut Self {
        let itemid = self.code(concept);
        self.builder.add_output_event(OutputEvent {
            stay_id,
            charttime,
            itemid,
            value: Some(value),
        });
        self
    }

    pub fn infusion(
        &mut self,
        stay_id: StayId,
        starttime: NaiveDateTime,
        endtime: NaiveDateTime,
        concept: Concept,
        rate: f64,
        rateuom: &str,
    ) -> &mut Self {
        let itemid = self.code(concept);
        self.builder.add_input_event(InputEvent {
            stay_id,
            starttime,
            endtime,
            itemid,
            rate: Some(rate),
            rateuom: Some(rateuom.to_string()),
            patientweight: Some(80.0),
        });
        self
    }

    pub fn procedure(
        &mut self,
        stay_id: StayId,
        starttime: NaiveDateTime,
        endtime: NaiveDateTime,
        concept: Concept,
    ) -> &mut Self {
        let itemid = self.code(concept);
        self.builder.add_procedure_event(ProcedureEvent {
            stay_id,
            starttime,
            endtime,
            itemid,
        });
        self
    }

    pub fn diagnosis(
        &mut self,
        subject_id: SubjectId,
        hadm_id: HadmId,
        icd_code: &str,
        icd_version: IcdVersion,
    ) -> &mut Self {
        self.builder
            .add_diagnosis(DiagnosisCode::new(subject_id, hadm_id, 1, icd_code, icd_version));
        self
    }

    pub fn antibiotic(
        &mut self,
        subject_id: SubjectId,
        hadm_id: HadmId,
        starttime: NaiveDateTime,
        drug: &str,
    ) -> &mut Self {
        self.builder.add_prescription(Prescription {
            subject_id,
            hadm_id,
            starttime,
            stoptime: Some(starttime + Duration::days(5)),
            drug: drug.to_string(),
            route: Some("IV".to_string()),
        });
        self
    }

    pub fn culture(
        &mut self,
        subject_id: SubjectId,
        hadm_id: HadmId,
        time: NaiveDateTime,
    ) -> &mut Self {
        self.builder.add_culture(MicrobiologyCulture {
            subject_id,
            hadm_id: Some(hadm_id),
            time,
            spec_type_desc: Some("BLOOD CULTURE".to_string()),
        });
        self
    }

    /// Patient, admission and stay in one go; admission starts six hours before the stay
    pub fn subject_with_stay(
        &mut self,
        subject_id: SubjectId,
        stay_id: StayId,
        intime: NaiveDateTime,
        los: Duration,
    ) -> &mut Self {
        let hadm_id = stay_id * 10;
        self.patient(subject_id, "M", 60)
            .admission(subject_id, hadm_id, intime - Duration::hours(6), "EW EMER.")
            .stay(subject_id, hadm_id, stay_id, intime, los)
    }

    /// Replace the patient record with one carrying a date of death
    pub fn date_of_death(&mut self, subject_id: SubjectId, dod: NaiveDateTime) -> &mut Self {
        self.builder.add_patient(Patient {
            subject_id,
            gender: Some("M".to_string()),
            anchor_age: Some(60),
            anchor_year: Some(2150),
            dod: Some(dod),
        });
        self
    }

    /// Replace the admission of `subject_with_stay` with one ending in death
    pub fn died_in_hospital(
        &mut self,
        subject_id: SubjectId,
        stay_id: StayId,
        intime: NaiveDateTime,
        deathtime: NaiveDateTime,
    ) -> &mut Self {
        let admittime = intime - Duration::hours(6);
        self.builder.add_admission(Admission {
            subject_id,
            hadm_id: stay_id * 10,
            admittime,
            dischtime: Some(deathtime),
            deathtime: Some(deathtime),
            admission_type: Some("EW EMER.".to_string()),
            race: Some("WHITE".to_string()),
        });
        self
    }

    /// Readings meeting the SIRS heart-rate and respiration criteria with normal organ function
    pub fn sirs_positive(&mut self, subject_id: SubjectId, stay_id: StayId, intime: NaiveDateTime) -> &mut Self {
        self.chart(stay_id, intime + Duration::hours(2), Concept::HeartRate, 120.0)
            .chart(stay_id, intime + Duration::hours(2), Concept::RespRate, 26.0)
            .chart(stay_id, intime + Duration::hours(2), Concept::MeanBp, 80.0)
            .lab(subject_id, intime + Duration::hours(3), Concept::Creatinine, 0.9)
    }

    #[must_use]
    pub fn build(self) -> EventStore {
        self.builder.build()
    }
}
