//! Seeded synthetic event store
//!
//! Produces a small, internally consistent population for demos and
//! property tests: every subject has one or two admissions with one ICU stay
//! each, charted vitals, labs, urine output and, for a share of the stays,
//! infection work-up, vasopressors and ventilation. The same seed always
//! yields the same store.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::prelude::*;

use crate::codes::{Concept, ItemCodeMap};
use crate::models::{
    Admission, ChartEvent, DiagnosisCode, IcdVersion, IcuStay, InputEvent, ItemId, LabEvent,
    MicrobiologyCulture, OutputEvent, Patient, Prescription, ProcedureEvent, ServiceTransfer,
    StayId, SubjectId,
};
use crate::store::{EventStore, EventStoreBuilder};

/// Generate a store with `n_subjects` subjects
#[must_use]
pub fn generate_store(n_subjects: usize, seed: u64) -> EventStore {
    let mut generator = Generator {
        rng: StdRng::seed_from_u64(seed),
        codes: ItemCodeMap::latest(),
        builder: EventStoreBuilder::new(),
    };
    for idx in 0..n_subjects {
        generator.subject(10_000 + idx as SubjectId);
    }
    let store = generator.builder.build();
    log::info!(
        "Generated synthetic store with {} subjects and {} stays",
        n_subjects,
        store.summary().stays
    );
    store
}

struct Generator {
    rng: StdRng,
    codes: ItemCodeMap,
    builder: EventStoreBuilder,
}

impl Generator {
    fn code(&self, concept: Concept) -> ItemId {
        self.codes.codes(concept).first().copied().unwrap_or_default()
    }

    fn subject(&mut self, subject_id: SubjectId) {
        let female = self.rng.random_bool(0.5);
        let anchor_year = self.rng.random_range(2110..2180);
        let anchor_age = self.rng.random_range(18..95);
        let base = NaiveDate::from_ymd_opt(anchor_year as i32, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
            + Duration::hours(self.rng.random_range(0..24 * 300));

        let n_admissions = self.rng.random_range(1..=2);
        let mut admit = base;
        let mut death = None;
        for idx in 0..n_admissions {
            let hadm_id = subject_id * 10 + idx;
            let stay_id = subject_id * 100 + idx;
            let died = self.admission(subject_id, hadm_id, stay_id, admit, female);
            if let Some(time) = died {
                death = Some(time);
                break;
            }
            admit += Duration::days(self.rng.random_range(30..400));
        }

        let dod = death.or_else(|| {
            self.rng
                .random_bool(0.1)
                .then(|| admit + Duration::days(self.rng.random_range(1..200)))
        });
        self.builder.add_patient(Patient {
            subject_id,
            gender: Some(if female { "F" } else { "M" }.to_string()),
            anchor_age: Some(anchor_age),
            anchor_year: Some(anchor_year),
            dod,
        });
    }

    /// One admission with one ICU stay; returns the in-hospital death time
    fn admission(
        &mut self,
        subject_id: SubjectId,
        hadm_id: i64,
        stay_id: StayId,
        admittime: NaiveDateTime,
        female: bool,
    ) -> Option<NaiveDateTime> {
        let elective = self.rng.random_bool(0.2);
        let septic = self.rng.random_bool(0.5);
        let intime = admittime + Duration::minutes(self.rng.random_range(0..3000));
        let los_hours = if self.rng.random_bool(0.02) {
            self.rng.random_range(2401..2600)
        } else {
            self.rng.random_range(6..200)
        };
        let outtime = intime + Duration::hours(los_hours);
        let dischtime = outtime + Duration::hours(self.rng.random_range(12..240));
        let deathtime = self.rng.random_bool(0.1).then_some(dischtime);

        self.builder.add_admission(Admission {
            subject_id,
            hadm_id,
            admittime,
            dischtime: Some(dischtime),
            deathtime,
            admission_type: Some(if elective { "ELECTIVE" } else { "EW EMER." }.to_string()),
            race: Some("WHITE".to_string()),
        });
        self.builder.add_stay(IcuStay {
            subject_id,
            hadm_id,
            stay_id,
            first_careunit: Some("Medical Intensive Care Unit (MICU)".to_string()),
            intime,
            outtime: Some(outtime),
        });
        self.builder.add_service(ServiceTransfer {
            subject_id,
            hadm_id,
            transfertime: admittime,
            curr_service: if elective { "SURG" } else { "MED" }.to_string(),
        });

        self.vitals(stay_id, intime, septic);
        self.labs(subject_id, hadm_id, intime, septic);
        self.outputs(stay_id, intime);
        if septic {
            self.infection(subject_id, hadm_id, intime);
        }
        if self.rng.random_bool(if septic { 0.4 } else { 0.1 }) {
            let itemid = self.code(Concept::Norepinephrine);
            let rate = self.rng.random_range(0.02..0.5);
            self.builder.add_input_event(InputEvent {
                stay_id,
                starttime: intime + Duration::hours(2),
                endtime: intime + Duration::hours(20),
                itemid,
                rate: Some(rate),
                rateuom: Some("mcg/kg/min".to_string()),
                patientweight: Some(80.0),
            });
        }
        if self.rng.random_bool(0.3) {
            let itemid = self.code(Concept::InvasiveVentilation);
            self.builder.add_procedure_event(ProcedureEvent {
                stay_id,
                starttime: intime + Duration::hours(1),
                endtime: intime + Duration::hours(30),
                itemid,
            });
        }
        self.diagnoses(subject_id, hadm_id, septic, female);
        deathtime
    }

    fn chart(&mut self, stay_id: StayId, time: NaiveDateTime, concept: Concept, value: f64) {
        let itemid = self.code(concept);
        self.builder.add_chart_event(ChartEvent {
            stay_id,
            charttime: time,
            itemid,
            valuenum: Some(value),
        });
    }

    fn vitals(&mut self, stay_id: StayId, intime: NaiveDateTime, septic: bool) {
        let (hr, rr, temp_f, mbp) = if septic {
            (105.0, 24.0, 101.0, 62.0)
        } else {
            (78.0, 15.0, 98.2, 82.0)
        };
        let height_cm: f64 = self.rng.random_range(150.0..195.0);
        self.chart(stay_id, intime, Concept::HeightCm, height_cm.round());
        self.chart(stay_id, intime, Concept::HeightIn, (height_cm / 2.54).round());
        let weight = self.rng.random_range(50.0..120.0);
        self.chart(stay_id, intime, Concept::WeightKg, weight);

        let mut hour = 0;
        while hour <= 30 {
            let time = intime + Duration::hours(hour);
            let noise = self.rng.random_range(-8.0..8.0);
            self.chart(stay_id, time, Concept::HeartRate, hr + noise);
            self.chart(stay_id, time, Concept::RespRate, rr + noise / 4.0);
            self.chart(stay_id, time, Concept::TemperatureF, temp_f + noise / 10.0);
            self.chart(stay_id, time, Concept::MeanBp, mbp + noise);
            self.chart(stay_id, time, Concept::SystolicBp, mbp + 40.0 + noise);
            self.chart(stay_id, time, Concept::DiastolicBp, mbp - 15.0 + noise);
            self.chart(stay_id, time, Concept::Spo2, (96.0 + noise / 4.0).min(100.0));
            self.chart(stay_id, time, Concept::FiO2, if septic { 50.0 } else { 30.0 });
            if hour % 4 == 0 {
                let motor = if septic { 5.0 } else { 6.0 };
                self.chart(stay_id, time, Concept::GcsEye, 4.0);
                self.chart(stay_id, time, Concept::GcsVerbal, 5.0);
                self.chart(stay_id, time, Concept::GcsMotor, motor);
            }
            hour += self.rng.random_range(1..=4);
        }
    }

    fn labs(&mut self, subject_id: SubjectId, hadm_id: i64, intime: NaiveDateTime, septic: bool) {
        let panel: [(Concept, f64, f64); 12] = [
            (Concept::Wbc, 14.0, 8.0),
            (Concept::Creatinine, 1.8, 0.9),
            (Concept::Bilirubin, 1.5, 0.6),
            (Concept::Platelets, 120.0, 240.0),
            (Concept::Pao2, 85.0, 110.0),
            (Concept::Paco2, 30.0, 40.0),
            (Concept::Neutrophils, 85.0, 65.0),
            (Concept::Lymphocytes, 8.0, 25.0),
            (Concept::Lactate, 3.5, 1.2),
            (Concept::Sodium, 136.0, 140.0),
            (Concept::Hemoglobin, 10.0, 13.0),
            (Concept::Inr, 1.6, 1.1),
        ];
        for hour in [-6, 4, 16] {
            let charttime = intime + Duration::hours(hour);
            for (concept, sick, well) in panel {
                let base = if septic { sick } else { well };
                let value = base * self.rng.random_range(0.9..1.1);
                let itemid = self.code(concept);
                self.builder.add_lab_event(LabEvent {
                    subject_id,
                    hadm_id: (hour >= 0).then_some(hadm_id),
                    charttime,
                    itemid,
                    valuenum: Some(value),
                });
            }
        }
    }

    fn outputs(&mut self, stay_id: StayId, intime: NaiveDateTime) {
        let itemid = self.code(Concept::UrineOutput);
        for hour in (2..=24).step_by(2) {
            let value = self.rng.random_range(20.0..200.0);
            self.builder.add_output_event(OutputEvent {
                stay_id,
                charttime: intime + Duration::hours(hour),
                itemid,
                value: Some(value),
            });
        }
    }

    fn infection(&mut self, subject_id: SubjectId, hadm_id: i64, intime: NaiveDateTime) {
        let antibiotic_time = intime + Duration::hours(self.rng.random_range(-12..12));
        self.builder.add_prescription(Prescription {
            subject_id,
            hadm_id,
            starttime: antibiotic_time,
            stoptime: Some(antibiotic_time + Duration::days(5)),
            drug: "Piperacillin-Tazobactam".to_string(),
            route: Some("IV".to_string()),
        });
        let culture_time = antibiotic_time - Duration::hours(self.rng.random_range(0..12));
        self.builder.add_culture(MicrobiologyCulture {
            subject_id,
            hadm_id: Some(hadm_id),
            time: culture_time,
            spec_type_desc: Some("BLOOD CULTURE".to_string()),
        });
    }

    fn diagnoses(&mut self, subject_id: SubjectId, hadm_id: i64, septic: bool, female: bool) {
        let mut codes = vec![("I10", IcdVersion::Icd10)];
        if septic && self.rng.random_bool(0.3) {
            codes.push(("R6520", IcdVersion::Icd10));
        }
        if female && self.rng.random_bool(0.05) {
            codes.push(("O99419", IcdVersion::Icd10));
        }
        for (seq, (code, version)) in codes.into_iter().enumerate() {
            self.builder.add_diagnosis(DiagnosisCode::new(
                subject_id,
                hadm_id,
                seq as i64 + 1,
                code,
                version,
            ));
        }
    }
}
