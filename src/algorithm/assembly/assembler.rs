//! Cohort assembler
//!
//! Left-joins the per-stay components onto the filtered cohort. A stay
//! without components keeps its row with null scores and features.

use rustc_hash::FxHashMap;

use crate::algorithm::assembly::feature_row::FeatureRow;
use crate::algorithm::assembly::outcome::Outcomes;
use crate::algorithm::cohort::Candidate;
use crate::algorithm::context::StayContext;
use crate::algorithm::features::StayFeatures;
use crate::algorithm::features::vitals::mean;
use crate::algorithm::scores::{OasisInputs, OasisScore};
use crate::codes::Concept;
use crate::models::StayId;
use crate::store::EventSource;

/// Features and OASIS of one stay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StayComponents {
    pub features: StayFeatures,
    pub oasis: OasisScore,
}

impl StayComponents {
    /// Aggregate the features of a stay and score OASIS from them
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        let features = StayFeatures::collect(ctx);
        let oasis = OasisScore::from_inputs(&OasisInputs::collect(ctx, &features));
        Self { features, oasis }
    }
}

/// Joins cohort stays, components, demographics and outcomes into rows
pub struct CohortAssembler<'a> {
    store: &'a dyn EventSource,
}

impl<'a> CohortAssembler<'a> {
    #[must_use]
    pub fn new(store: &'a dyn EventSource) -> Self {
        Self { store }
    }

    /// One row per distinct stay, ordered by (`subject_id`, `stay_id`)
    #[must_use]
    pub fn assemble(
        &self,
        cohort: &[Candidate],
        components: &FxHashMap<StayId, StayComponents>,
    ) -> Vec<FeatureRow> {
        let mut rows: Vec<FeatureRow> = cohort
            .iter()
            .map(|candidate| self.row(candidate, components.get(&candidate.stay.stay_id)))
            .collect();
        rows.sort_by_key(|row| (row.subject_id, row.stay_id));
        rows.dedup_by_key(|row| row.stay_id);
        rows
    }

    /// Build the row of one stay
    #[must_use]
    pub fn row(&self, candidate: &Candidate, components: Option<&StayComponents>) -> FeatureRow {
        let stay = &candidate.stay;
        let patient = self.store.patient(stay.subject_id);
        let admission = self.store.admission(stay.hadm_id);
        let outcomes = Outcomes::derive(stay, admission, patient);

        let mut row = FeatureRow {
            subject_id: stay.subject_id,
            hadm_id: stay.hadm_id,
            stay_id: stay.stay_id,
            intime: stay.intime,
            outtime: stay.outtime,
            icu_los_hours: stay.los_hours(),
            first_careunit: stay.first_careunit.clone(),
            gender: patient.and_then(|p| p.gender.clone()),
            age: patient.and_then(|p| p.age_at(stay.intime)),
            race: admission.and_then(|a| a.race.clone()),
            admission_type: admission.and_then(|a| a.admission_type.clone()),
            inclusion: candidate
                .inclusion()
                .map(|inclusion| inclusion.as_str().to_string()),
            suspected_infection_time: candidate
                .suspicion
                .as_ref()
                .map(|event| event.suspected_infection_time),
            sirs: candidate.sirs.total(),
            sofa: candidate.sofa.total(),
            death_48h: outcomes.death_48h,
            death_90d: outcomes.death_90d,
            hospital_death: outcomes.hospital_death,
            ..FeatureRow::default()
        };

        if let Some(components) = components {
            fill_components(&mut row, components);
        }
        row
    }
}

fn fill_components(row: &mut FeatureRow, components: &StayComponents) {
    let oasis = &components.oasis;
    row.oasis = oasis.total();
    row.oasis_prob = oasis.mortality_probability();
    row.preiculos_score = oasis.preiculos;
    row.age_score = oasis.age;
    row.gcs_score = oasis.gcs;
    row.heart_rate_score = oasis.heart_rate;
    row.mbp_score = oasis.mbp;
    row.resp_rate_score = oasis.resp_rate;
    row.temp_score = oasis.temp;
    row.urineoutput_score = oasis.urine_output;
    row.mechvent_score = oasis.mechvent;
    row.electivesurgery_score = oasis.electivesurgery;

    let features = &components.features;
    row.height_cm = features.anthropometry.height_cm;
    row.weight_kg = features.anthropometry.weight_kg;
    row.bmi = features.anthropometry.bmi;

    let vitals = &features.vitals;
    row.heart_rate_mean = mean(vitals.heart_rate);
    row.sbp_mean = mean(vitals.sbp);
    row.dbp_mean = mean(vitals.dbp);
    row.mbp_mean = mean(vitals.mbp);
    row.resp_rate_mean = mean(vitals.resp_rate);
    row.temperature_mean = mean(vitals.temperature);
    row.spo2_mean = mean(vitals.spo2);
    row.glucose_chart_mean = mean(vitals.glucose);
    row.gcs_min = vitals.gcs_min;

    let labs = &features.labs;
    row.wbc_mean = labs.mean(Concept::Wbc);
    row.hemoglobin_mean = labs.mean(Concept::Hemoglobin);
    row.hematocrit_mean = labs.mean(Concept::Hematocrit);
    row.platelets_mean = labs.mean(Concept::Platelets);
    row.neutrophils_mean = labs.mean(Concept::Neutrophils);
    row.lymphocytes_mean = labs.mean(Concept::Lymphocytes);
    row.bands_mean = labs.mean(Concept::Bands);
    row.sodium_mean = labs.mean(Concept::Sodium);
    row.potassium_mean = labs.mean(Concept::Potassium);
    row.chloride_mean = labs.mean(Concept::Chloride);
    row.bicarbonate_mean = labs.mean(Concept::Bicarbonate);
    row.bun_mean = labs.mean(Concept::Bun);
    row.creatinine_mean = labs.mean(Concept::Creatinine);
    row.glucose_mean = labs.mean(Concept::Glucose);
    row.calcium_mean = labs.mean(Concept::Calcium);
    row.ionized_calcium_mean = labs.mean(Concept::IonizedCalcium);
    row.magnesium_mean = labs.mean(Concept::Magnesium);
    row.phosphate_mean = labs.mean(Concept::Phosphate);
    row.anion_gap_mean = labs.mean(Concept::AnionGap);
    row.albumin_mean = labs.mean(Concept::Albumin);
    row.bilirubin_mean = labs.mean(Concept::Bilirubin);
    row.alt_mean = labs.mean(Concept::Alt);
    row.ast_mean = labs.mean(Concept::Ast);
    row.alp_mean = labs.mean(Concept::Alp);
    row.lactate_mean = labs.mean(Concept::Lactate);
    row.pt_mean = labs.mean(Concept::Pt);
    row.ptt_mean = labs.mean(Concept::Ptt);
    row.inr_mean = labs.mean(Concept::Inr);
    row.ph_mean = labs.mean(Concept::Ph);
    row.pao2_mean = labs.mean(Concept::Pao2);
    row.paco2_mean = labs.mean(Concept::Paco2);
    row.fio2_mean = features.fio2_mean;
    row.base_excess_mean = labs.mean(Concept::BaseExcess);
    row.nlr = features.nlr;
    row.pf_ratio = features.pf_ratio;
    row.urine_output = features.urine_output;

    row.vasopressor = features.vasopressors.vasopressor;
    row.norepinephrine_equivalent_max = features.vasopressors.norepinephrine_equivalent_max;
    row.mechanical_ventilation = features.procedures.mechanical_ventilation;
    row.renal_replacement_therapy = features.procedures.renal_replacement_therapy;
}
