//! Versioned item-code lookup
//!
//! Clinical concepts are recorded under several item codes (device
//! generations, lab analyser changes). Each query revision of the cohort
//! definition carried its own mapping; they are consolidated here into a base
//! table plus per-revision overrides. Building the map for a revision applies
//! every override up to and including it, later code sets replacing earlier
//! ones.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::models::ItemId;

/// Event table a concept is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTable {
    Chart,
    Lab,
    Output,
    Input,
    Procedure,
}

/// A measured clinical concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Concept {
    // Vitals
    HeartRate,
    SystolicBp,
    DiastolicBp,
    MeanBp,
    RespRate,
    TemperatureF,
    TemperatureC,
    Spo2,
    GlucoseChart,
    GcsEye,
    GcsVerbal,
    GcsMotor,
    FiO2,
    WeightKg,
    WeightLb,
    HeightCm,
    HeightIn,
    // Laboratory
    Wbc,
    Hemoglobin,
    Hematocrit,
    Platelets,
    Neutrophils,
    Lymphocytes,
    Bands,
    Sodium,
    Potassium,
    Chloride,
    Bicarbonate,
    Bun,
    Creatinine,
    Glucose,
    Calcium,
    IonizedCalcium,
    Magnesium,
    Phosphate,
    AnionGap,
    Albumin,
    Bilirubin,
    Alt,
    Ast,
    Alp,
    Lactate,
    Pt,
    Ptt,
    Inr,
    Ph,
    Pao2,
    Paco2,
    BaseExcess,
    // Outputs
    UrineOutput,
    GuIrrigantIn,
    // Procedures
    InvasiveVentilation,
    NonInvasiveVentilation,
    RenalReplacement,
    // Vasopressor infusions
    Norepinephrine,
    Epinephrine,
    Dopamine,
    Phenylephrine,
    Vasopressin,
}

impl Concept {
    /// Table the concept's events live in
    #[must_use]
    pub const fn table(self) -> EventTable {
        use Concept::*;
        match self {
            HeartRate | SystolicBp | DiastolicBp | MeanBp | RespRate | TemperatureF
            | TemperatureC | Spo2 | GlucoseChart | GcsEye | GcsVerbal | GcsMotor | FiO2
            | WeightKg | WeightLb | HeightCm | HeightIn => EventTable::Chart,
            UrineOutput | GuIrrigantIn => EventTable::Output,
            InvasiveVentilation | NonInvasiveVentilation | RenalReplacement => {
                EventTable::Procedure
            }
            Norepinephrine | Epinephrine | Dopamine | Phenylephrine | Vasopressin => {
                EventTable::Input
            }
            _ => EventTable::Lab,
        }
    }

    /// Vasopressors with a norepinephrine-equivalent conversion
    pub const VASOPRESSORS: [Self; 5] = [
        Self::Norepinephrine,
        Self::Epinephrine,
        Self::Dopamine,
        Self::Phenylephrine,
        Self::Vasopressin,
    ];
}

/// Revision of the item-code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeRevision {
    Initial,
    Revised,
    Latest,
}

impl CodeRevision {
    pub const ALL: [Self; 3] = [Self::Initial, Self::Revised, Self::Latest];

    /// The authoritative revision
    #[must_use]
    pub const fn latest() -> Self {
        Self::Latest
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Revised => "revised",
            Self::Latest => "latest",
        }
    }
}

impl fmt::Display for CodeRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodeRevision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|revision| revision.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown code revision '{s}' (expected initial, revised or latest)"))
    }
}

type CodeTable = &'static [(Concept, &'static [ItemId])];

/// Codes of the first query revision; every concept appears here
const BASE_CODES: CodeTable = &[
    (Concept::HeartRate, &[220045]),
    (Concept::SystolicBp, &[220050, 220179, 225309]),
    (Concept::DiastolicBp, &[220051, 220180, 225310]),
    (Concept::MeanBp, &[220052, 220181, 225312]),
    (Concept::RespRate, &[220210, 224690]),
    (Concept::TemperatureF, &[223761]),
    (Concept::TemperatureC, &[223762]),
    (Concept::Spo2, &[220277]),
    (Concept::GlucoseChart, &[225664, 220621, 226537]),
    (Concept::GcsEye, &[220739]),
    (Concept::GcsVerbal, &[223900]),
    (Concept::GcsMotor, &[223901]),
    (Concept::FiO2, &[223835]),
    (Concept::WeightKg, &[226512, 224639]),
    (Concept::WeightLb, &[226531]),
    (Concept::HeightCm, &[226730]),
    (Concept::HeightIn, &[226707]),
    (Concept::Wbc, &[51300, 51301]),
    (Concept::Hemoglobin, &[51222]),
    (Concept::Hematocrit, &[51221]),
    (Concept::Platelets, &[51265]),
    (Concept::Neutrophils, &[51256]),
    (Concept::Lymphocytes, &[51244]),
    (Concept::Bands, &[51144]),
    (Concept::Sodium, &[50983]),
    (Concept::Potassium, &[50971]),
    (Concept::Chloride, &[50902]),
    (Concept::Bicarbonate, &[50882]),
    (Concept::Bun, &[51006]),
    (Concept::Creatinine, &[50912]),
    (Concept::Glucose, &[50931]),
    (Concept::Calcium, &[50893]),
    (Concept::IonizedCalcium, &[50808]),
    (Concept::Magnesium, &[50960]),
    (Concept::Phosphate, &[50970]),
    (Concept::AnionGap, &[50868]),
    (Concept::Albumin, &[50862]),
    (Concept::Bilirubin, &[50885]),
    (Concept::Alt, &[50861]),
    (Concept::Ast, &[50878]),
    (Concept::Alp, &[50863]),
    (Concept::Lactate, &[50813]),
    (Concept::Pt, &[51274]),
    (Concept::Ptt, &[51275]),
    (Concept::Inr, &[51237]),
    (Concept::Ph, &[50820]),
    (Concept::Pao2, &[50821]),
    (Concept::Paco2, &[50818]),
    (Concept::BaseExcess, &[50802]),
    (
        Concept::UrineOutput,
        &[
            226559, 226560, 226561, 226584, 226563, 226564, 226565, 226567, 226557, 226558,
            227489,
        ],
    ),
    (Concept::GuIrrigantIn, &[227488]),
    (Concept::InvasiveVentilation, &[225792]),
    (Concept::NonInvasiveVentilation, &[225794]),
    (
        Concept::RenalReplacement,
        &[225802, 225803, 225805, 225809, 225955, 225441],
    ),
    (Concept::Norepinephrine, &[221906]),
    (Concept::Epinephrine, &[221289]),
    (Concept::Dopamine, &[221662]),
    (Concept::Phenylephrine, &[221749]),
    (Concept::Vasopressin, &[222315]),
];

/// Overrides introduced by the second query revision
const REVISED_CODES: CodeTable = &[(Concept::IonizedCalcium, &[50808, 51624])];

/// Overrides introduced by the latest query revision
const LATEST_CODES: CodeTable = &[
    (Concept::IonizedCalcium, &[50808]),
    (Concept::Pt, &[51274, 52921]),
    (Concept::Ptt, &[51275, 52923]),
    (Concept::Inr, &[51237, 51675]),
];

const fn overrides(revision: CodeRevision) -> CodeTable {
    match revision {
        CodeRevision::Initial => BASE_CODES,
        CodeRevision::Revised => REVISED_CODES,
        CodeRevision::Latest => LATEST_CODES,
    }
}

/// Concept-to-code mapping resolved for one revision
#[derive(Debug, Clone)]
pub struct ItemCodeMap {
    revision: CodeRevision,
    codes: FxHashMap<Concept, SmallVec<[ItemId; 4]>>,
    concepts: FxHashMap<(EventTable, ItemId), Concept>,
}

impl ItemCodeMap {
    /// Resolve the mapping for a revision
    #[must_use]
    pub fn for_revision(revision: CodeRevision) -> Self {
        let mut codes: FxHashMap<Concept, SmallVec<[ItemId; 4]>> = FxHashMap::default();
        for step in CodeRevision::ALL.into_iter().filter(|r| *r <= revision) {
            for (concept, items) in overrides(step) {
                codes.insert(*concept, SmallVec::from_slice(items));
            }
        }

        let concepts = codes
            .iter()
            .flat_map(|(concept, items)| {
                items
                    .iter()
                    .map(move |item| ((concept.table(), *item), *concept))
            })
            .collect();

        Self {
            revision,
            codes,
            concepts,
        }
    }

    /// Mapping for the authoritative revision
    #[must_use]
    pub fn latest() -> Self {
        Self::for_revision(CodeRevision::latest())
    }

    #[must_use]
    pub const fn revision(&self) -> CodeRevision {
        self.revision
    }

    /// Item codes of a concept; empty when the concept is unmapped
    #[must_use]
    pub fn codes(&self, concept: Concept) -> &[ItemId] {
        self.codes
            .get(&concept)
            .map_or(&[][..], |codes| codes.as_slice())
    }

    /// Union of the codes of several concepts
    #[must_use]
    pub fn codes_of(&self, concepts: &[Concept]) -> Vec<ItemId> {
        concepts
            .iter()
            .flat_map(|concept| self.codes(*concept).iter().copied())
            .unique()
            .collect()
    }

    /// Concept recorded under an item code in a table
    #[must_use]
    pub fn concept_of(&self, table: EventTable, itemid: ItemId) -> Option<Concept> {
        self.concepts.get(&(table, itemid)).copied()
    }

    /// Concepts whose code set differs between any two revisions
    ///
    /// These are data-provenance risks: the pipeline uses the selected
    /// revision as-is and reports the drift instead of reconciling it.
    #[must_use]
    pub fn provenance_conflicts() -> Vec<Concept> {
        let maps = CodeRevision::ALL.map(Self::for_revision);
        maps[0]
            .codes
            .keys()
            .copied()
            .filter(|concept| {
                maps.iter()
                    .map(|map| map.codes(*concept))
                    .tuple_windows()
                    .any(|(a, b)| a != b)
            })
            .sorted()
            .collect()
    }
}

impl Default for ItemCodeMap {
    fn default() -> Self {
        Self::latest()
    }
}
