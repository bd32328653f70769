//! Diagnosis code model
//!
//! Coded diagnoses (ICD-9 or ICD-10) attached to a hospital admission. The
//! cohort uses them for the SIRS inclusion path and the pregnancy exclusion,
//! both of which are prefix matches against fixed code sets.

use serde::{Deserialize, Serialize};

use crate::models::{HadmId, SubjectId};

/// ICD coding system of a diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IcdVersion {
    Icd9,
    Icd10,
}

impl IcdVersion {
    /// Map the numeric `icd_version` column
    #[must_use]
    pub const fn from_i64(version: i64) -> Option<Self> {
        match version {
            9 => Some(Self::Icd9),
            10 => Some(Self::Icd10),
            _ => None,
        }
    }
}

/// One coded diagnosis of an admission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisCode {
    pub subject_id: SubjectId,
    pub hadm_id: HadmId,
    /// Position in the admission's diagnosis list; 1 is the primary diagnosis
    pub seq_num: i64,
    /// Code without separators, upper case (e.g. `R6520`, `99591`)
    pub icd_code: String,
    pub icd_version: IcdVersion,
}

impl DiagnosisCode {
    /// Create a diagnosis, normalising the code to upper case without dots or spaces
    #[must_use]
    pub fn new(
        subject_id: SubjectId,
        hadm_id: HadmId,
        seq_num: i64,
        icd_code: &str,
        icd_version: IcdVersion,
    ) -> Self {
        Self {
            subject_id,
            hadm_id,
            seq_num,
            icd_code: normalize_code(icd_code),
            icd_version,
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !matches!(c, '.' | ' '))
        .collect::<String>()
        .to_uppercase()
}
