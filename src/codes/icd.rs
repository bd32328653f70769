//! ICD code sets used by the cohort definition
//!
//! A set holds code prefixes per coding system, the same way severe chronic
//! disease criteria are held as exact codes plus prefix patterns.

use crate::models::{DiagnosisCode, IcdVersion};

/// Prefix-matched diagnosis codes for ICD-9 and ICD-10
#[derive(Debug, Clone)]
pub struct IcdCodeSet {
    icd9_prefixes: &'static [&'static str],
    icd10_prefixes: &'static [&'static str],
}

/// Pregnancy, childbirth and the puerperium: ICD-9 630-679 and V22-V28
/// supervision codes, ICD-10 chapter XV and the Z3x pregnancy codes
const PREGNANCY_ICD9: &[&str] = &["63", "64", "65", "66", "67", "V22", "V23", "V24", "V27", "V28"];
const PREGNANCY_ICD10: &[&str] = &["O", "Z33", "Z34", "Z3A", "Z37", "Z39"];

/// Systemic inflammatory response: ICD-9 995.90-995.94, ICD-10 R65.1x/R65.2x
const SIRS_ICD9: &[&str] = &["99590", "99591", "99592", "99593", "99594"];
const SIRS_ICD10: &[&str] = &["R651", "R652"];

impl IcdCodeSet {
    /// Pregnancy-related diagnoses, used for the pregnancy exclusion
    #[must_use]
    pub const fn pregnancy() -> Self {
        Self {
            icd9_prefixes: PREGNANCY_ICD9,
            icd10_prefixes: PREGNANCY_ICD10,
        }
    }

    /// Systemic inflammatory response diagnoses, used for the SIRS inclusion path
    #[must_use]
    pub const fn sirs() -> Self {
        Self {
            icd9_prefixes: SIRS_ICD9,
            icd10_prefixes: SIRS_ICD10,
        }
    }

    /// Whether the diagnosis falls in this set
    #[must_use]
    pub fn contains(&self, diagnosis: &DiagnosisCode) -> bool {
        let prefixes = match diagnosis.icd_version {
            IcdVersion::Icd9 => self.icd9_prefixes,
            IcdVersion::Icd10 => self.icd10_prefixes,
        };
        prefixes
            .iter()
            .any(|prefix| diagnosis.icd_code.starts_with(prefix))
    }

    /// Whether any of the diagnoses falls in this set
    #[must_use]
    pub fn any<'a>(&self, diagnoses: impl IntoIterator<Item = &'a DiagnosisCode>) -> bool {
        diagnoses.into_iter().any(|diagnosis| self.contains(diagnosis))
    }
}
