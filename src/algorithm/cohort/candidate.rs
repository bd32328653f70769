//! Stay-level facts the cohort stages decide on

use serde::{Deserialize, Serialize};

use crate::algorithm::context::StayContext;
use crate::algorithm::infection::{SuspicionEvent, first_suspicion};
use crate::algorithm::scores::{SirsScore, SofaScore};
use crate::codes::IcdCodeSet;
use crate::config::SuspicionConfig;
use crate::models::IcuStay;

/// Why a stay passed the diagnosis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    /// SOFA >= 2 around a suspicion-of-infection event
    Sepsis3,
    /// A coded SIRS diagnosis on the stay's admission
    SirsDiagnosis,
    /// SIRS >= 2 with SOFA < 2
    SirsScore,
}

impl Inclusion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sepsis3 => "sepsis3",
            Self::SirsDiagnosis => "sirs_diagnosis",
            Self::SirsScore => "sirs_score",
        }
    }
}

/// A stay with the scores and flags needed by the cohort stages
#[derive(Debug, Clone)]
pub struct Candidate {
    pub stay: IcuStay,
    /// SIRS over the observation window
    pub sirs: SirsScore,
    /// SOFA over the observation window
    pub sofa: SofaScore,
    /// First suspicion-of-infection event attributed to the stay
    pub suspicion: Option<SuspicionEvent>,
    /// SOFA over the suspicion event's window
    pub sofa_at_suspicion: Option<SofaScore>,
    /// SIRS code on the stay's admission
    pub sirs_diagnosis: bool,
    /// Pregnancy code on any admission of the subject
    pub pregnancy: bool,
}

impl Candidate {
    /// Evaluate a stay's scores, suspicion event and diagnosis flags
    #[must_use]
    pub fn assess(ctx: &StayContext<'_>, suspicion_config: &SuspicionConfig) -> Self {
        let stay = ctx.stay;
        let diagnoses = ctx.store.diagnoses(stay.subject_id);
        let suspicion = first_suspicion(ctx.store, stay, suspicion_config);
        let sofa_at_suspicion = suspicion
            .as_ref()
            .map(|event| SofaScore::calculate(&ctx.with_window(event.sofa_window)));

        Self {
            stay: stay.clone(),
            sirs: SirsScore::calculate(ctx),
            sofa: SofaScore::calculate(ctx),
            suspicion,
            sofa_at_suspicion,
            sirs_diagnosis: IcdCodeSet::sirs().any(
                diagnoses
                    .iter()
                    .filter(|diagnosis| diagnosis.hadm_id == stay.hadm_id),
            ),
            pregnancy: IcdCodeSet::pregnancy().any(diagnoses),
        }
    }

    /// First inclusion path the stay satisfies
    ///
    /// A missing score fails every comparison it takes part in.
    #[must_use]
    pub fn inclusion(&self) -> Option<Inclusion> {
        let sofa_at_suspicion = self.sofa_at_suspicion.and_then(|sofa| sofa.total());
        if self.suspicion.is_some() && sofa_at_suspicion.is_some_and(|sofa| sofa >= 2) {
            return Some(Inclusion::Sepsis3);
        }
        if self.sirs_diagnosis {
            return Some(Inclusion::SirsDiagnosis);
        }
        let sirs = self.sirs.total();
        let sofa = self.sofa.total();
        if sirs.is_some_and(|sirs| sirs >= 2) && sofa.is_some_and(|sofa| sofa < 2) {
            return Some(Inclusion::SirsScore);
        }
        None
    }
}
