//! Cohort filter
//!
//! Five sequential stages turn the assessed stays into the eligible cohort.

pub mod audit;
pub mod candidate;
pub mod stages;

use crate::config::PipelineConfig;
use crate::utils::logging::log_stage;

pub use audit::{CohortAudit, StageCount};
pub use candidate::{Candidate, Inclusion};
pub use stages::{CohortStage, FilterCriteria, StayFilter, first_stay_per_subject};

/// The ordered stage list
#[derive(Debug, Clone)]
pub struct CohortFilter {
    stages: [CohortStage; 5],
}

impl CohortFilter {
    /// Stages configured from the pipeline settings
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            stages: [
                CohortStage::Diagnosis,
                CohortStage::FirstStay,
                CohortStage::Pregnancy,
                CohortStage::MinDuration(config.min_icu_duration()),
                CohortStage::MaxDuration(config.max_icu_duration()),
            ],
        }
    }

    #[must_use]
    pub const fn stages(&self) -> &[CohortStage] {
        &self.stages
    }

    /// Run every stage in order, recording survivor counts
    #[must_use]
    pub fn run(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, CohortAudit) {
        let total = self.stages.len();
        let mut audit = CohortAudit::new(candidates.len());
        let mut survivors = candidates;

        for (idx, stage) in self.stages.iter().enumerate() {
            let input = survivors.len();
            survivors = stage.apply(survivors);
            log_stage(idx + 1, total, stage.name(), input, survivors.len());
            audit.stages.push(StageCount {
                step: idx + 1,
                stage: stage.name().to_string(),
                input,
                survivors: survivors.len(),
            });
        }

        (survivors, audit)
    }
}

impl Default for CohortFilter {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}
