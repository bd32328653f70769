//! Survivor counts per cohort stage

use serde::{Deserialize, Serialize};

use crate::codes::CodeRevision;

/// Survivors of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub step: usize,
    pub stage: String,
    pub input: usize,
    pub survivors: usize,
}

impl StageCount {
    #[must_use]
    pub const fn excluded(&self) -> usize {
        self.input.saturating_sub(self.survivors)
    }
}

/// Audit trail of one cohort run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortAudit {
    /// Stays in the event store before any stage
    pub initial_stays: usize,
    pub stages: Vec<StageCount>,
    /// Item-code revision the run used
    pub code_revision: Option<CodeRevision>,
    /// Concepts whose item codes differ between revisions
    pub provenance_conflicts: Vec<String>,
}

impl CohortAudit {
    #[must_use]
    pub fn new(initial_stays: usize) -> Self {
        Self {
            initial_stays,
            ..Self::default()
        }
    }

    /// Stays left after the last stage
    #[must_use]
    pub fn final_stays(&self) -> usize {
        self.stages
            .last()
            .map_or(self.initial_stays, |stage| stage.survivors)
    }

    /// Survivors of the named stage
    #[must_use]
    pub fn survivors_of(&self, stage: &str) -> Option<usize> {
        self.stages
            .iter()
            .find(|count| count.stage == stage)
            .map(|count| count.survivors)
    }

    /// Human-readable summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Cohort Summary:\n");
        summary.push_str(&format!("  Initial Stays: {}\n", self.initial_stays));
        for stage in &self.stages {
            summary.push_str(&format!(
                "  {}. {}: {} -> {} ({} excluded)\n",
                stage.step,
                stage.stage,
                stage.input,
                stage.survivors,
                stage.excluded()
            ));
        }
        summary.push_str(&format!("  Final Cohort: {}\n", self.final_stays()));
        summary
    }
}
