//! Configuration for the cohort pipeline.
//!
//! Every default reproduces the published cohort definition; a JSON file may
//! override any subset of fields.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::codes::CodeRevision;
use crate::error::{CohortError, Result};

/// Configuration for suspicion-of-infection pairing and the Sepsis-3 SOFA window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionConfig {
    /// Maximum hours a culture may precede the antibiotic it is paired with
    pub culture_before_antibiotic_hours: i64,
    /// Maximum hours a culture may follow the antibiotic it is paired with
    pub culture_after_antibiotic_hours: i64,
    /// Hours before the suspicion time covered by the SOFA window
    pub sofa_hours_before: i64,
    /// Hours after the suspicion time covered by the SOFA window
    pub sofa_hours_after: i64,
    /// Hours before ICU admission a suspicion event may still be attributed to the stay
    pub stay_lookback_hours: i64,
}

impl Default for SuspicionConfig {
    fn default() -> Self {
        Self {
            culture_before_antibiotic_hours: 48,
            culture_after_antibiotic_hours: 24,
            sofa_hours_before: 48,
            sofa_hours_after: 24,
            stay_lookback_hours: 24,
        }
    }
}

impl SuspicionConfig {
    #[must_use]
    pub fn culture_before(&self) -> Duration {
        Duration::hours(self.culture_before_antibiotic_hours)
    }

    #[must_use]
    pub fn culture_after(&self) -> Duration {
        Duration::hours(self.culture_after_antibiotic_hours)
    }

    #[must_use]
    pub fn stay_lookback(&self) -> Duration {
        Duration::hours(self.stay_lookback_hours)
    }
}

/// Where and how the cohort table is written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `cohort.csv`, `cohort.parquet` and `cohort_audit.json`
    pub output_dir: PathBuf,
    /// Write the CSV table (with header row)
    pub write_csv: bool,
    /// Write the Parquet table
    pub write_parquet: bool,
    /// Write the per-stage audit report
    pub write_audit: bool,
    /// Show a progress bar while computing per-stay components
    pub show_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            write_csv: true,
            write_parquet: true,
            write_audit: true,
            show_progress: true,
        }
    }
}

/// Configuration for the whole pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the source Parquet tables
    pub data_dir: PathBuf,
    /// Length of the observation window anchored at ICU admission
    pub observation_hours: i64,
    /// Stays shorter than this are excluded
    pub min_icu_hours: i64,
    /// Stays longer than this are excluded
    pub max_icu_hours: i64,
    /// Item-code revision used to resolve concepts
    pub code_revision: CodeRevision,
    /// Suspicion-of-infection parameters
    pub suspicion: SuspicionConfig,
    /// Worker threads for per-stay computation (defaults to the CPU count)
    pub threads: Option<usize>,
    /// Output settings
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            observation_hours: 24,
            min_icu_hours: 24,
            max_icu_hours: 2400,
            code_revision: CodeRevision::latest(),
            suspicion: SuspicionConfig::default(),
            threads: None,
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the data directory
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output.output_dir = output_dir.into();
        self
    }

    /// Select the item-code revision
    #[must_use]
    pub const fn with_code_revision(mut self, revision: CodeRevision) -> Self {
        self.code_revision = revision;
        self
    }

    /// Check that the duration bounds and windows are coherent
    pub fn validate(&self) -> Result<()> {
        if self.observation_hours <= 0 {
            return Err(CohortError::Config(format!(
                "observation_hours must be positive, got {}",
                self.observation_hours
            )));
        }
        if self.min_icu_hours < 0 || self.min_icu_hours > self.max_icu_hours {
            return Err(CohortError::Config(format!(
                "invalid ICU duration bounds [{}, {}]",
                self.min_icu_hours, self.max_icu_hours
            )));
        }
        if self.threads == Some(0) {
            return Err(CohortError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn observation_window(&self) -> Duration {
        Duration::hours(self.observation_hours)
    }

    #[must_use]
    pub fn min_icu_duration(&self) -> Duration {
        Duration::hours(self.min_icu_hours)
    }

    #[must_use]
    pub fn max_icu_duration(&self) -> Duration {
        Duration::hours(self.max_icu_hours)
    }

    /// Number of worker threads to use
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Data Directory: {}", self.data_dir.display())?;
        writeln!(f, "  Output Directory: {}", self.output.output_dir.display())?;
        writeln!(f, "  Observation Window: {}h", self.observation_hours)?;
        writeln!(
            f,
            "  ICU Duration: [{}h, {}h]",
            self.min_icu_hours, self.max_icu_hours
        )?;
        writeln!(f, "  Item Code Revision: {}", self.code_revision)?;
        writeln!(
            f,
            "  Culture Pairing: -{}h / +{}h",
            self.suspicion.culture_before_antibiotic_hours,
            self.suspicion.culture_after_antibiotic_hours
        )?;
        writeln!(
            f,
            "  Sepsis-3 SOFA Window: -{}h / +{}h",
            self.suspicion.sofa_hours_before, self.suspicion.sofa_hours_after
        )?;
        writeln!(f, "  Worker Threads: {}", self.worker_threads())
    }
}
