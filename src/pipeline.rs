//! End-to-end cohort run
//!
//! Every stay is assessed (scores, suspicion, diagnosis flags), the cohort
//! filter reduces them to the eligible set, the survivors' features are
//! aggregated and the assembler joins everything into one row per stay.
//! Per-stay work runs on a rayon pool; results do not depend on the thread
//! count.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::algorithm::assembly::{CohortAssembler, FeatureRow, StayComponents, to_record_batch};
use crate::algorithm::cohort::{Candidate, CohortAudit, CohortFilter};
use crate::algorithm::context::StayContext;
use crate::codes::ItemCodeMap;
use crate::config::{OutputConfig, PipelineConfig};
use crate::error::{CohortError, Result};
use crate::models::StayId;
use crate::store::EventSource;
use crate::utils::io::{write_csv, write_parquet};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar, log_warning};

/// Result of a cohort run
#[derive(Debug, Clone, Default)]
pub struct CohortOutput {
    /// One row per cohort stay, ordered by (`subject_id`, `stay_id`)
    pub rows: Vec<FeatureRow>,
    pub audit: CohortAudit,
}

impl CohortOutput {
    /// The rows as an Arrow record batch with the cohort schema
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        to_record_batch(&self.rows)
    }
}

/// Runs the cohort definition against an event source
#[derive(Debug, Clone)]
pub struct CohortPipeline {
    config: PipelineConfig,
    codes: ItemCodeMap,
}

impl CohortPipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let codes = ItemCodeMap::for_revision(config.code_revision);
        Self { config, codes }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub const fn codes(&self) -> &ItemCodeMap {
        &self.codes
    }

    /// Build the cohort table
    pub fn run(&self, store: &dyn EventSource) -> Result<CohortOutput> {
        self.config.validate()?;
        let start = Instant::now();
        log::info!("Starting cohort construction");
        log::info!("{}", self.config);

        let conflicts: Vec<String> = ItemCodeMap::provenance_conflicts()
            .into_iter()
            .map(|concept| format!("{concept:?}"))
            .collect();
        if !conflicts.is_empty() {
            log_warning(
                &format!(
                    "Item codes differ between query revisions for {}; using the '{}' revision as-is",
                    conflicts.join(", "),
                    self.codes.revision()
                ),
                None,
            );
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads())
            .build()
            .map_err(|e| CohortError::Config(format!("Failed to build worker pool: {e}")))?;

        let (rows, mut audit) = pool.install(|| {
            let candidates = self.assess(store);
            let (survivors, audit) = CohortFilter::new(&self.config).run(candidates);
            let components = self.components(store, &survivors);
            let rows = CohortAssembler::new(store).assemble(&survivors, &components);
            (rows, audit)
        });

        audit.code_revision = Some(self.codes.revision());
        audit.provenance_conflicts = conflicts;
        log::info!("{}", audit.summary());
        log::info!(
            "Cohort construction finished with {} stays in {:?}",
            rows.len(),
            start.elapsed()
        );

        Ok(CohortOutput { rows, audit })
    }

    /// Scores, suspicion and diagnosis flags of every stay
    fn assess(&self, store: &dyn EventSource) -> Vec<Candidate> {
        let stays = store.stays();
        let pb = create_main_progress_bar(
            stays.len() as u64,
            Some("Assessing ICU stays"),
            self.config.output.show_progress,
        );

        let candidates: Vec<Candidate> = stays
            .par_iter()
            .map(|stay| {
                let ctx = StayContext::new(store, &self.codes, stay, self.config.observation_window());
                let candidate = Candidate::assess(&ctx, &self.config.suspicion);
                pb.inc(1);
                candidate
            })
            .collect();

        finish_progress_bar(&pb, &format!("Assessed {} stays", candidates.len()));
        candidates
    }

    /// Features and OASIS of the cohort stays
    fn components(
        &self,
        store: &dyn EventSource,
        cohort: &[Candidate],
    ) -> FxHashMap<StayId, StayComponents> {
        let pb = create_main_progress_bar(
            cohort.len() as u64,
            Some("Aggregating features"),
            self.config.output.show_progress,
        );

        let components: FxHashMap<StayId, StayComponents> = cohort
            .par_iter()
            .map(|candidate| {
                let ctx = StayContext::new(
                    store,
                    &self.codes,
                    &candidate.stay,
                    self.config.observation_window(),
                );
                let components = StayComponents::collect(&ctx);
                pb.inc(1);
                (candidate.stay.stay_id, components)
            })
            .collect();

        finish_progress_bar(&pb, &format!("Aggregated {} stays", components.len()));
        components
    }
}

/// Write the cohort table and audit report; returns the written paths
pub fn write_cohort(output: &CohortOutput, config: &OutputConfig) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.output_dir)?;
    let mut written = Vec::new();

    if config.write_csv || config.write_parquet {
        let batch = output.to_record_batch()?;
        if config.write_csv {
            let path = config.output_dir.join("cohort.csv");
            write_csv(&batch, &path)?;
            written.push(path);
        }
        if config.write_parquet {
            let path = config.output_dir.join("cohort.parquet");
            write_parquet(&batch, &path)?;
            written.push(path);
        }
    }

    if config.write_audit {
        let path = config.output_dir.join("cohort_audit.json");
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &output.audit)?;
        log::info!("Wrote cohort audit to {}", path.display());
        written.push(path);
    }

    Ok(written)
}
