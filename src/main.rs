use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use sepsis_cohort::codes::CodeRevision;
use sepsis_cohort::store::{EventStore, LoadOptions};
use sepsis_cohort::{CohortPipeline, PipelineConfig, generate_store, write_cohort};

/// Build the sepsis/SIRS ICU cohort table
#[derive(Parser, Debug)]
#[command(name = "sepsis-cohort", version, about)]
struct Args {
    /// Directory holding the MIMIC-IV Parquet tables
    #[arg(short, long, env = "SEPSIS_COHORT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory receiving the cohort table and audit report
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file; absent fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Item-code revision (initial, revised or latest)
    #[arg(long)]
    revision: Option<CodeRevision>,

    /// Restrict loading to these subject ids
    #[arg(long, value_delimiter = ',')]
    subjects: Vec<i64>,

    /// Run against a seeded synthetic store with this many subjects
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed of the synthetic store
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Worker threads for per-stay computation
    #[arg(long)]
    threads: Option<usize>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to read configuration {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(data_dir) = &self.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(output_dir) = &self.output_dir {
            config = config.with_output_dir(output_dir);
        }
        if let Some(revision) = self.revision {
            config = config.with_code_revision(revision);
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if self.no_progress {
            config.output.show_progress = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.pipeline_config()?;

    let start = Instant::now();
    let store = match args.synthetic {
        Some(n_subjects) => {
            info!("Generating synthetic store for {n_subjects} subjects (seed {})", args.seed);
            generate_store(n_subjects, args.seed)
        }
        None => {
            info!("Loading source tables from: {}", config.data_dir.display());
            let options = if args.subjects.is_empty() {
                LoadOptions::default()
            } else {
                LoadOptions::with_subjects(args.subjects.iter().copied())
            };
            EventStore::load_async(config.data_dir.clone(), options)
                .await
                .with_context(|| format!("Failed to load tables from {}", config.data_dir.display()))?
        }
    };
    info!("Event store ready in {:?}: {}", start.elapsed(), store.summary());

    let output_config = config.output.clone();
    let output = tokio::task::spawn_blocking(move || CohortPipeline::new(config).run(&store))
        .await
        .context("Cohort task failed")??;

    let written = write_cohort(&output, &output_config).context("Failed to write cohort")?;
    for path in &written {
        info!("Wrote {}", path.display());
    }
    info!(
        "Cohort of {} stays ready in {:?}",
        output.rows.len(),
        start.elapsed()
    );
    Ok(())
}
