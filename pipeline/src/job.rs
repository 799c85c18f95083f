//! One pipeline run: bind source → transform → write partition → release engine.

use datafusion::error::DataFusionError;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{PartitionKey, PipelineConfig};
use crate::engine::Engine;
use crate::sink::{self, SinkError};
use crate::source::{BindError, SourceBinder, create_binder};

// ---------- errors ----------

#[derive(Debug)]
pub enum PipelineError {
    Bind(BindError),
    Query(DataFusionError),
    Sink(SinkError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Bind(e) => write!(f, "Source binding failed: {e}"),
            PipelineError::Query(e) => write!(f, "Query failed: {e}"),
            PipelineError::Sink(e) => write!(f, "Output failed: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<BindError> for PipelineError {
    fn from(e: BindError) -> Self {
        PipelineError::Bind(e)
    }
}

impl From<DataFusionError> for PipelineError {
    fn from(e: DataFusionError) -> Self {
        PipelineError::Query(e)
    }
}

impl From<SinkError> for PipelineError {
    fn from(e: SinkError) -> Self {
        PipelineError::Sink(e)
    }
}

// ---------- run ----------

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub partition_dir: PathBuf,
    pub tables: Vec<String>,
    pub rows: u64,
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Run against the source named in `config`.
pub async fn run(config: &PipelineConfig, key: &PartitionKey) -> Result<RunSummary, PipelineError> {
    let binder = create_binder(&config.source_type, &config.source_path)?;
    run_with_source(binder.as_ref(), config, key).await
}

/// Run against an explicit binder. The engine session lives only inside this
/// call and is released on every exit path.
pub async fn run_with_source(
    binder: &dyn SourceBinder,
    config: &PipelineConfig,
    key: &PartitionKey,
) -> Result<RunSummary, PipelineError> {
    let started = Instant::now();
    let engine = Engine::new(config.output_shards);

    let tables = engine.bind(binder).await?;
    let df = engine.transform().await?;

    // The partition is only touched once the query has planned successfully.
    let partition_dir =
        sink::prepare_partition_dir(&config.output_root, key, config.on_existing_partition)?;
    tracing::info!(
        partition = %partition_dir.display(),
        shards = engine.shards(),
        "Writing monthly metrics"
    );

    let written = sink::write_csv_shards(df, &partition_dir).await?;
    drop(engine);

    let summary = RunSummary {
        partition_dir: written.partition_dir,
        tables,
        rows: written.rows,
        files: written.files,
        elapsed: started.elapsed(),
    };
    tracing::info!(
        partition = %summary.partition_dir.display(),
        rows = summary.rows,
        files = summary.files.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Pipeline run complete"
    );
    Ok(summary)
}

/// Bind the source and return the optimized transform plan without writing.
pub async fn explain(config: &PipelineConfig) -> Result<String, PipelineError> {
    let binder = create_binder(&config.source_type, &config.source_path)?;
    explain_with_source(binder.as_ref(), config).await
}

pub async fn explain_with_source(
    binder: &dyn SourceBinder,
    config: &PipelineConfig,
) -> Result<String, PipelineError> {
    let engine = Engine::new(config.output_shards);
    engine.bind(binder).await?;
    Ok(engine.explain().await?)
}
