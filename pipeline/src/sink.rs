use datafusion::arrow::array::{Array, AsArray};
use datafusion::arrow::datatypes::{DataType, UInt64Type};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::config::CsvOptions;
use datafusion::dataframe::{DataFrame, DataFrameWriteOptions};
use datafusion::error::DataFusionError;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{ExistingPartition, PartitionKey};

// ---------- errors ----------

#[derive(Debug)]
pub enum SinkError {
    PartitionExists(PathBuf),
    Io { path: PathBuf, source: std::io::Error },
    Write(DataFusionError),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::PartitionExists(path) => write!(
                f,
                "Partition already exists: {} (set WMSM_ON_EXISTING_PARTITION=replace to overwrite)",
                path.display()
            ),
            SinkError::Io { path, source } => write!(f, "I/O error at {}: {source}", path.display()),
            SinkError::Write(e) => write!(f, "Write error: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------- partition directory ----------

/// Resolve `{root}/{key}` and apply the existing-partition policy.
/// On success the directory exists and is empty.
pub fn prepare_partition_dir(
    root: &Path,
    key: &PartitionKey,
    policy: ExistingPartition,
) -> Result<PathBuf, SinkError> {
    let dir = root.join(key.as_str());

    if dir.exists() {
        let occupied = !dir.is_dir()
            || std::fs::read_dir(&dir)
                .map_err(io_error(&dir))?
                .next()
                .is_some();
        if occupied {
            match policy {
                ExistingPartition::Fail => return Err(SinkError::PartitionExists(dir)),
                ExistingPartition::Replace => {
                    tracing::warn!(partition = %dir.display(), "Replacing existing partition");
                    if dir.is_dir() {
                        std::fs::remove_dir_all(&dir).map_err(io_error(&dir))?;
                    } else {
                        std::fs::remove_file(&dir).map_err(io_error(&dir))?;
                    }
                }
            }
        }
    }

    std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;
    Ok(dir)
}

// ---------- CSV shards ----------

#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub partition_dir: PathBuf,
    pub rows: u64,
    /// Shard files, sorted by name. Count and row assignment vary between runs.
    pub files: Vec<PathBuf>,
}

pub fn csv_options() -> CsvOptions {
    CsvOptions::default()
        .with_has_header(true)
        .with_delimiter(b',')
}

/// Sum of the `count` column DataFusion returns from a write.
fn written_rows(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter_map(|batch| batch.column_by_name("count"))
        .filter(|col| col.data_type() == &DataType::UInt64)
        .map(|col| col.as_primitive::<UInt64Type>().iter().flatten().sum::<u64>())
        .sum()
}

pub fn list_shards(dir: &Path) -> Result<Vec<PathBuf>, SinkError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_error(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    Ok(files)
}

/// Stream `df` into CSV shards under `dir` (header row in every shard).
pub async fn write_csv_shards(df: DataFrame, dir: &Path) -> Result<WriteSummary, SinkError> {
    // A trailing separator makes DataFusion treat the target as a directory of shards.
    let target = format!("{}/", dir.display());
    let result = df
        .write_csv(&target, DataFrameWriteOptions::new(), Some(csv_options()))
        .await
        .map_err(SinkError::Write)?;

    let summary = WriteSummary {
        partition_dir: dir.to_path_buf(),
        rows: written_rows(&result),
        files: list_shards(dir)?,
    };
    tracing::debug!(
        partition = %dir.display(),
        rows = summary.rows,
        files = summary.files.len(),
        "CSV shards written"
    );
    Ok(summary)
}
