use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

pub const DEFAULT_SOURCE_TYPE: &str = "sqlite";
pub const DEFAULT_SOURCE_DB: &str = "./tpch.db";
pub const DEFAULT_OUTPUT_ROOT: &str = "./processed_data/wide_month_supplier_metrics";

// ---------- errors ----------

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: String, value: String, reason: String },
    InvalidPartitionKey { key: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value for {key} ({value:?}): {reason}")
            }
            ConfigError::InvalidPartitionKey { key, reason } => {
                write!(f, "Invalid partition key {key:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------- partition key ----------

fn partition_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:+-]{1,255}$").expect("valid pattern"))
}

/// Output folder name for one run, e.g. `2024-05-01T10:00:00`.
/// Guaranteed to be a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPartitionKey {
            key: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if raw == "." || raw == ".." {
            return Err(invalid("must not be a relative directory reference"));
        }
        if raw.len() > 255 {
            return Err(invalid("must be at most 255 bytes"));
        }
        if !partition_key_pattern().is_match(raw) {
            return Err(invalid(
                "only ASCII letters, digits and '_', '-', '.', ':', '+' are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PartitionKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------- existing partition policy ----------

/// What to do when the partition directory already holds files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingPartition {
    #[default]
    Fail,
    Replace,
}

impl FromStr for ExistingPartition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "error" => Ok(ExistingPartition::Fail),
            "replace" | "overwrite" => Ok(ExistingPartition::Replace),
            other => Err(format!("expected 'fail' or 'replace', got '{other}'")),
        }
    }
}

// ---------- pipeline config ----------

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_type: String,
    pub source_path: PathBuf,
    pub output_root: PathBuf,
    /// Parallel output files, also used as the engine's target partitions.
    pub output_shards: usize,
    pub on_existing_partition: ExistingPartition,
}

fn default_shards() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_type: DEFAULT_SOURCE_TYPE.to_string(),
            source_path: PathBuf::from(DEFAULT_SOURCE_DB),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            output_shards: default_shards(),
            on_existing_partition: ExistingPartition::default(),
        }
    }
}

impl PipelineConfig {
    /// Read `WMSM_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("WMSM_SOURCE_TYPE") {
            config.source_type = v;
        }
        if let Some(v) = lookup("WMSM_SOURCE_DB") {
            config.source_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("WMSM_OUTPUT_ROOT") {
            config.output_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("WMSM_OUTPUT_SHARDS") {
            config.output_shards = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(invalid_value("WMSM_OUTPUT_SHARDS", &v, "must be at least 1")),
                Err(e) => return Err(invalid_value("WMSM_OUTPUT_SHARDS", &v, &e.to_string())),
            };
        }
        if let Some(v) = lookup("WMSM_ON_EXISTING_PARTITION") {
            config.on_existing_partition = v
                .parse()
                .map_err(|reason: String| invalid_value("WMSM_ON_EXISTING_PARTITION", &v, &reason))?;
        }

        Ok(config)
    }

    pub fn partition_dir(&self, key: &PartitionKey) -> PathBuf {
        self.output_root.join(key.as_str())
    }
}

fn invalid_value(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
