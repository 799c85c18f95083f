use datafusion::dataframe::DataFrame;
use datafusion::error::Result as DFResult;
use datafusion::prelude::{SessionConfig, SessionContext};

use crate::source::{BindError, SourceBinder};
use crate::transform::transform_query;

// ---------- session creation ----------

/// Session configuration for one run.
///
/// `shards` sets both the engine's target partitions and the minimum number of
/// files written in parallel by a sink, which is how output gets split into
/// per-worker CSV shards.
pub fn session_config(shards: usize) -> SessionConfig {
    let shards = shards.max(1);
    SessionConfig::new()
        .with_target_partitions(shards)
        .set_usize("datafusion.execution.minimum_parallel_output_files", shards)
}

// ---------- engine ----------

/// The run's engine session: a DataFusion context plus whatever source
/// connections its table providers hold. Dropping it releases them.
pub struct Engine {
    ctx: SessionContext,
    shards: usize,
}

impl Engine {
    pub fn new(shards: usize) -> Self {
        let ctx = SessionContext::new_with_config(session_config(shards));
        tracing::debug!(shards, "Engine session opened");
        Self { ctx, shards }
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Attach a source so its tables are queryable by name.
    pub async fn bind(&self, binder: &dyn SourceBinder) -> Result<Vec<String>, BindError> {
        let tables = binder.bind(&self.ctx).await?;
        tracing::info!(source = %binder.describe(), tables = ?tables, "Source bound");
        Ok(tables)
    }

    /// Plan the transform query against the bound tables.
    pub async fn transform(&self) -> DFResult<DataFrame> {
        self.ctx.sql(&transform_query()).await
    }

    /// Optimized logical plan of the transform, indented for display.
    pub async fn explain(&self) -> DFResult<String> {
        let plan = self.transform().await?.into_optimized_plan()?;
        Ok(plan.display_indent().to_string())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        tracing::debug!("Engine session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;

    #[test]
    fn session_config_sets_parallel_output() {
        let config = session_config(4);
        assert_eq!(config.target_partitions(), 4);
        assert_eq!(config.options().execution.minimum_parallel_output_files, 4);
        assert!(!config.options().catalog.information_schema);
    }

    #[test]
    fn zero_shards_clamped_to_one() {
        let config = session_config(0);
        assert_eq!(config.target_partitions(), 1);
        assert_eq!(config.options().execution.minimum_parallel_output_files, 1);
    }

    #[tokio::test]
    async fn transform_fails_before_bind() {
        let engine = Engine::new(1);
        let result = engine.transform().await;
        assert!(result.is_err(), "lineitem is not registered yet");
    }

    #[tokio::test]
    async fn explain_mentions_windows_and_sort() {
        let engine = Engine::new(2);
        engine.bind(&MemorySource::new()).await.unwrap();

        let plan = engine.explain().await.unwrap();
        assert!(plan.contains("WindowAggr"), "{plan}");
        assert!(plan.contains("Sort"), "{plan}");
        assert!(plan.contains("lineitem"), "{plan}");
    }
}
