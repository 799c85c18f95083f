use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use datafusion::sql::TableReference;
use datafusion_table_providers::{
    sql::db_connection_pool::{Mode, sqlitepool::SqliteConnectionPoolFactory},
    sqlite::SqliteTableFactory,
};
use futures::future::try_join_all;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{BindError, SourceBinder, SourceTable};

/// Every SQLite database file starts with this 16-byte header.
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Binds the tables of a SQLite file through the `datafusion-table-providers` loader.
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Reject anything that is not an existing SQLite file before the loader opens it.
/// The loader would otherwise create an empty database at a missing path.
fn check_sqlite_file(path: &Path) -> Result<(), BindError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BindError::NotFound(path.to_path_buf()),
        _ => BindError::Connect(format!("cannot open {}: {e}", path.display())),
    })?;

    if file
        .metadata()
        .map_err(|e| BindError::Connect(e.to_string()))?
        .is_dir()
    {
        return Err(BindError::NotSqlite(path.to_path_buf()));
    }

    let mut header = [0u8; 16];
    match file.read_exact(&mut header) {
        Ok(()) if &header == SQLITE_MAGIC => Ok(()),
        Ok(()) => Err(BindError::NotSqlite(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(BindError::NotSqlite(path.to_path_buf()))
        }
        Err(e) => Err(BindError::Connect(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}

#[async_trait]
impl SourceBinder for SqliteSource {
    fn describe(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    async fn bind(&self, ctx: &SessionContext) -> Result<Vec<String>, BindError> {
        check_sqlite_file(&self.path)?;

        let path = self
            .path
            .to_str()
            .ok_or_else(|| BindError::Connect(format!("non UTF-8 path: {}", self.path.display())))?;

        let pool = SqliteConnectionPoolFactory::new(path, Mode::File, BUSY_TIMEOUT)
            .build()
            .await
            .map_err(|e| BindError::Connect(format!("Failed to open SQLite pool: {e}")))?;
        let factory = SqliteTableFactory::new(Arc::new(pool));

        // Schema inference runs one query per table; issue them together.
        let providers = try_join_all(SourceTable::ALL.into_iter().map(|table| {
            let factory = &factory;
            async move {
                factory
                    .table_provider(TableReference::bare(table.name()))
                    .await
                    .map(|provider| (table, provider))
                    .map_err(|e| BindError::MissingTable {
                        table,
                        message: e.to_string(),
                    })
            }
        }))
        .await?;

        let mut registered = Vec::with_capacity(providers.len());
        for (table, provider) in providers {
            ctx.register_table(table.name(), provider)
                .map_err(|e| BindError::Register(format!("{table}: {e}")))?;
            tracing::debug!(table = %table, "Registered SQLite table");
            registered.push(table.name().to_string());
        }

        Ok(registered)
    }
}
