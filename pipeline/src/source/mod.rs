use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod memory;
pub mod sqlite;

// ---------- tables ----------

/// The relational tables the transform reads. Registered under these exact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceTable {
    LineItem,
    Orders,
    Customer,
    Nation,
    Region,
    Part,
    Supplier,
    PartSupp,
}

impl SourceTable {
    pub const ALL: [SourceTable; 8] = [
        SourceTable::LineItem,
        SourceTable::Orders,
        SourceTable::Customer,
        SourceTable::Nation,
        SourceTable::Region,
        SourceTable::Part,
        SourceTable::Supplier,
        SourceTable::PartSupp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceTable::LineItem => "lineitem",
            SourceTable::Orders => "orders",
            SourceTable::Customer => "customer",
            SourceTable::Nation => "nation",
            SourceTable::Region => "region",
            SourceTable::Part => "part",
            SourceTable::Supplier => "supplier",
            SourceTable::PartSupp => "partsupp",
        }
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------- errors ----------

#[derive(Debug)]
pub enum BindError {
    NotFound(PathBuf),
    NotSqlite(PathBuf),
    Connect(String),
    MissingTable { table: SourceTable, message: String },
    Register(String),
    UnsupportedType(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::NotFound(path) => write!(f, "Source not found: {}", path.display()),
            BindError::NotSqlite(path) => {
                write!(f, "Source is not a SQLite database: {}", path.display())
            }
            BindError::Connect(msg) => write!(f, "Connection error: {msg}"),
            BindError::MissingTable { table, message } => {
                write!(f, "Source table '{table}' could not be loaded: {message}")
            }
            BindError::Register(msg) => write!(f, "Registration error: {msg}"),
            BindError::UnsupportedType(msg) => write!(f, "Unsupported type: {msg}"),
        }
    }
}

impl std::error::Error for BindError {}

// ---------- trait ----------

/// Makes the source tables queryable, under their original names, in a session.
#[async_trait]
pub trait SourceBinder: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Register every [`SourceTable`] in `ctx`. Returns the registered names.
    async fn bind(&self, ctx: &SessionContext) -> Result<Vec<String>, BindError>;
}

// ---------- factory ----------

pub fn create_binder(
    source_type: &str,
    path: &Path,
) -> Result<Box<dyn SourceBinder>, BindError> {
    match source_type {
        "sqlite" => Ok(Box::new(sqlite::SqliteSource::new(path))),
        other => Err(BindError::UnsupportedType(format!(
            "No source binder for source type: {other}"
        ))),
    }
}
