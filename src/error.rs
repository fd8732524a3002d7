//! Error types for ingestion, storage and lookup.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with externally supplied configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    MissingVar { name: &'static str },

    #[error("{name} must be a number, got `{value}`")]
    InvalidNumber { name: &'static str, value: String },

    #[error("table name `{0}` is not a valid identifier")]
    InvalidTableName(String),

    #[error("query timeout must be greater than zero")]
    ZeroTimeout,

    #[error("reading config file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config file {path:?}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Failures while deriving a table layout from a header row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("a table needs a key and at least one value column, header has {found}")]
    TooFewColumns { found: usize },

    #[error("header cell {index} (`{original}`) sanitizes to an empty name")]
    EmptyColumnName { index: usize, original: String },

    #[error("header cells {first} and {second} both sanitize to `{name}`")]
    DuplicateColumnName {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),
}

/// Failures reported by the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] duckdb::Error),

    #[error("table `{0}` does not exist")]
    MissingTable(String),

    #[error("table `{table}` has columns [{found}], expected [{expected}]")]
    Conflict {
        table: String,
        expected: String,
        found: String,
    },

    #[error("key on line {line} is {len} characters, longer than {max}")]
    KeyTooLong { line: u64, len: usize, max: usize },

    #[error("table column `{0}` cannot be queried")]
    UnsupportedColumn(String),

    #[error("query timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("store worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input has no header row")]
    EmptyInput,

    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("decoding CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid header: {0}")]
    Schema(#[from] SchemaError),

    /// The table already exists with a layout that does not match the header.
    #[error("schema conflict: {0}")]
    SchemaConflict(StoreError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => IngestError::SchemaConflict(err),
            other => IngestError::Store(other),
        }
    }
}

impl From<duckdb::Error> for IngestError {
    fn from(err: duckdb::Error) -> Self {
        IngestError::Store(StoreError::Database(err))
    }
}

/// Outcome of a failed lookup. `Display` yields the caller-facing message.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid weight")]
    InvalidWeight,

    #[error("missing destination_zip")]
    MissingDestination,

    #[error("no rate found for weight {weight}")]
    NotFound { weight: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
