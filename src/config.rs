//! Store location and table settings shared by the ingestor and the lookup
//! service. Built once and passed to both; nothing here is global.

use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;
use crate::schema::{is_valid_identifier, Ident};

pub const DEFAULT_TABLE: &str = "shipping_rates";
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_DB_PATH: &str = "RATES_DB_PATH";
pub const ENV_TABLE: &str = "RATES_TABLE";
pub const ENV_QUERY_TIMEOUT_MS: &str = "RATES_QUERY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// DuckDB database file.
    pub database: PathBuf,
    pub table: String,
    /// Upper bound on a single lookup, connection included.
    pub query_timeout: Duration,
}

/// On-disk YAML form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    database: PathBuf,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    query_timeout_ms: Option<u64>,
}

impl StoreConfig {
    pub fn new(database: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Read `RATES_DB_PATH` (required), `RATES_TABLE` and `RATES_QUERY_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = env::var(ENV_DB_PATH).map_err(|_| ConfigError::MissingVar {
            name: ENV_DB_PATH,
        })?;
        let table = env::var(ENV_TABLE).unwrap_or_else(|_| DEFAULT_TABLE.to_string());
        let mut config = Self::new(database, table);

        if let Ok(raw) = env::var(ENV_QUERY_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: ENV_QUERY_TIMEOUT_MS,
                value: raw.clone(),
            })?;
            config.query_timeout = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: FileConfig =
            serde_yaml::from_str(text).map_err(|source| ConfigError::ParseFile {
                path: origin.to_path_buf(),
                source,
            })?;

        let mut config = Self::new(
            file.database,
            file.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        );
        if let Some(ms) = file.query_timeout_ms {
            config.query_timeout = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_identifier(&self.table) {
            return Err(ConfigError::InvalidTableName(self.table.clone()));
        }
        if self.query_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// The table name as an identifier that may be spliced into statements.
    pub fn table_ident(&self) -> Result<Ident, ConfigError> {
        Ident::new(self.table.clone()).map_err(|_| ConfigError::InvalidTableName(self.table.clone()))
    }
}
