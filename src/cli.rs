//! Flags shared by the binaries.

use clap::Args;
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{StoreConfig, DEFAULT_TABLE, ENV_DB_PATH};
use crate::error::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// YAML file with `database`, `table` and `query_timeout_ms`; takes
    /// precedence over the flags below
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// DuckDB database file
    #[arg(long, env = "RATES_DB_PATH")]
    pub database: Option<PathBuf>,

    /// Rate table name
    #[arg(long, env = "RATES_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Lookup timeout in milliseconds
    #[arg(long, env = "RATES_QUERY_TIMEOUT_MS", default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

impl StoreArgs {
    pub fn to_config(&self) -> Result<StoreConfig, ConfigError> {
        if let Some(path) = &self.config {
            return StoreConfig::from_yaml_file(path);
        }
        let database = self
            .database
            .clone()
            .ok_or(ConfigError::MissingVar { name: ENV_DB_PATH })?;
        let config = StoreConfig::new(database, self.table.clone())
            .with_query_timeout(Duration::from_millis(self.query_timeout_ms));
        config.validate()?;
        Ok(config)
    }
}

/// `RUST_LOG`-driven fmt subscriber, `info` by default.
pub fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}
