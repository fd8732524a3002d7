//! Batch ingestion: transcript text in, populated rate table out.

use std::path::Path;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::duck::{self, LoadReport};
use crate::error::{ConfigError, IngestError};
use crate::process::RawTable;
use crate::schema::{audit_samples, derive_schema, DuplicatePolicy, Ident};

/// Single-writer loader for one configured table.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: StoreConfig,
    table: Ident,
    policy: DuplicatePolicy,
}

impl Ingestor {
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = config.table_ident()?;
        Ok(Self {
            config,
            table,
            policy: DuplicatePolicy::default(),
        })
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn ingest_file<P: AsRef<Path>>(&self, path: P) -> Result<LoadReport, IngestError> {
        let raw = RawTable::from_path(path)?;
        self.ingest_table(&raw)
    }

    pub fn ingest_text(&self, text: &str) -> Result<LoadReport, IngestError> {
        let raw = RawTable::from_transcript(text)?;
        self.ingest_table(&raw)
    }

    /// Derive the layout from the header, then load every row in one
    /// transaction on a connection that lives only for this call.
    #[tracing::instrument(level = "info", skip(self, raw), fields(table = %self.table, db = %self.config.database.display()))]
    pub fn ingest_table(&self, raw: &RawTable) -> Result<LoadReport, IngestError> {
        let schema = derive_schema(&raw.header)?;
        info!(columns = schema.len(), rows = raw.rows.len(), "derived schema");

        let suspicious = audit_samples(&schema, raw.rows.iter().map(|r| r.cells.as_slice()));
        if !suspicious.is_empty() {
            warn!(columns = suspicious.len(), "some value cells will not convert to decimals");
        }

        let mut conn = duck::open_disk_db(&self.config.database)?;
        let report = duck::load_table(&mut conn, &self.table, &schema, &raw.rows, self.policy)?;
        info!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            "ingestion finished"
        );
        Ok(report)
    }
}
