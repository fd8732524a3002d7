// src/lookup/store.rs

use duckdb::OptionalExt;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{path::PathBuf, str::FromStr};
use tracing::debug;

use super::key::LookupKey;
use crate::duck::{open_read_only, table_columns};
use crate::error::StoreError;
use crate::schema::{sql, Ident};

/// A stored cell, typed after the column it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Decimal(Decimal),
    Null,
}

/// One stored row, columns in table order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateRow {
    pub fields: Vec<(String, CellValue)>,
}

impl RateRow {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// Read side of the rate table.
///
/// Implementations are called from the blocking pool, one call per lookup,
/// and must not keep state between calls that changes their answers.
pub trait RateStore: Send + Sync + 'static {
    fn fetch_row(&self, key: &LookupKey) -> Result<Option<RateRow>, StoreError>;
}

/// DuckDB-backed store. Opens a read-only connection for every call.
#[derive(Debug, Clone)]
pub struct DuckRateStore {
    database: PathBuf,
    table: Ident,
}

impl DuckRateStore {
    pub fn new(database: impl Into<PathBuf>, table: Ident) -> Self {
        Self {
            database: database.into(),
            table,
        }
    }
}

impl RateStore for DuckRateStore {
    fn fetch_row(&self, key: &LookupKey) -> Result<Option<RateRow>, StoreError> {
        let conn = open_read_only(&self.database)?;

        // first column is the key by construction of the table
        let columns = table_columns(&conn, &self.table)?;
        if columns.is_empty() {
            return Err(StoreError::MissingTable(self.table.to_string()));
        }
        let idents = columns
            .iter()
            .map(|c| {
                Ident::new(c.name.clone())
                    .map_err(|_| StoreError::UnsupportedColumn(c.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let query = sql::point_query(&self.table, &idents)
            .ok_or_else(|| StoreError::MissingTable(self.table.to_string()))?;
        debug!(sql = %query, key = %key, "point query");

        let mut stmt = conn.prepare(&query)?;
        let cells = stmt
            .query_row([key.as_str()], |row| {
                (0..idents.len())
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<Result<Vec<_>, _>>()
            })
            .optional()?;

        Ok(cells.map(|cells| RateRow {
            fields: columns
                .iter()
                .zip(cells)
                .map(|(col, cell)| (col.name.clone(), typed_cell(&col.data_type, cell)))
                .collect(),
        }))
    }
}

fn typed_cell(data_type: &str, cell: Option<String>) -> CellValue {
    match cell {
        None => CellValue::Null,
        Some(text) if data_type.to_ascii_uppercase().starts_with("DECIMAL") => {
            match Decimal::from_str(&text) {
                Ok(value) => CellValue::Decimal(value),
                Err(_) => CellValue::Text(text),
            }
        }
        Some(text) => CellValue::Text(text),
    }
}
