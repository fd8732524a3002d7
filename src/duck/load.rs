// src/duck/load.rs

use chrono::{DateTime, Utc};
use duckdb::{params_from_iter, Connection};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ensure_table;
use crate::error::{IngestError, StoreError};
use crate::process::RawRow;
use crate::schema::{
    is_null_marker, sql, ColumnType, DuplicatePolicy, Ident, SchemaDescriptor, KEY_MAX_LEN,
};

/// A data row left out of the load because its width did not match the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub cells: Vec<String>,
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub table: String,
    /// Rows the store reports as written.
    pub inserted: usize,
    pub skipped: Vec<SkippedRow>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Load `rows` into `table` inside a single transaction.
///
/// The table is created when missing and checked against `schema` when
/// present. Rows of the wrong width are skipped and reported; any store error
/// rolls back everything, table creation included. DuckDB ignores `VARCHAR`
/// lengths, so keys longer than [`KEY_MAX_LEN`] are rejected here.
#[tracing::instrument(level = "info", skip(conn, schema, rows), fields(table = %table, rows = rows.len()))]
pub fn load_table(
    conn: &mut Connection,
    table: &Ident,
    schema: &SchemaDescriptor,
    rows: &[RawRow],
    policy: DuplicatePolicy,
) -> Result<LoadReport, IngestError> {
    let started_at = Utc::now();
    let tx = conn.transaction()?;

    // 1) table must exist with our layout before anything is written
    ensure_table(&tx, table, schema)?;

    // 2) one prepared insert for the whole batch
    let insert = sql::insert(table, schema, policy);
    debug!(sql = %insert, "prepared insert");

    let mut inserted = 0usize;
    let mut skipped = Vec::new();
    {
        let mut stmt = tx.prepare(&insert)?;
        for row in rows {
            if row.cells.len() != schema.len() {
                warn!(
                    line = row.line,
                    expected = schema.len(),
                    found = row.cells.len(),
                    cells = ?row.cells,
                    "skipping malformed row"
                );
                skipped.push(SkippedRow {
                    line: row.line,
                    cells: row.cells.clone(),
                    expected: schema.len(),
                    found: row.cells.len(),
                });
                continue;
            }
            let key_len = row.cells[0].chars().count();
            if key_len > KEY_MAX_LEN as usize {
                return Err(StoreError::KeyTooLong {
                    line: row.line,
                    len: key_len,
                    max: KEY_MAX_LEN as usize,
                }
                .into());
            }
            inserted += stmt.execute(params_from_iter(bind_row(schema, &row.cells)))?;
        }
    }

    // 3) all or nothing
    tx.commit()?;

    info!(
        inserted,
        skipped = skipped.len(),
        ?policy,
        "load committed"
    );
    Ok(LoadReport {
        table: table.to_string(),
        inserted,
        skipped,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Key cells go in verbatim; value cells become NULL when they hold a null
/// marker and are otherwise left for the store to cast.
fn bind_row<'a>(schema: &SchemaDescriptor, cells: &'a [String]) -> Vec<Option<&'a str>> {
    schema
        .columns()
        .iter()
        .zip(cells)
        .map(|(col, cell)| match col.ty {
            ColumnType::Key { .. } => Some(cell.as_str()),
            ColumnType::Decimal { .. } if is_null_marker(cell) => None,
            ColumnType::Decimal { .. } => Some(cell.trim()),
        })
        .collect()
}
