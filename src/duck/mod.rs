use duckdb::{AccessMode, Config, Connection};
use std::path::Path;
use tracing::debug;

use crate::error::StoreError;
use crate::schema::{sql, Ident, SchemaDescriptor};

pub mod load;

pub use load::{load_table, LoadReport, SkippedRow};

/// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
pub fn open_disk_db<P: AsRef<Path>>(path: P) -> Result<Connection, StoreError> {
    Ok(Connection::open(path)?)
}

/// Open an existing database without taking the write lock.
pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Connection, StoreError> {
    let config = Config::default().access_mode(AccessMode::ReadOnly)?;
    Ok(Connection::open_with_flags(path, config)?)
}

/// Open a DuckDB in‐memory database
pub fn open_mem_db() -> Result<Connection, StoreError> {
    Ok(Connection::open_in_memory()?)
}

/// A column as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredColumn {
    pub name: String,
    pub data_type: String,
}

/// Columns of `table` in ordinal order; empty when the table does not exist.
pub fn table_columns(conn: &Connection, table: &Ident) -> Result<Vec<StoredColumn>, StoreError> {
    let mut stmt = conn.prepare(sql::TABLE_COLUMNS)?;
    let rows = stmt.query_map([table.as_str()], |row| {
        Ok(StoredColumn {
            name: row.get(0)?,
            data_type: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Whether `column` alone is the primary key of `table`.
pub fn has_primary_key(
    conn: &Connection,
    table: &Ident,
    column: &Ident,
) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        sql::PRIMARY_KEY_ON,
        [table.as_str(), column.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// `CREATE TABLE IF NOT EXISTS`, then check that whatever table is there has
/// exactly the layout of `schema`, keyed on its first column.
pub fn ensure_table(
    conn: &Connection,
    table: &Ident,
    schema: &SchemaDescriptor,
) -> Result<(), StoreError> {
    let ddl = sql::create_table(table, schema);
    debug!(sql = %ddl, "creating table");
    conn.execute_batch(&ddl)?;

    let found = table_columns(conn, table)?;
    let matches = found.len() == schema.len()
        && found.iter().zip(schema.columns()).all(|(stored, wanted)| {
            stored.name == wanted.name.as_str() && wanted.ty.matches_store_type(&stored.data_type)
        });

    let key = &schema.key().name;
    if matches && has_primary_key(conn, table, key)? {
        return Ok(());
    }

    let mut described = found
        .iter()
        .map(|c| format!("{} {}", c.name, c.data_type))
        .collect::<Vec<_>>()
        .join(", ");
    if matches {
        described.push_str(&format!("; no primary key on {key}"));
    }
    Err(StoreError::Conflict {
        table: table.to_string(),
        expected: schema.describe(),
        found: described,
    })
}
