use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::sanitize::{sanitize_column_name, Ident};
use super::types::{
    ColumnType, SanitizedColumn, SchemaColumn, SchemaDescriptor, KEY_MAX_LEN, VALUE_PRECISION,
    VALUE_SCALE,
};
use crate::error::SchemaError;

/// Stage 1: sanitize every header cell. Never fails.
pub fn sanitize_header(header: &[String]) -> Vec<SanitizedColumn> {
    header
        .iter()
        .map(|raw| SanitizedColumn {
            original_name: raw.clone(),
            normalized_name: sanitize_column_name(raw),
        })
        .collect()
}

/// Stage 2: the type of a column is fixed by its position.
pub fn infer_type(ordinal: usize) -> ColumnType {
    if ordinal == 0 {
        ColumnType::Key {
            max_len: KEY_MAX_LEN,
        }
    } else {
        ColumnType::Decimal {
            precision: VALUE_PRECISION,
            scale: VALUE_SCALE,
        }
    }
}

/// Build the table layout for a header row.
///
/// Rejects headers with fewer than two cells, cells that sanitize to nothing,
/// and cells whose sanitized names collide.
pub fn derive_schema(header: &[String]) -> Result<SchemaDescriptor, SchemaError> {
    if header.len() < 2 {
        return Err(SchemaError::TooFewColumns {
            found: header.len(),
        });
    }

    let mut seen: HashMap<String, usize> = HashMap::with_capacity(header.len());
    let mut columns = Vec::with_capacity(header.len());

    for (idx, col) in sanitize_header(header).into_iter().enumerate() {
        if col.normalized_name.is_empty() {
            return Err(SchemaError::EmptyColumnName {
                index: idx,
                original: col.original_name,
            });
        }
        if let Some(&first) = seen.get(&col.normalized_name) {
            return Err(SchemaError::DuplicateColumnName {
                name: col.normalized_name,
                first,
                second: idx,
            });
        }
        seen.insert(col.normalized_name.clone(), idx);

        let ty = infer_type(idx);
        debug!(
            original = %col.original_name,
            name = %col.normalized_name,
            ?ty,
            "derived column"
        );
        columns.push(SchemaColumn {
            name: Ident::new(col.normalized_name)?,
            original_name: col.original_name,
            ty,
        });
    }

    Ok(SchemaDescriptor::from_columns(columns))
}

/// Cells the transcription step writes for unreadable or missing prices.
pub fn is_null_marker(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("NA") || cell.eq_ignore_ascii_case("N/A")
}

/// Count, per value column, the cells that are neither null markers nor
/// decimals. Rows whose width differs from the schema are ignored.
///
/// Advisory only: the store performs the real conversion when loading.
pub fn audit_samples<'a, I>(schema: &SchemaDescriptor, rows: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut suspicious: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        if row.len() != schema.len() {
            continue;
        }
        for (col, cell) in schema.columns().iter().zip(row).skip(1) {
            if is_null_marker(cell) || cell.trim().parse::<Decimal>().is_ok() {
                continue;
            }
            *suspicious.entry(col.name.to_string()).or_default() += 1;
        }
    }

    for (column, count) in &suspicious {
        warn!(
            column = %column,
            count,
            "value column has cells that are not decimals; the load will fail on them"
        );
    }
    suspicious
}
