//! Statement text for the rate table.
//!
//! Only [`Ident`]s are spliced into statements; every data value is bound
//! through a `?` placeholder.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::sanitize::Ident;
use super::types::{ColumnType, SchemaDescriptor};

/// How a load treats rows whose key already exists in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Constraint violation; the whole batch rolls back.
    #[default]
    Fail,
    /// Keep the stored row.
    Ignore,
    /// Overwrite the stored row.
    Replace,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(DuplicatePolicy::Fail),
            "ignore" => Ok(DuplicatePolicy::Ignore),
            "replace" => Ok(DuplicatePolicy::Replace),
            other => Err(format!(
                "unknown duplicate policy `{other}` (expected fail, ignore or replace)"
            )),
        }
    }
}

impl DuplicatePolicy {
    fn insert_verb(self) -> &'static str {
        match self {
            DuplicatePolicy::Fail => "INSERT INTO",
            DuplicatePolicy::Ignore => "INSERT OR IGNORE INTO",
            DuplicatePolicy::Replace => "INSERT OR REPLACE INTO",
        }
    }
}

/// Columns of a table in ordinal order, bound to the table name.
pub const TABLE_COLUMNS: &str = "SELECT column_name, data_type \
     FROM information_schema.columns \
     WHERE table_name = ? AND table_schema = current_schema() \
     ORDER BY ordinal_position";

/// Number of single-column primary keys of a table on the given column,
/// bound to the table and column names.
pub const PRIMARY_KEY_ON: &str = "SELECT COUNT(*) \
     FROM duckdb_constraints() \
     WHERE table_name = ? AND schema_name = current_schema() \
       AND constraint_type = 'PRIMARY KEY' \
       AND len(constraint_column_names) = 1 \
       AND constraint_column_names[1] = ?";

pub fn create_table(table: &Ident, schema: &SchemaDescriptor) -> String {
    let defs: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| format!("    {} {}", c.name.quoted(), c.ty.definition()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        table.quoted(),
        defs.join(",\n")
    )
}

/// Positional insert; value cells are cast by the store.
pub fn insert(table: &Ident, schema: &SchemaDescriptor, policy: DuplicatePolicy) -> String {
    let names: Vec<String> = schema.names().map(Ident::quoted).collect();
    let placeholders: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| match c.ty {
            ColumnType::Key { .. } => "?".to_string(),
            ColumnType::Decimal { precision, scale } => {
                format!("CAST(? AS DECIMAL({precision}, {scale}))")
            }
        })
        .collect();
    format!(
        "{} {} ({}) VALUES ({})",
        policy.insert_verb(),
        table.quoted(),
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Single-row select on the first column. Every column comes back as text so
/// decimals keep their scale.
pub fn point_query(table: &Ident, columns: &[Ident]) -> Option<String> {
    let key = columns.first()?;
    let projection: Vec<String> = columns
        .iter()
        .map(|c| format!("CAST({} AS VARCHAR)", c.quoted()))
        .collect();
    Some(format!(
        "SELECT {} FROM {} WHERE {} = ?",
        projection.join(", "),
        table.quoted(),
        key.quoted()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::derive_schema;

    fn schema() -> SchemaDescriptor {
        derive_schema(&[
            "Service lbs".to_string(),
            "Rate A".to_string(),
            "Rate B".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn create_statement() {
        let table = Ident::new("shipping_rates").unwrap();
        assert_eq!(
            create_table(&table, &schema()),
            "CREATE TABLE IF NOT EXISTS \"shipping_rates\" (\n    \
             \"service_lbs\" VARCHAR(255) PRIMARY KEY,\n    \
             \"rate_a\" DECIMAL(10, 2),\n    \
             \"rate_b\" DECIMAL(10, 2)\n)"
        );
    }

    #[test]
    fn insert_statement_per_policy() {
        let table = Ident::new("rates").unwrap();
        let tail = "\"rates\" (\"service_lbs\", \"rate_a\", \"rate_b\") \
                    VALUES (?, CAST(? AS DECIMAL(10, 2)), CAST(? AS DECIMAL(10, 2)))";
        assert_eq!(
            insert(&table, &schema(), DuplicatePolicy::Fail),
            format!("INSERT INTO {tail}")
        );
        assert_eq!(
            insert(&table, &schema(), DuplicatePolicy::Ignore),
            format!("INSERT OR IGNORE INTO {tail}")
        );
        assert_eq!(
            insert(&table, &schema(), DuplicatePolicy::Replace),
            format!("INSERT OR REPLACE INTO {tail}")
        );
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("fail".parse(), Ok(DuplicatePolicy::Fail));
        assert_eq!(" Replace ".parse(), Ok(DuplicatePolicy::Replace));
        assert_eq!("IGNORE".parse(), Ok(DuplicatePolicy::Ignore));
        assert!("upsert".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn point_query_filters_on_first_column() {
        let table = Ident::new("rates").unwrap();
        let cols: Vec<Ident> = schema().names().cloned().collect();
        assert_eq!(
            point_query(&table, &cols).unwrap(),
            "SELECT CAST(\"service_lbs\" AS VARCHAR), CAST(\"rate_a\" AS VARCHAR), \
             CAST(\"rate_b\" AS VARCHAR) FROM \"rates\" WHERE \"service_lbs\" = ?"
        );
        assert!(point_query(&table, &[]).is_none());
    }
}
