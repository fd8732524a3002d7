// src/schema/types.rs

use serde::Serialize;

use super::sanitize::Ident;

/// Maximum length of the key column.
pub const KEY_MAX_LEN: u32 = 255;
/// Precision and scale of every value column.
pub const VALUE_PRECISION: u8 = 10;
pub const VALUE_SCALE: u8 = 2;

/// A header cell next to its sanitized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedColumn {
    pub original_name: String,
    pub normalized_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    /// String primary key.
    Key { max_len: u32 },
    /// Nullable fixed-precision decimal.
    Decimal { precision: u8, scale: u8 },
}

impl ColumnType {
    /// Column definition fragment used in `CREATE TABLE`.
    pub fn definition(&self) -> String {
        match self {
            ColumnType::Key { max_len } => format!("VARCHAR({max_len}) PRIMARY KEY"),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
        }
    }

    /// Whether a `data_type` reported by `information_schema.columns` is
    /// compatible with this column. The store drops VARCHAR lengths.
    pub fn matches_store_type(&self, data_type: &str) -> bool {
        let normalized: String = data_type
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        match self {
            ColumnType::Key { .. } => normalized.starts_with("VARCHAR"),
            ColumnType::Decimal { precision, scale } => {
                normalized == format!("DECIMAL({precision},{scale})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaColumn {
    pub original_name: String,
    pub name: Ident,
    pub ty: ColumnType,
}

/// Ordered table layout derived from one header row. Column 0 is the key.
///
/// Only built through [`super::derive_schema`], so it always holds a key plus
/// at least one value column, all with distinct valid names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    columns: Vec<SchemaColumn>,
}

impl SchemaDescriptor {
    pub(crate) fn from_columns(columns: Vec<SchemaColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn key(&self) -> &SchemaColumn {
        &self.columns[0]
    }

    pub fn values(&self) -> &[SchemaColumn] {
        &self.columns[1..]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &Ident> {
        self.columns.iter().map(|c| &c.name)
    }

    /// `name TYPE` pairs, used when reporting layout conflicts.
    pub fn describe(&self) -> String {
        self.columns
            .iter()
            .map(|c| match c.ty {
                ColumnType::Key { .. } => format!("{} VARCHAR", c.name),
                ColumnType::Decimal { .. } => format!("{} {}", c.name, c.ty.definition()),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_type_matching() {
        let key = ColumnType::Key { max_len: 255 };
        assert!(key.matches_store_type("VARCHAR"));
        assert!(key.matches_store_type("varchar(255)"));
        assert!(!key.matches_store_type("INTEGER"));

        let dec = ColumnType::Decimal {
            precision: 10,
            scale: 2,
        };
        assert!(dec.matches_store_type("DECIMAL(10,2)"));
        assert!(dec.matches_store_type("decimal(10, 2)"));
        assert!(!dec.matches_store_type("DECIMAL(18,3)"));
        assert!(!dec.matches_store_type("DOUBLE"));
    }

    #[test]
    fn definitions() {
        assert_eq!(
            ColumnType::Key { max_len: 255 }.definition(),
            "VARCHAR(255) PRIMARY KEY"
        );
        assert_eq!(
            ColumnType::Decimal {
                precision: 10,
                scale: 2
            }
            .definition(),
            "DECIMAL(10, 2)"
        );
    }
}
