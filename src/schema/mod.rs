pub mod derive;
pub mod sanitize;
pub mod sql;
pub mod types;

pub use derive::{audit_samples, derive_schema, infer_type, is_null_marker, sanitize_header};
pub use sanitize::{is_valid_identifier, sanitize_column_name, Ident};
pub use sql::DuplicatePolicy;
pub use types::{ColumnType, SanitizedColumn, SchemaColumn, SchemaDescriptor, KEY_MAX_LEN};
