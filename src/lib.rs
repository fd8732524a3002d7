pub mod cli;
pub mod config;
pub mod duck;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod process;
pub mod schema;

pub use config::StoreConfig;
pub use error::{ConfigError, IngestError, LookupError, SchemaError, StoreError};
pub use ingest::Ingestor;
pub use lookup::{LookupService, RateQuote};
