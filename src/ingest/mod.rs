//! Table ingestion.
//!
//! The analysis core consumes a [`RawTable`]; where it came from is this
//! module's concern. Sources parse their format and infer column kinds, the
//! core never reads files itself.

mod csv_source;

pub use csv_source::{infer_column, is_null_token, CsvTableSource};

use thiserror::Error;

use crate::types::{RawTable, TableError};

/// Ingestion failures
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read CSV '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("CSV '{0}' has no header row")]
    MissingHeader(String),

    #[error("Invalid table from '{path}': {source}")]
    Table {
        path: String,
        #[source]
        source: TableError,
    },
}

/// Anything that can produce a table for analysis.
pub trait TableSource {
    /// Read the complete table.
    fn load(&mut self) -> Result<RawTable, IngestError>;

    /// Human-readable name for logging (e.g. a file path).
    fn source_name(&self) -> &str;
}
