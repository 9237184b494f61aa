//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or reshaping fact tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// Quarter string could not be parsed
    #[error("Invalid quarter: {0}")]
    InvalidQuarter(String),

    /// Unknown reporting form identifier
    #[error("Unknown reporting form: {0}")]
    UnknownForm(String),

    /// Unknown period type
    #[error("Unknown period type: {0}")]
    UnknownPeriodType(String),

    /// Unknown value type
    #[error("Unknown value type: {0}")]
    UnknownValueType(String),

    /// Unknown dimension name
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    /// Input table is missing required columns
    #[error("Missing columns in {source_name}: {columns:?}")]
    MissingColumns {
        /// File or table the columns were expected in
        source_name: String,
        /// Column names that were not found
        columns: Vec<String>,
    },

    /// A required cell was null
    #[error("Missing value in column {column} at row {row}")]
    MissingValue {
        /// Column name
        column: &'static str,
        /// Zero-based row index
        row: usize,
    },

    /// Malformed lookup table
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
