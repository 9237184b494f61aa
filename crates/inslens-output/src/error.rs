//! Error types for output generation.

use thiserror::Error;

/// Errors raised while projecting, rendering or exporting results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A pivot key does not split into the pivot dimensions
    #[error("Malformed pivot key {key:?}: expected {expected} parts")]
    MalformedKey {
        /// Offending key
        key: String,
        /// Number of pivot dimensions
        expected: usize,
    },

    /// The format is not available for this kind of output
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Lower-level data error
    #[error(transparent)]
    Data(#[from] inslens_data::DataError),

    /// CSV serialization error
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
