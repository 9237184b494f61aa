//! Error types for pipeline runs.

use inslens_data::{DataError, ReportingForm};
use inslens_metrics::MetricError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while validating or running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Query parameters are invalid; the pipeline does not run
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// No fact table is loaded for the requested form
    #[error("No input table loaded for reporting form {0}")]
    MissingForm(ReportingForm),

    /// Metric registry error, including unknown selected metrics
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Data layer error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
