//! Top-level error type.

use thiserror::Error;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, InslensError>;

/// Errors surfaced by a [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum InslensError {
    /// Data layer error
    #[error(transparent)]
    Data(#[from] inslens_data::DataError),

    /// Metric registry error
    #[error(transparent)]
    Metric(#[from] inslens_metrics::MetricError),

    /// Validation or processing error
    #[error(transparent)]
    Pipeline(#[from] inslens_pipeline::PipelineError),

    /// Projection or export error
    #[error(transparent)]
    Output(#[from] inslens_output::OutputError),
}
