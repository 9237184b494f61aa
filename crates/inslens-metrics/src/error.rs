//! Error types for metric definitions and evaluation.

use thiserror::Error;

/// Result type for metric operations.
pub type Result<T> = std::result::Result<T, MetricError>;

/// Errors raised by the metric registry.
#[derive(Debug, Error)]
pub enum MetricError {
    /// Selected metric has no definition and is not present in the input
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Registry definitions form a dependency cycle
    #[error("Cycle in metric registry: {}", .0.join(" -> "))]
    CycleInRegistry(Vec<String>),

    /// A definition depends on a code the registry does not define
    #[error("Metric {metric} depends on undefined metric {dependency}")]
    DanglingDependency {
        /// Metric declaring the dependency
        metric: String,
        /// Undefined dependency
        dependency: String,
    },

    /// Two definitions share a code
    #[error("Duplicate metric definition: {0}")]
    DuplicateMetric(String),

    /// Evaluation produced no finite value for one group
    #[error("Skipped {metric}: {reason}")]
    ArithmeticSkip {
        /// Metric being computed
        metric: String,
        /// Why the value was discarded
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
