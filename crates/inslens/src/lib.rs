#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/inslens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod session;

// Re-export main types from sub-crates
pub use inslens_data as data;
pub use inslens_metrics as metrics;
pub use inslens_output as output;
pub use inslens_pipeline as pipeline;

pub use error::{InslensError, Result};
pub use session::Session;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
