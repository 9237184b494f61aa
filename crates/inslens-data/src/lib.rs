#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/inslens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dimension;
pub mod error;
pub mod frame;
pub mod insurers;
pub mod lines;
pub mod loader;
pub mod quarter;
pub mod record;

pub use dimension::{
    ALL_INSURERS, Dimension, Insurer, PeriodType, ReportingForm, TOP_PREFIX, TOTAL_INSURER,
    ValueType,
};
pub use error::{DataError, Result};
pub use frame::{Frame, columns};
pub use insurers::InsurerDirectory;
pub use lines::LineHierarchy;
pub use loader::{load_csv, read_csv};
pub use quarter::YearQuarter;
pub use record::Record;

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
