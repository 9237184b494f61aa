#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/inslens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod definition;
pub mod error;
pub mod formula;
pub mod registry;
pub mod standard;

pub use definition::{MetricDefinition, MetricKind};
pub use error::{MetricError, Result};
pub use formula::Formula;
pub use registry::MetricRegistry;
