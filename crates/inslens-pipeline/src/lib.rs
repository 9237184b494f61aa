#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/inslens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod params;
pub mod period;
pub mod pipeline;
pub mod splitter;
pub mod stages;

pub use config::PipelineConfig;
pub use context::{InputFrames, ProcessingContext, ProcessingOutcome};
pub use error::{PipelineError, Result};
pub use layout::Layout;
pub use orchestrator::Orchestrator;
pub use params::{InsurerSelection, QueryParams};
pub use period::{load_start_quarter, start_quarter};
pub use pipeline::{Pipeline, Stage, StageTiming};
pub use splitter::{DimensionOrders, DimensionalSplitter, Segment, ordered_insurers};
