#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/inslens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod error;
pub mod export;
pub mod labels;
pub mod pivot;
pub mod report;
pub mod table;

pub use chart::{ChartLayout, ChartSeries, ChartSpec};
pub use error::{OutputError, Result};
pub use export::{ExportFormat, ExportRow, Exporter};
pub use labels::LabelMapper;
pub use pivot::{Cell, PivotProjector, PivotRow, PivotTable};
pub use report::{SegmentReport, build_reports};
pub use table::{ColumnFormat, ColumnSpec, ColumnType, TableSpec};
