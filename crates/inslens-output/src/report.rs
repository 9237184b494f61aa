//! Per-segment reports: title, table and chart.

use crate::chart::ChartSpec;
use crate::labels::LabelMapper;
use crate::pivot::PivotProjector;
use crate::table::TableSpec;
use chrono::{DateTime, Utc};
use inslens_data::{Dimension, ValueType};
use inslens_pipeline::{Layout, ProcessingContext, Segment};
use serde::Serialize;
use tracing::debug;

/// Everything a front end needs to show one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    /// Title built from the split values
    pub title: String,
    /// Dimensions fixed by the segment
    pub split_cols: Vec<Dimension>,
    /// Codes of the fixed dimension values
    pub split_values: Vec<String>,
    /// Table description
    pub table: TableSpec,
    /// Chart description
    pub chart: ChartSpec,
    /// Creation time
    pub generated_at: DateTime<Utc>,
}

impl SegmentReport {
    /// Build the report of one segment.
    pub fn new(
        segment: &Segment,
        layout: &Layout,
        labels: &LabelMapper,
        projector: &PivotProjector,
        shown: &[ValueType],
    ) -> Self {
        let title = labels.title(&segment.split_cols, &segment.split_values);
        let pivot = projector.project(segment, layout);
        debug!(
            title = %title,
            rows = pivot.rows.len(),
            columns = pivot.columns.len(),
            "segment projected"
        );
        Self {
            table: TableSpec::from_pivot(&pivot, labels, shown),
            chart: ChartSpec::from_pivot(&pivot, labels, &title),
            title,
            split_cols: segment.split_cols.clone(),
            split_values: segment.split_values.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// Reports for every segment of a processed context.
///
/// Returns nothing when the context has not been processed.
pub fn build_reports(
    ctx: &ProcessingContext,
    labels: &LabelMapper,
    projector: &PivotProjector,
) -> Vec<SegmentReport> {
    let Some(layout) = ctx.layout() else {
        return Vec::new();
    };
    let shown = &ctx.params().value_types;
    ctx.segments()
        .iter()
        .map(|segment| SegmentReport::new(segment, layout, labels, projector, shown))
        .collect()
}
