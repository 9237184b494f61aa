//! Bar chart specification of a pivot table.

use crate::labels::LabelMapper;
use crate::pivot::PivotTable;
use inslens_data::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Headroom above the largest bar.
const RANGE_PADDING: f64 = 1.1;

/// One bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Legend entry
    pub name: String,
    /// Category positions of the bars
    pub x: Vec<String>,
    /// Bar heights
    pub y: Vec<f64>,
    /// Hover text template
    pub hovertemplate: String,
}

/// Axis and title settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    /// Chart title
    pub title: String,
    /// `v` for vertical bars
    pub orientation: String,
    /// Category codes in display order
    pub tickvals: Vec<String>,
    /// Category labels matching `tickvals`
    pub ticktext: Vec<String>,
    /// Value axis range
    pub range: [f64; 2],
}

/// Chart ready for a front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Categories in display order
    pub x: Vec<String>,
    /// Series, one per value of the first pivot dimension
    pub series: Vec<ChartSeries>,
    /// Layout
    pub layout: ChartLayout,
}

impl ChartSpec {
    /// Build a chart from a pivot table.
    ///
    /// Bars are grouped by the first index dimension, series follow the
    /// first pivot dimension. Labelled and empty cells are skipped.
    pub fn from_pivot(table: &PivotTable, labels: &LabelMapper, title: &str) -> Self {
        let x_dim = table.index.first().copied().unwrap_or(Dimension::Insurer);
        let series_dim = table.pivot.first().copied();

        let mut seen = HashSet::new();
        let x: Vec<String> = table
            .rows
            .iter()
            .filter_map(|row| row.index.first())
            .filter(|v| seen.insert(v.as_str()))
            .cloned()
            .collect();

        let mut series: Vec<ChartSeries> = Vec::new();
        for (c, key) in table.columns.iter().enumerate() {
            let series_value = series_dim
                .and_then(|d| table.column_value(key, d))
                .unwrap_or(key.as_str());
            let name = series_dim.map_or_else(
                || series_value.to_string(),
                |d| labels.dimension_value(d, series_value),
            );
            let position = match series.iter().position(|s| s.name == name) {
                Some(p) => p,
                None => {
                    series.push(ChartSeries {
                        hovertemplate: format!("{name}: %{{y}}<extra></extra>"),
                        name,
                        x: Vec::new(),
                        y: Vec::new(),
                    });
                    series.len() - 1
                }
            };
            for row in &table.rows {
                let (Some(category), Some(value)) = (
                    row.index.first(),
                    row.cells.get(c).and_then(Option::as_ref).and_then(|cell| cell.numeric()),
                ) else {
                    continue;
                };
                let entry = &mut series[position];
                if !entry.x.contains(category) {
                    entry.x.push(category.clone());
                    entry.y.push(value);
                }
            }
        }
        series.retain(|s| !s.y.is_empty());

        let max = series
            .iter()
            .flat_map(|s| s.y.iter().copied())
            .fold(0.0_f64, f64::max);
        let ticktext = x.iter().map(|v| labels.dimension_value(x_dim, v)).collect();

        Self {
            layout: ChartLayout {
                title: title.to_string(),
                orientation: "v".to_string(),
                tickvals: x.clone(),
                ticktext,
                range: [0.0, max * RANGE_PADDING],
            },
            x,
            series,
        }
    }

    /// Whether the chart has no bars.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
