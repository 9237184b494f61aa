//! English display labels.

use inslens_data::{
    Dimension, InsurerDirectory, LineHierarchy, PeriodType, ValueType, YearQuarter,
};
use inslens_metrics::{MetricKind, MetricRegistry};
use std::sync::Arc;

/// Maps codes to labels for tables and charts.
///
/// Lines and insurers without a directory entry are shown by code.
#[derive(Debug, Clone)]
pub struct LabelMapper {
    registry: Arc<MetricRegistry>,
    period_type: PeriodType,
    lines: Option<LineHierarchy>,
    insurers: Option<InsurerDirectory>,
}

impl LabelMapper {
    /// Create a mapper for a period type.
    pub const fn new(registry: Arc<MetricRegistry>, period_type: PeriodType) -> Self {
        Self {
            registry,
            period_type,
            lines: None,
            insurers: None,
        }
    }

    /// Use line labels from a hierarchy.
    pub fn with_lines(mut self, lines: LineHierarchy) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Use insurer labels from a directory.
    pub fn with_insurers(mut self, insurers: InsurerDirectory) -> Self {
        self.insurers = Some(insurers);
        self
    }

    /// Quarter a change at `quarter` is measured against.
    pub const fn previous(&self, quarter: YearQuarter) -> YearQuarter {
        match self.period_type {
            PeriodType::Qoq | PeriodType::CumulativeSum => quarter.offset(-1),
            PeriodType::Ytd | PeriodType::YoyQ | PeriodType::YoyY | PeriodType::Mat => {
                quarter.offset(-4)
            }
        }
    }

    /// Period label: `Q1 2024`, `6M 2024` for year-to-date.
    pub fn period(&self, quarter: YearQuarter) -> String {
        let (q, year) = (quarter.quarter(), quarter.year());
        match self.period_type {
            PeriodType::Qoq | PeriodType::YoyQ => format!("Q{q} {year}"),
            PeriodType::Ytd => format!("{}M {year}", u32::from(q) * 3),
            PeriodType::Mat | PeriodType::YoyY => format!("12M to Q{q} {year}"),
            PeriodType::CumulativeSum => format!("Up to Q{q} {year}"),
        }
    }

    /// Change label: `Q2 vs Q1` quarter on quarter, `2024 vs 2023` otherwise.
    pub fn change(&self, quarter: YearQuarter) -> String {
        let previous = self.previous(quarter);
        match self.period_type {
            PeriodType::Qoq | PeriodType::CumulativeSum => {
                format!("Q{} vs Q{}", quarter.quarter(), previous.quarter())
            }
            _ => format!("{} vs {}", quarter.year(), previous.year()),
        }
    }

    /// Value type label.
    pub const fn value_type(&self, value_type: ValueType) -> &'static str {
        match value_type {
            ValueType::Base => "Value",
            ValueType::BaseChange => "%Δ",
            ValueType::MarketShare => "Market share, %",
            ValueType::MarketShareChange => "Δ(pp)",
            ValueType::Rank => "Rank",
            ValueType::RankChange => "Rank change",
        }
    }

    /// Metric label with its unit.
    pub fn metric(&self, code: &str) -> String {
        let label = self.registry.label(code);
        match self.registry.kind_of(code) {
            MetricKind::Value | MetricKind::AverageValue => format!("{label}, ths"),
            MetricKind::Quantity => format!("{label}, units"),
            MetricKind::Ratio => label.to_string(),
        }
    }

    /// Line label.
    pub fn line(&self, code: &str) -> String {
        match self.lines.as_ref().map(|h| h.label(code)) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => code.to_string(),
        }
    }

    /// Insurer label.
    pub fn insurer(&self, code: &str) -> String {
        self.insurers
            .as_ref()
            .map_or_else(|| InsurerDirectory::default().label(code), |d| d.label(code))
    }

    /// Label of a dimension value given as its string form.
    pub fn dimension_value(&self, dimension: Dimension, value: &str) -> String {
        match dimension {
            Dimension::Line => self.line(value),
            Dimension::Metric => self.metric(value),
            Dimension::Insurer => self.insurer(value),
            Dimension::ValueType => value
                .parse::<ValueType>()
                .map_or_else(|_| value.to_string(), |vt| self.value_type(vt).to_string()),
            Dimension::YearQuarter => value
                .parse::<YearQuarter>()
                .map_or_else(|_| value.to_string(), |q| self.period(q)),
        }
    }

    /// Header levels of a pivot column, one per pivot dimension.
    ///
    /// The quarter of a change column is labelled with the compared periods.
    pub fn column_levels(&self, pivot: &[Dimension], parts: &[&str]) -> Vec<String> {
        let is_change = pivot
            .iter()
            .zip(parts)
            .find(|(d, _)| **d == Dimension::ValueType)
            .and_then(|(_, v)| v.parse::<ValueType>().ok())
            .is_some_and(|vt| vt.is_change());
        pivot
            .iter()
            .zip(parts)
            .map(|(dim, value)| match (dim, value.parse::<YearQuarter>()) {
                (Dimension::YearQuarter, Ok(q)) if is_change => self.change(q),
                _ => self.dimension_value(*dim, value),
            })
            .collect()
    }

    /// Segment title: labels of the split values joined with ` | `.
    pub fn title(&self, split_cols: &[Dimension], split_values: &[String]) -> String {
        split_cols
            .iter()
            .zip(split_values)
            .map(|(d, v)| self.dimension_value(*d, v))
            .collect::<Vec<String>>()
            .join(" | ")
    }
}
