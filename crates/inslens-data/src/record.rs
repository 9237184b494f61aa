//! Long-format fact rows.

use crate::{Dimension, ValueType, YearQuarter};
use serde::{Deserialize, Serialize};

/// One enriched observation.
///
/// `label` is only set by rank formatting: it carries the display string for
/// merged rank rows and for change rows beyond the infinity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Quarter of the observation
    pub year_quarter: YearQuarter,
    /// Insurance line code
    pub line: String,
    /// Insurer code, including synthetic `total` and `top-N`
    pub insurer: String,
    /// Metric code
    pub metric: String,
    /// Semantic role of `value`
    pub value_type: ValueType,
    /// Numeric value, missing when undefined
    pub value: Option<f64>,
    /// Formatted display value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Record {
    /// A `base` row.
    pub fn base(
        year_quarter: YearQuarter,
        line: impl Into<String>,
        insurer: impl Into<String>,
        metric: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            year_quarter,
            line: line.into(),
            insurer: insurer.into(),
            metric: metric.into(),
            value_type: ValueType::Base,
            value: Some(value),
            label: None,
        }
    }

    /// Same row with another value type and value.
    pub fn derive(&self, value_type: ValueType, value: Option<f64>) -> Self {
        Self {
            value_type,
            value,
            label: None,
            ..self.clone()
        }
    }

    /// String value of a dimension.
    pub fn dimension(&self, dimension: Dimension) -> String {
        match dimension {
            Dimension::Line => self.line.clone(),
            Dimension::Metric => self.metric.clone(),
            Dimension::Insurer => self.insurer.clone(),
            Dimension::ValueType => self.value_type.to_string(),
            Dimension::YearQuarter => self.year_quarter.to_string(),
        }
    }

    /// Display string: the label when present, the number otherwise.
    pub fn display_value(&self) -> Option<String> {
        self.label
            .clone()
            .or_else(|| self.value.filter(|v| v.is_finite()).map(|v| v.to_string()))
    }
}
