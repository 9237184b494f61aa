//! Metric definitions.

use crate::Formula;
use derive_more::Display;
use inslens_data::ReportingForm;
use serde::{Deserialize, Serialize};

/// Unit class of a metric.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Monetary amount
    #[display("value")]
    Value,
    /// Monetary amount per unit
    #[display("average_value")]
    AverageValue,
    /// Count of contracts or claims
    #[display("quantity")]
    Quantity,
    /// Dimensionless ratio
    #[display("ratio")]
    Ratio,
}

impl MetricKind {
    /// Whether values add up across insurers, so shares of the total are meaningful.
    pub const fn is_additive(&self) -> bool {
        matches!(self, Self::Value | Self::Quantity)
    }
}

/// A metric: code, formula, kind, applicable forms and display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Unique code
    pub code: String,
    /// How the value is obtained
    pub formula: Formula,
    /// Unit class
    pub kind: MetricKind,
    /// Reporting forms that carry or can derive this metric
    pub forms: Vec<ReportingForm>,
    /// Display label
    pub label: String,
}

impl MetricDefinition {
    /// Create a definition.
    pub fn new(
        code: &str,
        formula: Formula,
        kind: MetricKind,
        forms: &[ReportingForm],
        label: &str,
    ) -> Self {
        Self {
            code: code.to_string(),
            formula,
            kind,
            forms: forms.to_vec(),
            label: label.to_string(),
        }
    }

    /// Whether the value is read directly from the input.
    pub fn is_base(&self) -> bool {
        self.formula.dependencies().is_empty()
    }

    /// Whether the metric applies to `form`.
    pub fn applies_to(&self, form: ReportingForm) -> bool {
        self.forms.contains(&form)
    }
}
