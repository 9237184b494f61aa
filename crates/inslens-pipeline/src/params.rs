//! User selections consumed by the orchestrator.

use crate::{PipelineConfig, PipelineError, Result};
use inslens_data::{
    ALL_INSURERS, Dimension, Insurer, PeriodType, ReportingForm, TOTAL_INSURER, ValueType,
    YearQuarter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which insurers the result shows.
///
/// Serialized as the list of codes the UI sends. A `top-N` code anywhere in
/// the list wins and discards the other codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum InsurerSelection {
    /// All real insurers ranked, followed by the market total
    Total,
    /// The N largest insurers followed by the synthetic `top-N` row
    TopN(u32),
    /// All real insurers ranked
    All,
    /// An explicit list of codes
    Specific(Vec<String>),
}

impl InsurerSelection {
    /// Whether the selection is a top-N view.
    pub const fn is_top_n(&self) -> bool {
        matches!(self, Self::TopN(_))
    }
}

impl From<Vec<String>> for InsurerSelection {
    fn from(codes: Vec<String>) -> Self {
        if codes.is_empty() {
            return Self::Total;
        }
        if let Some(n) = codes.iter().find_map(|c| match Insurer::parse(c) {
            Insurer::TopN(n) => Some(n),
            _ => None,
        }) {
            return Self::TopN(n);
        }
        if codes.iter().any(|c| c == ALL_INSURERS) {
            return Self::All;
        }
        if codes.len() == 1 && codes[0] == TOTAL_INSURER {
            return Self::Total;
        }
        Self::Specific(codes)
    }
}

impl From<InsurerSelection> for Vec<String> {
    fn from(selection: InsurerSelection) -> Self {
        match selection {
            InsurerSelection::Total => vec![TOTAL_INSURER.to_string()],
            InsurerSelection::TopN(n) => vec![Insurer::top_n_code(n)],
            InsurerSelection::All => vec![ALL_INSURERS.to_string()],
            InsurerSelection::Specific(codes) => codes,
        }
    }
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Reporting form whose table is processed
    pub reporting_form: ReportingForm,
    /// Last quarter of the result
    pub end_quarter: YearQuarter,
    /// Comparison period type
    pub period_type: PeriodType,
    /// Number of periods shown, `1..=6`
    pub num_periods: usize,
    /// Selected line codes
    pub lines: Vec<String>,
    /// Selected metric codes
    pub metrics: Vec<String>,
    /// Selected insurers
    pub insurers: InsurerSelection,
    /// Selected value types
    pub value_types: Vec<ValueType>,
    /// Dimensions identifying table rows
    pub index_cols: Vec<Dimension>,
    /// Dimensions combined into table columns
    pub pivot_cols: Vec<Dimension>,
    /// Dimensions fanned out into separate segments
    pub split_cols: Vec<Dimension>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            reporting_form: ReportingForm::Form162,
            end_quarter: YearQuarter::from_index(2024 * 4 + 3),
            period_type: PeriodType::Qoq,
            num_periods: 2,
            lines: Vec::new(),
            metrics: vec!["total_premiums".to_string()],
            insurers: InsurerSelection::Total,
            value_types: vec![ValueType::Base],
            index_cols: vec![Dimension::Insurer],
            pivot_cols: vec![Dimension::Metric],
            split_cols: vec![Dimension::Line],
        }
    }
}

impl QueryParams {
    /// Largest accepted `num_periods`.
    pub const MAX_PERIODS: usize = 6;

    /// Whether `value_type` is selected.
    pub fn wants(&self, value_type: ValueType) -> bool {
        self.value_types.contains(&value_type)
    }

    /// Check the parameters before any stage runs.
    pub fn validate(&self, config: &PipelineConfig) -> Result<()> {
        let invalid = |msg: String| Err(PipelineError::InputValidation(msg));

        if !(1..=Self::MAX_PERIODS).contains(&self.num_periods) {
            return invalid(format!(
                "num_periods must be in 1..={}, got {}",
                Self::MAX_PERIODS,
                self.num_periods
            ));
        }
        if self.lines.is_empty() {
            return invalid("no lines selected".to_string());
        }
        if self.metrics.is_empty() {
            return invalid("no metrics selected".to_string());
        }
        if self.value_types.is_empty() {
            return invalid("no value types selected".to_string());
        }
        if self.wants(ValueType::RankChange) {
            return invalid("rank_change is derived from rank and cannot be selected".to_string());
        }
        if let InsurerSelection::TopN(n) = self.insurers
            && !config.top_n_thresholds.contains(&n)
        {
            return invalid(format!(
                "top-{n} is not one of the configured thresholds {:?}",
                config.top_n_thresholds
            ));
        }

        let mut seen = HashSet::new();
        let layout_dims = self
            .index_cols
            .iter()
            .chain(&self.pivot_cols)
            .chain(&self.split_cols)
            .filter(|d| Dimension::SELECTABLE.contains(d));
        for dim in layout_dims {
            if !seen.insert(*dim) {
                return invalid(format!("dimension {dim} appears in more than one layout role"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn valid() -> QueryParams {
        QueryParams {
            lines: strings(&["auto"]),
            ..QueryParams::default()
        }
    }

    #[rstest]
    #[case(&[], InsurerSelection::Total)]
    #[case(&["total"], InsurerSelection::Total)]
    #[case(&["top-10"], InsurerSelection::TopN(10))]
    #[case(&["ins_a", "top-5"], InsurerSelection::TopN(5))]
    #[case(&["all_insurers"], InsurerSelection::All)]
    #[case(&["ins_a", "total"], InsurerSelection::Specific(vec!["ins_a".to_string(), "total".to_string()]))]
    fn test_selection_from_codes(#[case] codes: &[&str], #[case] expected: InsurerSelection) {
        assert_eq!(InsurerSelection::from(strings(codes)), expected);
    }

    #[test]
    fn test_params_from_json() {
        let json = r#"{
            "reporting_form": "0420162",
            "end_quarter": "2024Q2",
            "period_type": "yoy-q",
            "num_periods": 3,
            "lines": ["auto"],
            "metrics": ["direct_premiums"],
            "insurers": ["top-5"],
            "value_types": ["base", "market_share"]
        }"#;
        let params: QueryParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.period_type, PeriodType::YoyQ);
        assert_eq!(params.insurers, InsurerSelection::TopN(5));
        assert!(params.wants(ValueType::MarketShare));
        assert_eq!(params.index_cols, vec![Dimension::Insurer]);
        params.validate(&PipelineConfig::default()).unwrap();
    }

    #[rstest]
    #[case(QueryParams { num_periods: 0, ..valid() })]
    #[case(QueryParams { num_periods: 7, ..valid() })]
    #[case(QueryParams { lines: vec![], ..valid() })]
    #[case(QueryParams { metrics: vec![], ..valid() })]
    #[case(QueryParams { value_types: vec![], ..valid() })]
    #[case(QueryParams { value_types: vec![ValueType::RankChange], ..valid() })]
    #[case(QueryParams { insurers: InsurerSelection::TopN(7), ..valid() })]
    #[case(QueryParams { pivot_cols: vec![Dimension::Insurer], ..valid() })]
    fn test_validation_rejects(#[case] params: QueryParams) {
        let err = params.validate(&PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InputValidation(_)));
    }
}
