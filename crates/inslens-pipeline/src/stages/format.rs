//! Rank and infinity labels.

use crate::{PipelineConfig, Result, Stage};
use inslens_data::{Frame, Record, ValueType, YearQuarter};
use std::collections::HashMap;

type SeriesPoint = (YearQuarter, String, String, String);

/// Sets display labels and folds `rank_change` into the `rank` rows.
///
/// Change rows beyond their infinity threshold keep their clipped value and
/// get the infinity marker as label.
#[derive(Debug, Clone)]
pub struct RankFormatter {
    base_threshold: f64,
    market_share_threshold: f64,
    infinity_sign: String,
}

impl RankFormatter {
    /// Create the formatter from the configured thresholds.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            base_threshold: config.base_infinity_threshold,
            market_share_threshold: config.market_share_infinity_threshold,
            infinity_sign: config.infinity_sign.clone(),
        }
    }

    fn point(record: &Record) -> SeriesPoint {
        (
            record.year_quarter,
            record.line.clone(),
            record.insurer.clone(),
            record.metric.clone(),
        )
    }

    fn infinity_label(&self, value: Option<f64>, threshold: f64) -> Option<String> {
        value
            .filter(|v| v.abs() > threshold)
            .map(|_| self.infinity_sign.clone())
    }
}

/// `"3"`, `"3 (+2)"`, `"3 (-1)"`, `"3 (-)"` or `"-"`.
pub fn rank_label(rank: Option<f64>, change: Option<f64>) -> String {
    match (rank, change) {
        (None, _) => "-".to_string(),
        (Some(r), None) => format!("{}", r as i64),
        (Some(r), Some(c)) if c == 0.0 => format!("{} (-)", r as i64),
        (Some(r), Some(c)) => format!("{} ({:+})", r as i64, c as i64),
    }
}

impl Stage for RankFormatter {
    fn name(&self) -> &str {
        "format_ranks"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        let records = frame.records()?;
        let changes: HashMap<SeriesPoint, Option<f64>> = records
            .iter()
            .filter(|r| r.value_type == ValueType::RankChange)
            .map(|r| (Self::point(r), r.value))
            .collect();

        let formatted: Vec<Record> = records
            .into_iter()
            .filter(|r| r.value_type != ValueType::RankChange)
            .map(|mut record| {
                match record.value_type {
                    ValueType::Rank => {
                        let change = changes.get(&Self::point(&record)).copied().flatten();
                        record.label = Some(rank_label(record.value, change));
                    }
                    ValueType::BaseChange => {
                        record.label = self.infinity_label(record.value, self.base_threshold);
                    }
                    ValueType::MarketShareChange => {
                        record.label =
                            self.infinity_label(record.value, self.market_share_threshold);
                    }
                    ValueType::Base | ValueType::MarketShare | ValueType::RankChange => {}
                }
                record
            })
            .collect();
        Ok(Frame::from_records(&formatted)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(3.0), Some(2.0), "3 (+2)")]
    #[case(Some(3.0), Some(-1.0), "3 (-1)")]
    #[case(Some(3.0), Some(0.0), "3 (-)")]
    #[case(Some(1.0), None, "1")]
    #[case(None, Some(1.0), "-")]
    fn test_rank_label(#[case] rank: Option<f64>, #[case] change: Option<f64>, #[case] expected: &str) {
        assert_eq!(rank_label(rank, change), expected);
    }

    #[test]
    fn test_merges_rank_change() {
        let row = base("2024Q1", "auto", "ins_a", "direct_premiums", 100.0);
        let input = frame(&[
            row.clone(),
            row.derive(ValueType::Rank, Some(2.0)),
            row.derive(ValueType::RankChange, Some(1.0)),
        ]);
        let records = RankFormatter::new(&PipelineConfig::default())
            .apply(input)
            .unwrap()
            .records()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(count(&records, ValueType::RankChange), 0);
        let rank = records.iter().find(|r| r.value_type == ValueType::Rank).unwrap();
        assert_eq!(rank.label.as_deref(), Some("2 (+1)"));
        assert_eq!(rank.value, Some(2.0));
        assert_eq!(records[0].label, None);
    }

    #[test]
    fn test_infinity_labels() {
        let row = base("2024Q1", "auto", "ins_a", "direct_premiums", 100.0);
        let input = frame(&[
            row.derive(ValueType::BaseChange, Some(12.0)),
            row.derive(ValueType::BaseChange, Some(9.0)),
            row.derive(ValueType::MarketShareChange, Some(-100.0)),
        ]);
        let records = RankFormatter::new(&PipelineConfig::default())
            .apply(input)
            .unwrap()
            .records()
            .unwrap();
        assert_eq!(records[0].label.as_deref(), Some("∞"));
        assert_eq!(records[0].value, Some(12.0));
        assert_eq!(records[1].label, None);
        assert_eq!(records[2].label, None);
    }
}
