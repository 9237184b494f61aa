//! Reshapes quarterly values into the requested period type.

use super::{cols, frame_columns};
use crate::{Result, Stage};
use inslens_data::{Frame, PeriodType, Record, YearQuarter, columns::*};
use polars::prelude::*;
use std::collections::BTreeMap;

const YEAR_KEY: &str = "__year";

/// Period-type transform.
///
/// `qoq` keeps quarters as they are; the other types aggregate or select
/// quarters relative to the quarter-of-year of `end_quarter`.
#[derive(Debug, Clone)]
pub struct PeriodTransform {
    period_type: PeriodType,
    end_quarter: YearQuarter,
    min_history_days: i64,
}

impl PeriodTransform {
    /// Create a transform ending at `end_quarter`.
    pub const fn new(
        period_type: PeriodType,
        end_quarter: YearQuarter,
        min_history_days: i64,
    ) -> Self {
        Self {
            period_type,
            end_quarter,
            min_history_days,
        }
    }

    /// Zero-based quarter-of-year of the end quarter.
    fn end_q0(&self) -> i32 {
        i32::from(self.end_quarter.quarter()) - 1
    }

    fn quarter_of_year() -> Expr {
        col(YEAR_QUARTER) % lit(4)
    }

    fn same_quarter_of_year(&self, frame: &Frame) -> Result<Frame> {
        Ok(Frame::from_lazy(
            frame
                .lazy()
                .filter(Self::quarter_of_year().eq(lit(self.end_q0()))),
        )?)
    }

    fn year_to_date(&self, frame: &Frame) -> Result<Frame> {
        let end_q0 = self.end_q0();
        let lf = frame
            .lazy()
            .filter(Self::quarter_of_year().lt_eq(lit(end_q0)))
            .with_column((col(YEAR_QUARTER) - Self::quarter_of_year()).alias(YEAR_KEY))
            .sort(
                [YEAR_QUARTER],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .with_column(col(VALUE).cum_sum(false).over(cols(&[
                YEAR_KEY, LINE, INSURER, METRIC, VALUE_TYPE,
            ])))
            .filter(Self::quarter_of_year().eq(lit(end_q0)))
            .select(frame_columns());
        Ok(Frame::from_lazy(lf)?)
    }

    fn running_total(frame: &Frame) -> Result<Frame> {
        let lf = frame
            .lazy()
            .sort(
                [YEAR_QUARTER],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .with_column(
                col(VALUE)
                    .cum_sum(false)
                    .over(cols(&[LINE, INSURER, METRIC, VALUE_TYPE])),
            )
            .select(frame_columns());
        Ok(Frame::from_lazy(lf)?)
    }

    /// Four-quarter trailing sums at the end quarter-of-year.
    fn rolling_year(&self, frame: &Frame) -> Result<Frame> {
        type SeriesKey = (String, String, String, String);
        let mut series: BTreeMap<SeriesKey, BTreeMap<i32, Record>> = BTreeMap::new();
        for record in frame.records()? {
            let key = (
                record.line.clone(),
                record.insurer.clone(),
                record.metric.clone(),
                record.value_type.to_string(),
            );
            series
                .entry(key)
                .or_default()
                .insert(record.year_quarter.index(), record);
        }

        let mut out = Vec::new();
        for quarters in series.values() {
            let Some(first) = quarters.keys().next().copied() else {
                continue;
            };
            let history_start = YearQuarter::from_index(first).start_date();
            for (idx, record) in quarters {
                if idx.rem_euclid(4) != self.end_q0() {
                    continue;
                }
                let history = record.year_quarter.end_date() - history_start;
                if history.num_days() < self.min_history_days {
                    continue;
                }
                let window: Vec<f64> = quarters
                    .range(idx - 3..=*idx)
                    .filter_map(|(_, r)| r.value)
                    .collect();
                let sum = (!window.is_empty()).then(|| window.iter().sum::<f64>());
                out.push(record.derive(record.value_type, sum));
            }
        }
        Ok(Frame::from_records(&out)?)
    }
}

impl Stage for PeriodTransform {
    fn name(&self) -> &str {
        "period_transform"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        match self.period_type {
            PeriodType::Qoq => Ok(frame),
            PeriodType::YoyQ => self.same_quarter_of_year(&frame),
            PeriodType::Ytd => self.year_to_date(&frame),
            PeriodType::CumulativeSum => Self::running_total(&frame),
            PeriodType::Mat | PeriodType::YoyY => self.rolling_year(&frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::*;
    use approx::assert_relative_eq;
    use inslens_data::ValueType;

    fn quarterly(from: &str, values: &[f64]) -> Frame {
        let start = yq(from).index();
        let records: Vec<Record> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Record::base(
                    YearQuarter::from_index(start + i as i32),
                    "auto",
                    "ins_a",
                    "direct_premiums",
                    *v,
                )
            })
            .collect();
        frame(&records)
    }

    fn transform(period: PeriodType, end: &str) -> PeriodTransform {
        PeriodTransform::new(period, yq(end), 364)
    }

    #[test]
    fn test_qoq_is_identity() {
        let input = quarterly("2024Q1", &[1.0, 2.0]);
        let out = transform(PeriodType::Qoq, "2024Q2").apply(input).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_yoy_q_keeps_same_quarter() {
        let input = quarterly("2023Q1", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = transform(PeriodType::YoyQ, "2024Q2").apply(input).unwrap();
        assert_eq!(out.quarters().unwrap(), vec![yq("2024Q2"), yq("2023Q2")]);
    }

    #[test]
    fn test_ytd_sums_year_to_date() {
        let input = quarterly("2023Q1", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = transform(PeriodType::Ytd, "2024Q2").apply(input).unwrap();
        let records = out.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_relative_eq!(
            value_of(&records, "2024Q2", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            11.0
        );
        assert_relative_eq!(
            value_of(&records, "2023Q2", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            3.0
        );
        assert_eq!(value_of(&records, "2024Q1", "ins_a", "direct_premiums", ValueType::Base), None);
    }

    #[test]
    fn test_mat_needs_full_year_of_history() {
        let input = quarterly("2023Q1", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let out = transform(PeriodType::Mat, "2024Q4").apply(input).unwrap();
        let records = out.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_relative_eq!(
            value_of(&records, "2024Q4", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            26.0
        );
        assert_relative_eq!(
            value_of(&records, "2023Q4", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            10.0
        );
    }

    #[test]
    fn test_mat_drops_short_history() {
        let input = quarterly("2023Q3", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = transform(PeriodType::Mat, "2024Q3").apply(input).unwrap();
        let records = out.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year_quarter, yq("2024Q3"));
        assert_relative_eq!(records[0].value.unwrap(), 14.0);
    }

    #[test]
    fn test_mat_reapplied_drops_oldest_year() {
        let values: Vec<f64> = (1..=12).map(f64::from).collect();
        let stage = transform(PeriodType::Mat, "2024Q4");
        let once = stage.apply(quarterly("2022Q1", &values)).unwrap();
        assert_eq!(
            once.quarters().unwrap(),
            vec![yq("2024Q4"), yq("2023Q4"), yq("2022Q4")]
        );

        let twice = stage.apply(once).unwrap().records().unwrap();
        assert_eq!(twice.len(), 2);
        assert_eq!(value_of(&twice, "2022Q4", "ins_a", "direct_premiums", ValueType::Base), None);
        assert_relative_eq!(
            value_of(&twice, "2023Q4", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            26.0
        );
        assert_relative_eq!(
            value_of(&twice, "2024Q4", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            42.0
        );
    }

    #[test]
    fn test_cumulative_sum() {
        let input = quarterly("2024Q1", &[1.0, 2.0, 3.0]);
        let out = transform(PeriodType::CumulativeSum, "2024Q3").apply(input).unwrap();
        let records = out.records().unwrap();
        assert_relative_eq!(
            value_of(&records, "2024Q3", "ins_a", "direct_premiums", ValueType::Base).unwrap(),
            6.0
        );
    }

    #[test]
    fn test_empty_input() {
        let out = transform(PeriodType::Ytd, "2024Q2").apply(Frame::empty()).unwrap();
        assert!(out.is_empty());
    }
}
