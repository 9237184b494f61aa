//! Row filters on dimension values and quarter bounds.

use super::str_list;
use crate::{Result, Stage};
use inslens_data::{Frame, YearQuarter, columns};
use polars::prelude::*;

/// Keeps or drops rows by one column.
#[derive(Debug, Clone)]
pub enum FilterStage {
    /// Rows whose string `column` is (`keep`) or is not in `values`
    Values {
        /// Filtered column
        column: &'static str,
        /// Compared values
        values: Vec<String>,
        /// Keep matches when true, drop them otherwise
        keep: bool,
    },
    /// Rows at or before a quarter
    QuarterAtMost(YearQuarter),
    /// Rows at or after a quarter
    QuarterAtLeast(YearQuarter),
}

impl FilterStage {
    /// Keep rows whose `column` is in `values`.
    pub fn keep(column: &'static str, values: &[String]) -> Self {
        Self::Values {
            column,
            values: values.to_vec(),
            keep: true,
        }
    }

    /// Drop rows whose `column` is in `values`.
    pub fn drop(column: &'static str, values: &[String]) -> Self {
        Self::Values {
            column,
            values: values.to_vec(),
            keep: false,
        }
    }

    fn predicate(&self) -> Expr {
        match self {
            Self::Values {
                column,
                values,
                keep,
            } => {
                let matches = col(*column).is_in(str_list(values));
                if *keep { matches } else { matches.not() }
            }
            Self::QuarterAtMost(q) => col(columns::YEAR_QUARTER).lt_eq(lit(q.index())),
            Self::QuarterAtLeast(q) => col(columns::YEAR_QUARTER).gt_eq(lit(q.index())),
        }
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &str {
        match self {
            Self::Values { keep: true, .. } => "filter_keep",
            Self::Values { keep: false, .. } => "filter_drop",
            Self::QuarterAtMost(_) => "filter_quarters_until",
            Self::QuarterAtLeast(_) => "filter_quarters_from",
        }
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        if let Self::Values { values, keep: false, .. } = self
            && values.is_empty()
        {
            return Ok(frame);
        }
        Ok(Frame::from_lazy(frame.lazy().filter(self.predicate()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::*;

    fn sample() -> Frame {
        frame(&[
            base("2023Q4", "auto", "ins_a", "direct_premiums", 1.0),
            base("2024Q1", "auto", "ins_a", "direct_premiums", 2.0),
            base("2024Q1", "property", "ins_a", "direct_premiums", 3.0),
            base("2024Q2", "auto", "ins_b", "claims_paid", 4.0),
        ])
    }

    #[test]
    fn test_keep_values() {
        let out = FilterStage::keep(columns::LINE, &["auto".to_string()])
            .apply(sample())
            .unwrap();
        assert_eq!(out.height(), 3);
        assert!(out.records().unwrap().iter().all(|r| r.line == "auto"));
    }

    #[test]
    fn test_drop_values() {
        let out = FilterStage::drop(columns::INSURER, &["ins_a".to_string()])
            .apply(sample())
            .unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.records().unwrap()[0].insurer, "ins_b");
    }

    #[test]
    fn test_quarter_bounds() {
        let from = FilterStage::QuarterAtLeast(yq("2024Q1")).apply(sample()).unwrap();
        assert_eq!(from.height(), 3);
        let until = FilterStage::QuarterAtMost(yq("2024Q1")).apply(from).unwrap();
        assert_eq!(until.height(), 2);
        assert_eq!(until.quarters().unwrap(), vec![yq("2024Q1")]);
    }

    #[test]
    fn test_empty_keep_drops_everything() {
        let out = FilterStage::keep(columns::METRIC, &[]).apply(sample()).unwrap();
        assert!(out.is_empty());
    }
}
