//! Stage processors.
//!
//! Each stage owns the parameters it needs and implements [`Stage`](crate::Stage).
//! Expression-friendly stages run on polars lazy frames. Stages whose logic
//! is per-group bookkeeping (derived metrics, rolling windows, rank labels)
//! work on records.

pub mod filter;
pub mod format;
pub mod growth;
pub mod market_share;
pub mod metrics;
pub mod period_transform;
pub mod rank;
pub mod top_n;

pub use filter::FilterStage;
pub use format::RankFormatter;
pub use growth::GrowthEnrichment;
pub use market_share::MarketShareEnrichment;
pub use metrics::MetricComputation;
pub use period_transform::PeriodTransform;
pub use rank::RankEnrichment;
pub use top_n::TopNAggregation;

use inslens_data::{YearQuarter, columns};
use polars::prelude::*;

/// Select the frame columns in frame order.
fn frame_columns() -> Vec<Expr> {
    columns::ALL.iter().map(|c| col(*c)).collect()
}

/// Column references.
fn cols(names: &[&str]) -> Vec<Expr> {
    names.iter().map(|c| col(*c)).collect()
}

/// Literal list of strings for `is_in`.
fn str_list(values: &[String]) -> Expr {
    lit(Series::new("values".into(), values.to_vec()))
}

/// Literal list of quarter indices for `is_in`.
fn quarter_list(quarters: &[YearQuarter]) -> Expr {
    lit(Series::new(
        "quarters".into(),
        quarters.iter().map(YearQuarter::index).collect::<Vec<i32>>(),
    ))
}

/// The `n` most recent quarters, given quarters sorted most recent first.
fn most_recent(quarters: &[YearQuarter], n: usize) -> &[YearQuarter] {
    &quarters[..n.min(quarters.len())]
}

/// Clamp an expression to `[-bound, bound]`, keeping nulls.
fn clip(expr: Expr, bound: f64) -> Expr {
    when(expr.clone().gt(lit(bound)))
        .then(lit(bound))
        .when(expr.clone().lt(lit(-bound)))
        .then(lit(-bound))
        .otherwise(expr)
}

#[cfg(test)]
pub(crate) mod test_support {
    use inslens_data::{Frame, Record, ValueType, YearQuarter};

    pub(crate) fn yq(s: &str) -> YearQuarter {
        s.parse().unwrap()
    }

    pub(crate) fn base(q: &str, line: &str, insurer: &str, metric: &str, value: f64) -> Record {
        Record::base(yq(q), line, insurer, metric, value)
    }

    pub(crate) fn frame(records: &[Record]) -> Frame {
        Frame::from_records(records).unwrap()
    }

    /// Value of the unique row matching the keys.
    pub(crate) fn value_of(
        records: &[Record],
        q: &str,
        insurer: &str,
        metric: &str,
        value_type: ValueType,
    ) -> Option<f64> {
        let matches: Vec<&Record> = records
            .iter()
            .filter(|r| {
                r.year_quarter == yq(q)
                    && r.insurer == insurer
                    && r.metric == metric
                    && r.value_type == value_type
            })
            .collect();
        assert!(matches.len() <= 1, "duplicate rows for {q} {insurer} {metric} {value_type}");
        matches.first().and_then(|r| r.value)
    }

    pub(crate) fn count(records: &[Record], value_type: ValueType) -> usize {
        records.iter().filter(|r| r.value_type == value_type).count()
    }
}
