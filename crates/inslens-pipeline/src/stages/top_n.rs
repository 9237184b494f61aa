//! Synthetic top-N insurers.

use super::{cols, frame_columns};
use crate::{Result, Stage};
use inslens_data::{Frame, Insurer, TOTAL_INSURER, columns::*};
use polars::prelude::*;

const POSITION: &str = "__position";

/// Appends one `top-N` insurer per threshold, summing the N largest real
/// insurers of every `(year_quarter, line, metric, value_type)` group.
#[derive(Debug, Clone)]
pub struct TopNAggregation {
    thresholds: Vec<u32>,
}

impl TopNAggregation {
    /// Create the stage for the given group sizes.
    pub fn new(thresholds: &[u32]) -> Self {
        Self {
            thresholds: thresholds.to_vec(),
        }
    }
}

impl Stage for TopNAggregation {
    fn name(&self) -> &str {
        "top_n_aggregation"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        if frame.is_empty() || self.thresholds.is_empty() {
            return Ok(frame);
        }
        let group = cols(&[YEAR_QUARTER, LINE, METRIC, VALUE_TYPE]);
        let ranked = frame
            .lazy()
            .filter(col(INSURER).neq(lit(TOTAL_INSURER)))
            .with_column(
                col(VALUE)
                    .rank(
                        RankOptions {
                            method: RankMethod::Ordinal,
                            descending: true,
                        },
                        None,
                    )
                    .over(group.clone())
                    .alias(POSITION),
            );

        let mut parts = vec![frame.lazy()];
        for n in &self.thresholds {
            parts.push(
                ranked
                    .clone()
                    .filter(col(POSITION).lt_eq(lit(*n)))
                    .group_by_stable(group.clone())
                    .agg([col(VALUE).sum()])
                    .with_columns([
                        lit(Insurer::top_n_code(*n)).alias(INSURER),
                        lit(NULL).cast(DataType::String).alias(LABEL),
                    ])
                    .select(frame_columns()),
            );
        }
        Ok(Frame::from_lazy(concat(parts, UnionArgs::default())?)?)
    }
}
