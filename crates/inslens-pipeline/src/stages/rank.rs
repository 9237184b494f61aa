//! Insurer rank enrichment.

use super::{cols, frame_columns, most_recent, quarter_list, str_list};
use crate::{Result, Stage};
use inslens_data::{Frame, Insurer, ValueType, columns::*};
use inslens_metrics::MetricRegistry;
use polars::prelude::*;
use std::sync::Arc;

const CHANGE: &str = "__rank_change";

/// Adds `rank` and `rank_change` rows for real insurers.
///
/// Ranks are `min` ranks of the `base` value, descending, within each
/// `(year_quarter, line, metric)`. The change is the previous rank of the
/// series minus the current one, so a positive change is a climb.
#[derive(Debug, Clone)]
pub struct RankEnrichment {
    registry: Arc<MetricRegistry>,
    num_periods: usize,
}

impl RankEnrichment {
    /// Create the stage.
    pub const fn new(registry: Arc<MetricRegistry>, num_periods: usize) -> Self {
        Self {
            registry,
            num_periods,
        }
    }
}

impl Stage for RankEnrichment {
    fn name(&self) -> &str {
        "add_ranks"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        let quarters = frame.quarters()?;
        let synthetic: Vec<String> = frame
            .unique_values(INSURER)?
            .into_iter()
            .filter(|c| Insurer::is_synthetic_code(c))
            .collect();
        let rankable: Vec<String> = frame
            .unique_values(METRIC)?
            .into_iter()
            .filter(|m| self.registry.is_rankable(m))
            .collect();

        let ranked = frame
            .lazy()
            .filter(
                col(VALUE_TYPE)
                    .eq(lit(ValueType::Base.as_str()))
                    .and(col(INSURER).is_in(str_list(&synthetic)).not())
                    .and(col(METRIC).is_in(str_list(&rankable))),
            )
            .with_column(
                col(VALUE)
                    .rank(
                        RankOptions {
                            method: RankMethod::Min,
                            descending: true,
                        },
                        None,
                    )
                    .over(cols(&[YEAR_QUARTER, LINE, METRIC]))
                    .cast(DataType::Float64)
                    .alias(VALUE),
            )
            .sort(
                [LINE, METRIC, INSURER, YEAR_QUARTER],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .with_column(
                (col(VALUE).shift(lit(1)).over(cols(&[LINE, METRIC, INSURER])) - col(VALUE))
                    .alias(CHANGE),
            );

        let rank_quarters = most_recent(&quarters, self.num_periods);
        let change_quarters = most_recent(&quarters, self.num_periods.saturating_sub(1).max(1));

        let ranks = ranked
            .clone()
            .filter(col(YEAR_QUARTER).is_in(quarter_list(rank_quarters)))
            .with_column(lit(ValueType::Rank.as_str()).alias(VALUE_TYPE))
            .select(frame_columns());
        let changes = ranked
            .filter(col(YEAR_QUARTER).is_in(quarter_list(change_quarters)))
            .with_columns([
                col(CHANGE).alias(VALUE),
                lit(ValueType::RankChange.as_str()).alias(VALUE_TYPE),
            ])
            .select(frame_columns());

        Ok(Frame::from_lazy(concat(
            [frame.lazy(), ranks, changes],
            UnionArgs::default(),
        )?)?)
    }
}
