//! Period-over-period growth.

use super::{clip, cols, frame_columns, most_recent, quarter_list};
use crate::{PipelineConfig, Result, Stage};
use inslens_data::{Frame, ValueType, columns::*};
use polars::prelude::*;

const PREVIOUS: &str = "__previous";

/// Adds `base_change` and `market_share_change` rows and trims every row to
/// the displayed quarters.
#[derive(Debug, Clone)]
pub struct GrowthEnrichment {
    num_periods: usize,
    base_change: bool,
    market_share_change: bool,
    max_base_change: f64,
    max_market_share_change: f64,
    epsilon: f64,
}

impl GrowthEnrichment {
    /// Create the stage, emitting only the requested change types.
    pub const fn new(
        config: &PipelineConfig,
        num_periods: usize,
        base_change: bool,
        market_share_change: bool,
    ) -> Self {
        Self {
            num_periods,
            base_change,
            market_share_change,
            max_base_change: config.max_base_change,
            max_market_share_change: config.max_market_share_change,
            epsilon: config.growth_epsilon,
        }
    }
}

/// Rows of `from` with `value` recomputed and relabelled as `to`.
fn changes(series: &LazyFrame, from: ValueType, to: ValueType, value: Expr) -> LazyFrame {
    series
        .clone()
        .filter(col(VALUE_TYPE).eq(lit(from.as_str())))
        .with_columns([value.alias(VALUE), lit(to.as_str()).alias(VALUE_TYPE)])
        .select(frame_columns())
}

impl Stage for GrowthEnrichment {
    fn name(&self) -> &str {
        "compute_growth"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        let quarters = frame.quarters()?;
        let shown = quarter_list(most_recent(&quarters, self.num_periods));
        let change_quarters =
            most_recent(&quarters, self.num_periods.saturating_sub(1).max(1));

        let series = frame
            .lazy()
            .sort(
                [LINE, INSURER, METRIC, VALUE_TYPE, YEAR_QUARTER],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .with_column(
                col(VALUE)
                    .shift(lit(1))
                    .over(cols(&[LINE, INSURER, METRIC, VALUE_TYPE]))
                    .alias(PREVIOUS),
            )
            .filter(col(YEAR_QUARTER).is_in(quarter_list(change_quarters)));

        let mut parts = vec![frame.lazy().filter(col(YEAR_QUARTER).is_in(shown))];
        if self.base_change {
            let relative = when(col(PREVIOUS).gt(lit(self.epsilon)))
                .then((col(VALUE) - col(PREVIOUS)) / col(PREVIOUS))
                .otherwise(lit(NULL).cast(DataType::Float64));
            parts.push(changes(
                &series,
                ValueType::Base,
                ValueType::BaseChange,
                clip(relative, self.max_base_change),
            ));
        }
        if self.market_share_change {
            let points = (col(VALUE) - col(PREVIOUS)) * lit(100.0);
            parts.push(changes(
                &series,
                ValueType::MarketShare,
                ValueType::MarketShareChange,
                clip(points, self.max_market_share_change),
            ));
        }
        Ok(Frame::from_lazy(concat(parts, UnionArgs::default())?)?)
    }
}
