//! Market share enrichment.

use super::{cols, frame_columns, str_list};
use crate::{Result, Stage};
use inslens_data::{Frame, TOTAL_INSURER, ValueType, columns::*};
use inslens_metrics::MetricRegistry;
use polars::prelude::*;
use std::sync::Arc;

const TOTAL: &str = "__total";

/// Adds `market_share = value / total` rows for additive metrics.
///
/// Groups without a `total` row, or with a zero total, get no shares. A
/// missing value gives a missing share.
#[derive(Debug, Clone)]
pub struct MarketShareEnrichment {
    registry: Arc<MetricRegistry>,
}

impl MarketShareEnrichment {
    /// Create the stage.
    pub const fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }
}

impl Stage for MarketShareEnrichment {
    fn name(&self) -> &str {
        "add_market_share"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        let eligible: Vec<String> = frame
            .unique_values(METRIC)?
            .into_iter()
            .filter(|m| self.registry.is_market_share_eligible(m))
            .collect();
        let keys = cols(&[YEAR_QUARTER, LINE, METRIC]);

        let base = frame.lazy().filter(
            col(VALUE_TYPE)
                .eq(lit(ValueType::Base.as_str()))
                .and(col(METRIC).is_in(str_list(&eligible))),
        );
        let totals = base
            .clone()
            .filter(col(INSURER).eq(lit(TOTAL_INSURER)))
            .select([
                col(YEAR_QUARTER),
                col(LINE),
                col(METRIC),
                col(VALUE).alias(TOTAL),
            ]);
        let shares = base
            .join(totals, keys.clone(), keys, JoinArgs::new(JoinType::Inner))
            .filter(col(TOTAL).neq(lit(0.0)))
            .with_columns([
                (col(VALUE) / col(TOTAL)).alias(VALUE),
                lit(ValueType::MarketShare.as_str()).alias(VALUE_TYPE),
            ])
            .select(frame_columns());

        Ok(Frame::from_lazy(concat(
            [frame.lazy(), shares],
            UnionArgs::default(),
        )?)?)
    }
}
