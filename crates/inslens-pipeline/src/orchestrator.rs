//! Fixed-order composition of the stages.

use crate::context::ProcessingOutcome;
use crate::stages::{
    FilterStage, GrowthEnrichment, MarketShareEnrichment, MetricComputation, PeriodTransform,
    RankEnrichment, RankFormatter, TopNAggregation,
};
use crate::{
    DimensionalSplitter, Layout, Pipeline, PipelineConfig, PipelineError, ProcessingContext,
    QueryParams, Result, load_start_quarter, start_quarter,
};
use inslens_data::{Frame, ValueType, YearQuarter, columns};
use inslens_metrics::MetricRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the processing pipeline for a context and stores the results in it.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<MetricRegistry>,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub const fn new(registry: Arc<MetricRegistry>, config: PipelineConfig) -> Self {
        Self { registry, config }
    }

    /// Orchestrator over the standard registry and default configuration.
    pub fn standard() -> Self {
        Self::new(Arc::new(MetricRegistry::standard()), PipelineConfig::default())
    }

    /// Metric registry.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Metrics to load and compute for the selection, dependencies first.
    pub fn required_metrics(&self, params: &QueryParams, input: &Frame) -> Result<Vec<String>> {
        let available: HashSet<String> =
            input.unique_values(columns::METRIC)?.into_iter().collect();
        Ok(self.registry.required_metrics(&params.metrics, &available)?)
    }

    /// Process the context's parameters and split the result into segments.
    ///
    /// Parameter and metric errors are returned. Failures inside the stages
    /// are logged and leave the context with an empty result.
    pub fn run(&self, ctx: &mut ProcessingContext) -> Result<()> {
        let params = ctx.params().clone();
        params.validate(&self.config)?;

        let input = ctx
            .inputs()
            .get(params.reporting_form)
            .ok_or(PipelineError::MissingForm(params.reporting_form))?;
        let required = self.required_metrics(&params, input)?;
        let start = start_quarter(
            &input.quarters()?,
            params.end_quarter,
            params.period_type,
            params.num_periods,
        );

        let outcome = match self.execute(input, &params, &required, start) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "pipeline failed, returning an empty result");
                ProcessingOutcome {
                    start_quarter: Some(start),
                    ..ProcessingOutcome::default()
                }
            }
        };

        let layout = Layout::for_params(&params);
        let segments = match DimensionalSplitter::new(self.config.max_segments).split(
            &outcome.processed,
            &params,
            &layout,
        ) {
            Ok(segments) => segments,
            Err(e) => {
                warn!(error = %e, "splitting failed, returning no segments");
                Vec::new()
            }
        };
        info!(
            rows = outcome.processed.height(),
            quarters = outcome.quarters.len(),
            segments = segments.len(),
            start = %start,
            end = %params.end_quarter,
            "processing complete"
        );
        ctx.merge(outcome, layout, segments);
        Ok(())
    }

    fn execute(
        &self,
        input: &Frame,
        params: &QueryParams,
        required: &[String],
        start: YearQuarter,
    ) -> Result<ProcessingOutcome> {
        let config = &self.config;
        let wants_market_share =
            params.wants(ValueType::MarketShare) || params.wants(ValueType::MarketShareChange);

        let prepared = Pipeline::new(input.clone())
            .pipe(&FilterStage::keep(columns::LINE, &params.lines))?
            .pipe(&FilterStage::keep(columns::METRIC, required))?
            .pipe(&FilterStage::QuarterAtLeast(load_start_quarter(
                start,
                params.period_type,
            )))?
            .pipe(&PeriodTransform::new(
                params.period_type,
                params.end_quarter,
                config.mat_min_history_days,
            ))?
            .pipe(&TopNAggregation::new(&config.top_n_thresholds))?
            .pipe(&MetricComputation::new(
                self.registry.clone(),
                params.metrics.clone(),
                required.to_vec(),
            ))?
            .pipe(&FilterStage::QuarterAtMost(params.end_quarter))?;
        let filtered_quarters = prepared.frame().quarters()?;

        let (processed, timings) = prepared
            .pipe_if(
                params.wants(ValueType::Rank),
                &RankEnrichment::new(self.registry.clone(), params.num_periods),
            )?
            .pipe_if(
                wants_market_share,
                &MarketShareEnrichment::new(self.registry.clone()),
            )?
            .pipe(&GrowthEnrichment::new(
                config,
                params.num_periods,
                params.wants(ValueType::BaseChange),
                params.wants(ValueType::MarketShareChange),
            ))?
            .pipe(&RankFormatter::new(config))?
            .finish();

        let processed = processed.sorted()?;
        Ok(ProcessingOutcome {
            quarters: processed.quarters()?,
            processed,
            filtered_quarters,
            start_quarter: Some(start),
            timings,
        })
    }
}
