//! Interactive analysis session.
//!
//! A [`Session`] owns one [`ProcessingContext`] and the services needed to
//! turn it into reports. Changing parameters discards previous results; the
//! next [`run`](Session::run) recomputes them.

use crate::Result;
use inslens_data::{InsurerDirectory, LineHierarchy};
use inslens_metrics::MetricRegistry;
use inslens_output::{LabelMapper, PivotProjector, SegmentReport, build_reports};
use inslens_pipeline::{
    InputFrames, Orchestrator, PipelineConfig, ProcessingContext, QueryParams,
};
use std::sync::Arc;
use tracing::info;

/// Loaded inputs, current parameters and the pipeline that serves them.
#[derive(Debug)]
pub struct Session {
    orchestrator: Orchestrator,
    context: ProcessingContext,
    lines: Option<LineHierarchy>,
    insurers: Option<InsurerDirectory>,
}

impl Session {
    /// Session over the standard registry and default configuration.
    pub fn new(inputs: InputFrames, params: QueryParams) -> Self {
        Self {
            orchestrator: Orchestrator::standard(),
            context: ProcessingContext::new(Arc::new(inputs), params),
            lines: None,
            insurers: None,
        }
    }

    /// Use another registry and configuration.
    pub fn with_pipeline(mut self, registry: MetricRegistry, config: PipelineConfig) -> Self {
        self.orchestrator = Orchestrator::new(Arc::new(registry), config);
        self
    }

    /// Attach a line hierarchy for labels and line selection.
    pub fn with_lines(mut self, lines: LineHierarchy) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Attach an insurer directory for labels.
    pub fn with_insurers(mut self, insurers: InsurerDirectory) -> Self {
        self.insurers = Some(insurers);
        self
    }

    /// Current parameters.
    pub const fn params(&self) -> &QueryParams {
        self.context.params()
    }

    /// Context of the last run.
    pub const fn context(&self) -> &ProcessingContext {
        &self.context
    }

    /// The pipeline.
    pub const fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Replace the parameters.
    pub fn update(&mut self, params: QueryParams) {
        self.context.set_params(params);
    }

    /// Add `triggered` lines to the selection.
    ///
    /// With a hierarchy, relatives of the triggered lines are deselected, or
    /// with `detailize` every selected parent is replaced by its children.
    pub fn select_lines(&mut self, triggered: &[String], detailize: bool) {
        let current = &self.context.params().lines;
        let mut lines = current.clone();
        lines.extend(triggered.iter().filter(|l| !current.contains(l)).cloned());
        if let Some(hierarchy) = &self.lines {
            lines = hierarchy.handle_parent_child_selections(&lines, triggered, detailize);
        }
        let params = QueryParams {
            lines,
            ..self.context.params().clone()
        };
        self.update(params);
    }

    /// Labels for the current parameters.
    pub fn labels(&self) -> LabelMapper {
        let mut labels = LabelMapper::new(
            Arc::new(self.orchestrator.registry().clone()),
            self.params().period_type,
        );
        if let Some(lines) = &self.lines {
            labels = labels.with_lines(lines.clone());
        }
        if let Some(insurers) = &self.insurers {
            labels = labels.with_insurers(insurers.clone());
        }
        labels
    }

    /// Run the pipeline and build one report per segment.
    pub fn run(&mut self) -> Result<Vec<SegmentReport>> {
        self.orchestrator.run(&mut self.context)?;
        let projector = PivotProjector::new(self.orchestrator.config().separator.clone());
        let reports = build_reports(&self.context, &self.labels(), &projector);
        info!(
            segments = reports.len(),
            rows = self.context.processed().height(),
            "session run complete"
        );
        Ok(reports)
    }
}
