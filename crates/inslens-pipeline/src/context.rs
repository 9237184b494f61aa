//! Session state threaded through the orchestrator.

use crate::{Layout, QueryParams, Segment, StageTiming};
use inslens_data::{Frame, ReportingForm, YearQuarter, load_csv};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Input tables keyed by reporting form. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct InputFrames {
    frames: HashMap<ReportingForm, Frame>,
}

impl InputFrames {
    /// No inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the table of a form.
    pub fn insert(&mut self, form: ReportingForm, frame: Frame) {
        self.frames.insert(form, frame);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, form: ReportingForm, frame: Frame) -> Self {
        self.insert(form, frame);
        self
    }

    /// Load one CSV per form.
    pub fn load<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = (ReportingForm, P)>,
    ) -> inslens_data::Result<Self> {
        let mut inputs = Self::new();
        for (form, path) in paths {
            inputs.insert(form, load_csv(path, form)?);
        }
        Ok(inputs)
    }

    /// Table of a form.
    pub fn get(&self, form: ReportingForm) -> Option<&Frame> {
        self.frames.get(&form)
    }

    /// Forms with a table, in code order.
    pub fn forms(&self) -> Vec<ReportingForm> {
        let mut forms: Vec<ReportingForm> = self.frames.keys().copied().collect();
        forms.sort();
        forms
    }
}

/// What one orchestrator run produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessingOutcome {
    /// Enriched long-format frame
    pub processed: Frame,
    /// Quarters present in `processed`, most recent first
    pub quarters: Vec<YearQuarter>,
    /// Quarters left after the end-quarter filter, most recent first
    pub filtered_quarters: Vec<YearQuarter>,
    /// Resolved start quarter
    pub start_quarter: Option<YearQuarter>,
    /// Per-stage timings
    pub timings: Vec<StageTiming>,
}

/// Per-session parameters, inputs and derived results.
///
/// Changing the parameters discards everything derived from the previous ones.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    inputs: Arc<InputFrames>,
    params: QueryParams,
    outcome: ProcessingOutcome,
    layout: Option<Layout>,
    segments: Vec<Segment>,
}

impl ProcessingContext {
    /// New session over shared inputs.
    pub fn new(inputs: Arc<InputFrames>, params: QueryParams) -> Self {
        Self {
            inputs,
            params,
            outcome: ProcessingOutcome::default(),
            layout: None,
            segments: Vec::new(),
        }
    }

    /// Shared inputs.
    pub fn inputs(&self) -> &InputFrames {
        &self.inputs
    }

    /// Current parameters.
    pub const fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Replace the parameters and clear derived state.
    pub fn set_params(&mut self, params: QueryParams) {
        self.params = params;
        self.outcome = ProcessingOutcome::default();
        self.layout = None;
        self.segments.clear();
    }

    /// Store an orchestrator run.
    pub fn merge(&mut self, outcome: ProcessingOutcome, layout: Layout, segments: Vec<Segment>) {
        self.outcome = outcome;
        self.layout = Some(layout);
        self.segments = segments;
    }

    /// Processed frame of the last run.
    pub const fn processed(&self) -> &Frame {
        &self.outcome.processed
    }

    /// Quarters of the processed frame, most recent first.
    pub fn quarters(&self) -> &[YearQuarter] {
        &self.outcome.quarters
    }

    /// Quarters left after the end-quarter filter, most recent first.
    pub fn filtered_quarters(&self) -> &[YearQuarter] {
        &self.outcome.filtered_quarters
    }

    /// Resolved start quarter of the last run.
    pub const fn start_quarter(&self) -> Option<YearQuarter> {
        self.outcome.start_quarter
    }

    /// Stage timings of the last run.
    pub fn timings(&self) -> &[StageTiming] {
        &self.outcome.timings
    }

    /// Layout of the last run.
    pub const fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Segments of the last run.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}
