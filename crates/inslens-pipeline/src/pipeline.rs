//! Stage trait and fluent pipeline.

use crate::Result;
use inslens_data::Frame;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// One transformation of the processing pipeline.
///
/// Stages are pure: the output depends only on the input frame and the
/// parameters the stage was built with.
pub trait Stage: Send + Sync + std::fmt::Debug {
    /// Stable identifier used in logs and timings.
    fn name(&self) -> &str;

    /// Transform a frame.
    fn apply(&self, frame: Frame) -> Result<Frame>;
}

/// Execution record of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    /// Stage name
    pub stage: String,
    /// Rows before the stage
    pub rows_in: usize,
    /// Rows after the stage
    pub rows_out: usize,
    /// Wall-clock duration
    pub elapsed: Duration,
}

/// A frame threaded through a sequence of stages.
#[derive(Debug)]
pub struct Pipeline {
    frame: Frame,
    timings: Vec<StageTiming>,
}

impl Pipeline {
    /// Start a pipeline over `frame`.
    pub const fn new(frame: Frame) -> Self {
        Self {
            frame,
            timings: Vec::new(),
        }
    }

    /// Apply a stage, logging its row counts and duration.
    pub fn pipe(mut self, stage: &dyn Stage) -> Result<Self> {
        let start = Instant::now();
        let rows_in = self.frame.height();
        self.frame = stage.apply(self.frame)?;
        let elapsed = start.elapsed();
        let rows_out = self.frame.height();
        debug!(
            stage = stage.name(),
            rows_in,
            rows_out,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "stage complete"
        );
        self.timings.push(StageTiming {
            stage: stage.name().to_string(),
            rows_in,
            rows_out,
            elapsed,
        });
        Ok(self)
    }

    /// Apply a stage only when `condition` holds.
    pub fn pipe_if(self, condition: bool, stage: &dyn Stage) -> Result<Self> {
        if condition { self.pipe(stage) } else { Ok(self) }
    }

    /// Current frame.
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Timings of the stages applied so far.
    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    /// Final frame and timings.
    pub fn finish(self) -> (Frame, Vec<StageTiming>) {
        (self.frame, self.timings)
    }
}
