//! Facade used by inbound surfaces.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::{DailySummary, Frame, SleepVerdict};
use crate::error::PipelineResult;
use crate::ports::OutcomeStore;

use super::analytics::Analytics;
use super::decision::{PipelineConfig, SleepPipeline, VisionModels};
use super::recorder::EventRecorder;

/// Pipeline, recorder and analytics wired to one outcome store.
#[derive(Debug, Clone)]
pub struct SleepMonitor {
    pipeline: SleepPipeline,
    recorder: EventRecorder,
    analytics: Analytics,
}

impl SleepMonitor {
    /// Wires the monitor.
    #[must_use]
    pub fn new(models: VisionModels, config: PipelineConfig, store: Arc<dyn OutcomeStore>) -> Self {
        Self {
            pipeline: SleepPipeline::new(models, config),
            recorder: EventRecorder::new(Arc::clone(&store)),
            analytics: Analytics::new(store),
        }
    }

    /// Assesses `frame` and records the verdict. Rejected frames are not recorded.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error for rejected or failed assessments.
    pub fn observe(&self, frame: &Frame) -> PipelineResult<SleepVerdict> {
        let verdict = self.pipeline.assess(frame)?;
        info!(
            eye_state = %verdict.eye_state(),
            sleep_confirmed = ?verdict.sleep_confirmed(),
            "Prediction"
        );
        self.recorder.record(verdict);
        Ok(verdict)
    }

    /// Assesses `frame` without recording.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error for rejected or failed assessments.
    pub fn assess(&self, frame: &Frame) -> PipelineResult<SleepVerdict> {
        self.pipeline.assess(frame)
    }

    /// Daily summaries for the analytics window.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn analytics(&self) -> Result<Vec<DailySummary>> {
        self.analytics.summarize()
    }
}
