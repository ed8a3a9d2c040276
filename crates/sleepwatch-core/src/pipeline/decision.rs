//! Sleep-state decision logic.
//!
//! Orchestrates face landmarks, eye cropping, eye-state classification and,
//! for closed eyes only, posture corroboration.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{EyeState, Frame, PostureFinding, SleepVerdict, UnconfirmedReason, LEFT_EYE_INDICES};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::{EyeStateClassifier, FaceLandmarker, PoseLandmarker};

use super::crop::{crop_eye_region, EYE_MARGIN_PX};
use super::posture::{LyingDownHeuristic, DEFAULT_LYING_DOWN_RATIO};

/// The three vision capabilities, loaded once and shared read-only.
#[derive(Clone)]
pub struct VisionModels {
    /// Face landmark provider.
    pub face: Arc<dyn FaceLandmarker>,
    /// Body pose provider.
    pub pose: Arc<dyn PoseLandmarker>,
    /// Eye-state classifier.
    pub eyes: Arc<dyn EyeStateClassifier>,
}

impl VisionModels {
    /// Bundles the three capabilities.
    #[must_use]
    pub fn new(
        face: Arc<dyn FaceLandmarker>,
        pose: Arc<dyn PoseLandmarker>,
        eyes: Arc<dyn EyeStateClassifier>,
    ) -> Self {
        Self { face, pose, eyes }
    }
}

impl std::fmt::Debug for VisionModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionModels").finish_non_exhaustive()
    }
}

/// Tunables for the decision pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Pixels added around the eye landmark bounding box.
    pub eye_margin: u32,
    /// Horizontal/vertical ratio for the lying-down test.
    pub lying_down_ratio: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            eye_margin: EYE_MARGIN_PX,
            lying_down_ratio: DEFAULT_LYING_DOWN_RATIO,
        }
    }
}

impl PipelineConfig {
    /// Sets the eye crop margin.
    #[must_use]
    pub const fn with_eye_margin(mut self, margin: u32) -> Self {
        self.eye_margin = margin;
        self
    }

    /// Sets the lying-down ratio.
    #[must_use]
    pub const fn with_lying_down_ratio(mut self, ratio: f32) -> Self {
        self.lying_down_ratio = ratio;
        self
    }
}

/// Single-frame sleep-state assessment.
#[derive(Debug, Clone)]
pub struct SleepPipeline {
    models: VisionModels,
    config: PipelineConfig,
    heuristic: LyingDownHeuristic,
}

impl SleepPipeline {
    /// Creates a pipeline over the given capabilities.
    #[must_use]
    pub fn new(models: VisionModels, config: PipelineConfig) -> Self {
        let heuristic = LyingDownHeuristic::new(config.lying_down_ratio);
        Self {
            models,
            config,
            heuristic,
        }
    }

    /// Assesses one frame.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NoFaceDetected`] when the face landmarker finds nothing
    /// - [`PipelineError::IncompleteLandmarks`] when it returns too few points
    /// - [`PipelineError::EyeRegionOutOfFrame`] when the eye crop is empty
    /// - [`PipelineError::Inference`] when face landmarking or eye classification fails
    pub fn assess(&self, frame: &Frame) -> PipelineResult<SleepVerdict> {
        let landmarks = self
            .models
            .face
            .landmarks(frame)
            .map_err(PipelineError::Inference)?
            .ok_or(PipelineError::NoFaceDetected)?;
        landmarks.ensure_covers(LEFT_EYE_INDICES)?;

        let crop = crop_eye_region(frame, &landmarks, LEFT_EYE_INDICES, self.config.eye_margin);
        if crop.is_empty() {
            debug!(bounds = ?crop.bounds, "Eye crop is empty");
            return Err(PipelineError::EyeRegionOutOfFrame);
        }

        let state = self
            .models
            .eyes
            .classify(&crop.image)
            .map_err(PipelineError::Inference)?;
        debug!(bounds = ?crop.bounds, %state, "Classified eye region");

        match state {
            EyeState::Open => Ok(SleepVerdict::Open),
            EyeState::Closed => Ok(self.corroborate(frame)),
        }
    }

    /// Checks posture for a closed-eye frame. Pose failures degrade to "no pose".
    fn corroborate(&self, frame: &Frame) -> SleepVerdict {
        let pose = self.models.pose.pose(frame).unwrap_or_else(|e| {
            warn!("Pose detection failed, treating as no pose: {e:#}");
            None
        });

        let finding = self.heuristic.finding(pose.as_ref());
        debug!(?finding, "Posture corroboration");

        match finding {
            PostureFinding::LyingDown => SleepVerdict::ClosedConfirmed,
            PostureFinding::Upright => SleepVerdict::ClosedUnconfirmed(UnconfirmedReason::Upright),
            PostureFinding::Undetected => {
                SleepVerdict::ClosedUnconfirmed(UnconfirmedReason::NoPoseDetected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.eye_margin, 5);
        assert!((config.lying_down_ratio - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_eye_margin(8)
            .with_lying_down_ratio(2.0);
        assert_eq!(config.eye_margin, 8);
        assert!((config.lying_down_ratio - 2.0).abs() < f32::EPSILON);
    }
}
