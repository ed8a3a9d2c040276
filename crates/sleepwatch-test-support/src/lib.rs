//! Test support utilities for sleepwatch.
//!
//! Provides fixed-output mocks for every core port, plus builders for
//! landmarks, poses and synthetic frames.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use sleepwatch_core::domain::EyeState;
//! use sleepwatch_core::pipeline::{PipelineConfig, SleepPipeline, VisionModels};
//! use sleepwatch_test_support::{
//!     FixedEyeClassifier, FixedFaceLandmarker, FixedPoseLandmarker, LandmarkSetBuilder,
//!     PoseBuilder, SyntheticFrame,
//! };
//!
//! let models = VisionModels::new(
//!     Arc::new(FixedFaceLandmarker::found(
//!         LandmarkSetBuilder::face_mesh().with_eye_box(0.4, 0.4, 0.5, 0.45).build(),
//!     )),
//!     Arc::new(FixedPoseLandmarker::found(PoseBuilder::lying())),
//!     Arc::new(FixedEyeClassifier::returning(EyeState::Closed)),
//! );
//! let pipeline = SleepPipeline::new(models, PipelineConfig::default());
//! let verdict = pipeline.assess(&SyntheticFrame::standard()).unwrap();
//! assert_eq!(verdict.sleep_confirmed(), Some(true));
//! ```

mod builders;
mod mocks;

pub use builders::{LandmarkSetBuilder, PoseBuilder, SyntheticFrame};
pub use mocks::{
    FailingOutcomeStore, FixedEyeClassifier, FixedFaceLandmarker, FixedPoseLandmarker,
    MemoryOutcomeStore,
};
