//! Sleepwatch Core - sleep-state inference pipeline
//!
//! This crate contains the domain types, the ports the pipeline depends on,
//! the decision pipeline itself (eye crop, eye-state classification, posture
//! corroboration, recording, analytics), and candle implementations of the
//! vision ports.

pub mod domain;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod ports;

pub use domain::{
    AnalyticsReport, DailySummary, EyeState, Frame, LandmarkSet, Point, PoseLandmarkSet,
    PostureFinding, PredictionResponse, SleepOutcome, SleepVerdict, UnconfirmedReason,
};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{PipelineConfig, SleepMonitor, SleepPipeline, VisionModels};
pub use ports::{EyeStateClassifier, FaceLandmarker, OutcomeStore, PoseLandmarker};
