//! The sleep-state inference pipeline.

mod analytics;
mod crop;
mod decision;
mod monitor;
mod posture;
mod recorder;

pub use analytics::{summarize_by_day, Analytics};
pub use crop::{crop_eye_region, eye_bounds, CropBox, EyeCrop, EYE_MARGIN_PX};
pub use decision::{PipelineConfig, SleepPipeline, VisionModels};
pub use monitor::SleepMonitor;
pub use posture::{LyingDownHeuristic, DEFAULT_LYING_DOWN_RATIO};
pub use recorder::EventRecorder;
