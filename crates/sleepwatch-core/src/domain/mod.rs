//! Core domain types for sleep-state inference.

mod frame;
mod landmarks;
mod outcome;
mod summary;

pub use frame::{is_accepted_content_type, Frame, ACCEPTED_CONTENT_TYPES};
pub use landmarks::{
    LandmarkSet, Point, PoseLandmarkSet, FACE_MESH_POINTS, LEFT_EYE_INDICES, LEFT_HIP,
    LEFT_SHOULDER, RIGHT_HIP, RIGHT_SHOULDER,
};
pub use outcome::{
    EyeState, PostureFinding, PredictionResponse, SleepOutcome, SleepVerdict, UnconfirmedReason,
};
pub use summary::{AnalyticsReport, DailySummary, ANALYTICS_WINDOW_DAYS};
