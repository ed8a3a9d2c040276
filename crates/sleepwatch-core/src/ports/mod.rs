//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the pipeline and external adapters.

mod eye_classifier;
mod landmarker;
mod outcome_store;

pub use eye_classifier::EyeStateClassifier;
pub use landmarker::{FaceLandmarker, PoseLandmarker};
pub use outcome_store::OutcomeStore;
