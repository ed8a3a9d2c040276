//! Landmark extraction ports.

use crate::domain::{Frame, LandmarkSet, PoseLandmarkSet};

/// Port for locating face landmarks.
pub trait FaceLandmarker: Send + Sync {
    /// Returns landmarks of the first detected face, or `None` if there is no face.
    ///
    /// A returned set is in face-mesh index order.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn landmarks(&self, frame: &Frame) -> anyhow::Result<Option<LandmarkSet>>;
}

/// Port for locating body-pose landmarks.
pub trait PoseLandmarker: Send + Sync {
    /// Returns shoulders and hips of the detected body, or `None` if there is no pose.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn pose(&self, frame: &Frame) -> anyhow::Result<Option<PoseLandmarkSet>>;
}
