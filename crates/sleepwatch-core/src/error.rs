//! Pipeline error taxonomy.

use thiserror::Error;

/// Errors that end a single pipeline invocation.
///
/// Absence of a pose is not an error: it is reported through
/// [`SleepVerdict::ClosedUnconfirmed`](crate::domain::SleepVerdict).
/// Persistence failures never surface here either; the recorder absorbs them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input is neither JPEG nor PNG.
    #[error("Invalid image type")]
    InvalidInputType,

    /// The bytes claimed to be an image but could not be decoded.
    #[error("Could not decode image: {0}")]
    UndecodableImage(String),

    /// No face was found in the frame.
    #[error("No face detected in the image.")]
    NoFaceDetected,

    /// The eye landmarks fall entirely outside the frame.
    #[error("Eye region lies outside the image.")]
    EyeRegionOutOfFrame,

    /// The face landmarker returned fewer points than the eye subset needs.
    #[error("Landmark set has {found} points, eye region needs index {required}")]
    IncompleteLandmarks {
        /// Highest index the crop requires, plus one.
        required: usize,
        /// Number of points the provider returned.
        found: usize,
    },

    /// A mandatory capability (face landmarks, eye classifier) failed.
    #[error("Inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl PipelineError {
    /// Returns true for failures caused by the caller's input rather than the service.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInputType
                | Self::UndecodableImage(_)
                | Self::NoFaceDetected
                | Self::EyeRegionOutOfFrame
        )
    }
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
