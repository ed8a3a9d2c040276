//! Eye-state classification port.

use image::RgbImage;

use crate::domain::EyeState;

/// Port for classifying a cropped eye region.
pub trait EyeStateClassifier: Send + Sync {
    /// Classifies a non-empty eye crop as open or closed.
    ///
    /// Implementations own their preprocessing.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn classify(&self, eye: &RgbImage) -> anyhow::Result<EyeState>;
}
