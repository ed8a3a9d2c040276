//! Lying-down heuristic over shoulder and hip midpoints.

use crate::domain::{PoseLandmarkSet, PostureFinding};

/// Default ratio of horizontal to vertical torso extent above which a body counts as lying down.
pub const DEFAULT_LYING_DOWN_RATIO: f32 = 1.5;

/// Geometric lying-down test.
///
/// The torso axis runs from the shoulder midpoint to the hip midpoint. A body is
/// lying down when that axis is more horizontal than `ratio` times its vertical extent.
/// Only differences are used, so the test is invariant under translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyingDownHeuristic {
    ratio: f32,
}

impl Default for LyingDownHeuristic {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_LYING_DOWN_RATIO,
        }
    }
}

impl LyingDownHeuristic {
    /// Creates the heuristic with a custom ratio.
    #[must_use]
    pub const fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    /// True when `horizontal > vertical * ratio`.
    #[must_use]
    pub fn is_lying_down(&self, pose: &PoseLandmarkSet) -> bool {
        let shoulder_mid = pose.shoulder_mid();
        let hip_mid = pose.hip_mid();

        let vertical = (shoulder_mid.y - hip_mid.y).abs();
        let horizontal = (shoulder_mid.x - hip_mid.x).abs();

        horizontal > vertical * self.ratio
    }

    /// Maps an optional pose to a posture finding.
    #[must_use]
    pub fn finding(&self, pose: Option<&PoseLandmarkSet>) -> PostureFinding {
        match pose {
            None => PostureFinding::Undetected,
            Some(pose) if self.is_lying_down(pose) => PostureFinding::LyingDown,
            Some(_) => PostureFinding::Upright,
        }
    }
}
