//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use image::RgbImage;
use sleepwatch_core::domain::{
    DailySummary, EyeState, Frame, LandmarkSet, PoseLandmarkSet, SleepOutcome,
};
use sleepwatch_core::pipeline::summarize_by_day;
use sleepwatch_core::ports::{EyeStateClassifier, FaceLandmarker, OutcomeStore, PoseLandmarker};

fn bump(counter: &Mutex<usize>) {
    *counter.lock().unwrap_or_else(PoisonError::into_inner) += 1;
}

fn read(counter: &Mutex<usize>) -> usize {
    *counter.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock `FaceLandmarker` returning a fixed result.
pub struct FixedFaceLandmarker {
    landmarks: Option<LandmarkSet>,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl FixedFaceLandmarker {
    /// Always returns `landmarks`.
    #[must_use]
    pub fn found(landmarks: LandmarkSet) -> Self {
        Self {
            landmarks: Some(landmarks),
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Never finds a face.
    #[must_use]
    pub fn no_face() -> Self {
        Self {
            landmarks: None,
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            landmarks: None,
            fail: true,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of `landmarks()` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        read(&self.calls)
    }
}

impl FaceLandmarker for FixedFaceLandmarker {
    fn landmarks(&self, _frame: &Frame) -> anyhow::Result<Option<LandmarkSet>> {
        bump(&self.calls);
        if self.fail {
            anyhow::bail!("face landmarker unavailable");
        }
        Ok(self.landmarks.clone())
    }
}

/// Mock `PoseLandmarker` returning a fixed result.
pub struct FixedPoseLandmarker {
    pose: Option<PoseLandmarkSet>,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl FixedPoseLandmarker {
    /// Always returns `pose`.
    #[must_use]
    pub fn found(pose: PoseLandmarkSet) -> Self {
        Self {
            pose: Some(pose),
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Never finds a pose.
    #[must_use]
    pub fn no_pose() -> Self {
        Self {
            pose: None,
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            pose: None,
            fail: true,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of `pose()` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        read(&self.calls)
    }
}

impl PoseLandmarker for FixedPoseLandmarker {
    fn pose(&self, _frame: &Frame) -> anyhow::Result<Option<PoseLandmarkSet>> {
        bump(&self.calls);
        if self.fail {
            anyhow::bail!("pose landmarker unavailable");
        }
        Ok(self.pose)
    }
}

/// Mock `EyeStateClassifier` returning a fixed state and capturing crop sizes.
pub struct FixedEyeClassifier {
    state: Option<EyeState>,
    crops: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl FixedEyeClassifier {
    /// Always returns `state`.
    #[must_use]
    pub fn returning(state: EyeState) -> Self {
        Self {
            state: Some(state),
            crops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            state: None,
            crops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(width, height)` of every crop classified so far.
    #[must_use]
    pub fn crops(&self) -> Vec<(u32, u32)> {
        self.crops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `classify()` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.crops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EyeStateClassifier for FixedEyeClassifier {
    fn classify(&self, eye: &RgbImage) -> anyhow::Result<EyeState> {
        self.crops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(eye.dimensions());
        self.state
            .ok_or_else(|| anyhow::anyhow!("eye classifier unavailable"))
    }
}

/// In-memory `OutcomeStore`.
///
/// Captures outcomes for later assertions and aggregates with
/// [`summarize_by_day`].
pub struct MemoryOutcomeStore {
    outcomes: Arc<Mutex<Vec<SleepOutcome>>>,
}

impl MemoryOutcomeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a store pre-filled with `outcomes`.
    #[must_use]
    pub fn with_outcomes(outcomes: Vec<SleepOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes)),
        }
    }

    /// All stored outcomes, in insertion order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<SleepOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryOutcomeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeStore for MemoryOutcomeStore {
    fn append(&self, outcome: &SleepOutcome) -> anyhow::Result<()> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
        Ok(())
    }

    fn daily_summaries(&self, limit: usize) -> anyhow::Result<Vec<DailySummary>> {
        let outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(summarize_by_day(&outcomes, limit))
    }
}

/// `OutcomeStore` whose every operation fails.
pub struct FailingOutcomeStore {
    attempts: Arc<Mutex<usize>>,
}

impl FailingOutcomeStore {
    /// Creates the store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of operations attempted.
    #[must_use]
    pub fn attempts(&self) -> usize {
        read(&self.attempts)
    }
}

impl Default for FailingOutcomeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeStore for FailingOutcomeStore {
    fn append(&self, _outcome: &SleepOutcome) -> anyhow::Result<()> {
        bump(&self.attempts);
        anyhow::bail!("database is locked")
    }

    fn daily_summaries(&self, _limit: usize) -> anyhow::Result<Vec<DailySummary>> {
        bump(&self.attempts);
        anyhow::bail!("database is locked")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sleepwatch_core::domain::SleepVerdict;

    fn frame() -> Frame {
        Frame::from(RgbImage::new(4, 4))
    }

    #[test]
    fn test_fixed_face_landmarker_counts_calls() {
        let face = FixedFaceLandmarker::no_face();
        assert!(face.landmarks(&frame()).unwrap().is_none());
        assert!(face.landmarks(&frame()).unwrap().is_none());
        assert_eq!(face.calls(), 2);
    }

    #[test]
    fn test_failing_mocks() {
        assert!(FixedFaceLandmarker::failing().landmarks(&frame()).is_err());
        assert!(FixedPoseLandmarker::failing().pose(&frame()).is_err());
        assert!(FixedEyeClassifier::failing()
            .classify(&RgbImage::new(2, 2))
            .is_err());
    }

    #[test]
    fn test_eye_classifier_records_crops() {
        let eyes = FixedEyeClassifier::returning(EyeState::Closed);
        assert_eq!(eyes.classify(&RgbImage::new(7, 3)).unwrap(), EyeState::Closed);
        assert_eq!(eyes.crops(), vec![(7, 3)]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryOutcomeStore::new();
        store
            .append(&SleepOutcome::new(SleepVerdict::ClosedConfirmed, Utc::now()))
            .unwrap();
        assert_eq!(store.outcomes().len(), 1);

        let summaries = store.daily_summaries(30).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].sleep_confirmed_count, 1);
    }

    #[test]
    fn test_failing_store_counts_attempts() {
        let store = FailingOutcomeStore::new();
        assert!(store
            .append(&SleepOutcome::new(SleepVerdict::Open, Utc::now()))
            .is_err());
        assert!(store.daily_summaries(30).is_err());
        assert_eq!(store.attempts(), 2);
    }
}
