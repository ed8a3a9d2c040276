//! Face and body landmark types.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Number of points produced by the face-mesh model.
pub const FACE_MESH_POINTS: usize = 468;

/// Face-mesh indices outlining the left eye.
pub const LEFT_EYE_INDICES: &[usize] = &[33, 133, 160, 158, 159, 144, 145, 153, 154, 155];

/// MediaPipe body-topology index of the left shoulder.
pub const LEFT_SHOULDER: usize = 11;
/// MediaPipe body-topology index of the right shoulder.
pub const RIGHT_SHOULDER: usize = 12;
/// MediaPipe body-topology index of the left hip.
pub const LEFT_HIP: usize = 23;
/// MediaPipe body-topology index of the right hip.
pub const RIGHT_HIP: usize = 24;

/// A 2D point in normalized image coordinates (`0.0..=1.0` inside the frame).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, fraction of frame width.
    pub x: f32,
    /// Vertical coordinate, fraction of frame height.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Arithmetic mean of two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Ordered face landmarks, one per face-mesh index.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    /// Wraps landmark points in face-mesh index order.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Returns the point at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the set holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Checks that every index in `indices` is present.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IncompleteLandmarks`] if the set is too short.
    pub fn ensure_covers(&self, indices: &[usize]) -> PipelineResult<()> {
        let required = indices.iter().max().map_or(0, |max| max + 1);
        if self.points.len() < required {
            return Err(PipelineError::IncompleteLandmarks {
                required,
                found: self.points.len(),
            });
        }
        Ok(())
    }

    /// Looks up every index in `indices`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IncompleteLandmarks`] if any index is missing.
    pub fn select(&self, indices: &[usize]) -> PipelineResult<Vec<Point>> {
        self.ensure_covers(indices)?;
        Ok(indices.iter().map(|&i| self.points[i]).collect())
    }
}

/// The four body landmarks used for posture analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmarkSet {
    /// Left shoulder.
    pub left_shoulder: Point,
    /// Right shoulder.
    pub right_shoulder: Point,
    /// Left hip.
    pub left_hip: Point,
    /// Right hip.
    pub right_hip: Point,
}

impl PoseLandmarkSet {
    /// Picks shoulders and hips out of a full 33-point body topology.
    ///
    /// Returns `None` when the slice is too short.
    #[must_use]
    pub fn from_body_topology(points: &[Point]) -> Option<Self> {
        Some(Self {
            left_shoulder: *points.get(LEFT_SHOULDER)?,
            right_shoulder: *points.get(RIGHT_SHOULDER)?,
            left_hip: *points.get(LEFT_HIP)?,
            right_hip: *points.get(RIGHT_HIP)?,
        })
    }

    /// Midpoint of the two shoulders.
    #[must_use]
    pub fn shoulder_mid(&self) -> Point {
        self.left_shoulder.midpoint(self.right_shoulder)
    }

    /// Midpoint of the two hips.
    #[must_use]
    pub fn hip_mid(&self) -> Point {
        self.left_hip.midpoint(self.right_hip)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let mid = Point::new(0.2, 0.4).midpoint(Point::new(0.6, 0.8));
        assert!((mid.x - 0.4).abs() < 1e-6);
        assert!((mid.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_ensure_covers_full_mesh() {
        let set = LandmarkSet::new(vec![Point::default(); FACE_MESH_POINTS]);
        assert!(set.ensure_covers(LEFT_EYE_INDICES).is_ok());
        assert_eq!(set.select(LEFT_EYE_INDICES).unwrap().len(), LEFT_EYE_INDICES.len());
    }

    #[test]
    fn test_ensure_covers_short_set() {
        let set = LandmarkSet::new(vec![Point::default(); 100]);
        match set.ensure_covers(LEFT_EYE_INDICES) {
            Err(PipelineError::IncompleteLandmarks { required, found }) => {
                assert_eq!(required, 161);
                assert_eq!(found, 100);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_select_preserves_order() {
        let points: Vec<Point> = (0..200).map(|i| Point::new(i as f32, 0.0)).collect();
        let set = LandmarkSet::new(points);
        let picked = set.select(&[33, 133, 160]).unwrap();
        assert_eq!(picked[0].x, 33.0);
        assert_eq!(picked[1].x, 133.0);
        assert_eq!(picked[2].x, 160.0);
    }

    #[test]
    fn test_pose_from_body_topology() {
        let mut points = vec![Point::default(); 33];
        points[LEFT_SHOULDER] = Point::new(0.4, 0.3);
        points[RIGHT_SHOULDER] = Point::new(0.6, 0.3);
        points[LEFT_HIP] = Point::new(0.45, 0.7);
        points[RIGHT_HIP] = Point::new(0.55, 0.7);

        let pose = PoseLandmarkSet::from_body_topology(&points).unwrap();
        assert!((pose.shoulder_mid().x - 0.5).abs() < 1e-6);
        assert!((pose.hip_mid().y - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_pose_from_short_topology() {
        assert!(PoseLandmarkSet::from_body_topology(&[Point::default(); 20]).is_none());
    }
}
