//! Builders for landmarks, poses and synthetic frames.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sleepwatch_core::domain::{
    Frame, LandmarkSet, Point, PoseLandmarkSet, FACE_MESH_POINTS, LEFT_EYE_INDICES,
};

/// Builder for face-mesh landmark sets.
///
/// Starts with every point at the frame center.
pub struct LandmarkSetBuilder {
    points: Vec<Point>,
}

impl LandmarkSetBuilder {
    /// A full 468-point mesh.
    #[must_use]
    pub fn face_mesh() -> Self {
        Self::with_len(FACE_MESH_POINTS)
    }

    /// A mesh with `len` points; shorter than 468 simulates a broken provider.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            points: vec![Point::new(0.5, 0.5); len],
        }
    }

    /// Spreads the left-eye indices over the normalized box `(x1, y1)`–`(x2, y2)`.
    ///
    /// The first eye index lands on the top-left corner, the second on the
    /// bottom-right, the rest in between.
    #[must_use]
    pub fn with_eye_box(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let n = LEFT_EYE_INDICES.len();
        for (k, &idx) in LEFT_EYE_INDICES.iter().enumerate() {
            let p = match k {
                0 => Point::new(x1, y1),
                1 => Point::new(x2, y2),
                _ => {
                    #[allow(clippy::cast_precision_loss)]
                    let t = k as f32 / n as f32;
                    Point::new(x1 + (x2 - x1) * t, y1 + (y2 - y1) * t)
                }
            };
            if let Some(slot) = self.points.get_mut(idx) {
                *slot = p;
            }
        }
        self
    }

    /// Sets one point.
    #[must_use]
    pub fn with_point(mut self, index: usize, point: Point) -> Self {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = point;
        }
        self
    }

    /// Finishes the set.
    #[must_use]
    pub fn build(self) -> LandmarkSet {
        LandmarkSet::new(self.points)
    }
}

/// Builder for shoulder/hip poses.
pub struct PoseBuilder;

impl PoseBuilder {
    /// Pose whose shoulder and hip midpoints are the given points.
    ///
    /// Left/right landmarks sit symmetrically 0.05 either side horizontally.
    #[must_use]
    pub fn from_midpoints(shoulder: (f32, f32), hip: (f32, f32)) -> PoseLandmarkSet {
        PoseLandmarkSet {
            left_shoulder: Point::new(shoulder.0 - 0.05, shoulder.1),
            right_shoulder: Point::new(shoulder.0 + 0.05, shoulder.1),
            left_hip: Point::new(hip.0 - 0.05, hip.1),
            right_hip: Point::new(hip.0 + 0.05, hip.1),
        }
    }

    /// A reclined torso: shoulder mid (0.5, 0.5), hip mid (0.9, 0.52).
    #[must_use]
    pub fn lying() -> PoseLandmarkSet {
        Self::from_midpoints((0.5, 0.5), (0.9, 0.52))
    }

    /// An upright torso: shoulder mid (0.5, 0.3), hip mid (0.52, 0.7).
    #[must_use]
    pub fn upright() -> PoseLandmarkSet {
        Self::from_midpoints((0.5, 0.3), (0.52, 0.7))
    }
}

/// Synthetic frames and encoded images.
pub struct SyntheticFrame;

impl SyntheticFrame {
    /// A uniform-color frame.
    #[must_use]
    pub fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        Frame::from(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    /// A mid-gray 640×480 frame.
    #[must_use]
    pub fn standard() -> Frame {
        Self::uniform(640, 480, [128, 128, 128])
    }

    /// PNG-encoded gradient image.
    #[must_use]
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        Self::encode(width, height, ImageFormat::Png)
    }

    /// JPEG-encoded gradient image.
    #[must_use]
    pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        Self::encode(width, height, ImageFormat::Jpeg)
    }

    /// Minimal GIF header bytes; recognizable as GIF but not accepted by the pipeline.
    #[must_use]
    pub fn gif_bytes() -> Vec<u8> {
        b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Cursor::new(Vec::new());
        if let Err(e) = DynamicImage::ImageRgb8(img).write_to(&mut buf, format) {
            panic!("encoding synthetic {format:?} failed: {e}");
        }
        buf.into_inner()
    }
}
