//! Eye-region extraction from face landmarks.

// Pixel coordinates are truncated like an integer cast.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use image::RgbImage;

use crate::domain::{Frame, LandmarkSet, Point};

/// Pixels added on every side of the landmark bounding box.
pub const EYE_MARGIN_PX: u32 = 5;

/// Pixel rectangle `[x1, x2) × [y1, y2)` inside a frame.
///
/// Always satisfies `x1 <= x2 <= width` and `y1 <= y2 <= height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    /// Left edge (inclusive).
    pub x1: u32,
    /// Top edge (inclusive).
    pub y1: u32,
    /// Right edge (exclusive).
    pub x2: u32,
    /// Bottom edge (exclusive).
    pub y2: u32,
}

impl CropBox {
    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// True when the box covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// An eye sub-image together with the box it was cut from.
#[derive(Debug, Clone)]
pub struct EyeCrop {
    /// Source rectangle in frame pixels.
    pub bounds: CropBox,
    /// Cropped pixels; empty when `bounds` is empty.
    pub image: RgbImage,
}

impl EyeCrop {
    /// True when there is nothing to classify.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

fn to_pixel(normalized: f32, extent: u32) -> i64 {
    (f64::from(normalized) * f64::from(extent)).trunc() as i64
}

fn span(values: impl Iterator<Item = i64> + Clone, margin: u32, extent: u32) -> (u32, u32) {
    let margin = i64::from(margin);
    let extent_i = i64::from(extent);
    let lo = values.clone().min().unwrap_or(0);
    let hi = values.max().unwrap_or(0);

    let start = lo.saturating_sub(margin).clamp(0, extent_i);
    let end = hi.saturating_add(margin).clamp(0, extent_i);
    (start.min(end) as u32, end as u32)
}

/// Computes the margin-expanded, frame-clamped bounding box of `points`.
#[must_use]
pub fn eye_bounds(points: &[Point], width: u32, height: u32, margin: u32) -> CropBox {
    let xs = points.iter().map(|p| to_pixel(p.x, width));
    let ys = points.iter().map(|p| to_pixel(p.y, height));
    let (x1, x2) = span(xs, margin, width);
    let (y1, y2) = span(ys, margin, height);
    CropBox { x1, y1, x2, y2 }
}

/// Cuts the region spanned by `indices` (plus `margin` pixels) out of `frame`.
///
/// Indices missing from `landmarks` are skipped; callers validate coverage first.
#[must_use]
pub fn crop_eye_region(
    frame: &Frame,
    landmarks: &LandmarkSet,
    indices: &[usize],
    margin: u32,
) -> EyeCrop {
    debug_assert!(!indices.is_empty(), "eye index subset must not be empty");

    let points: Vec<Point> = indices.iter().filter_map(|&i| landmarks.get(i)).collect();
    let bounds = eye_bounds(&points, frame.width(), frame.height(), margin);
    let image = image::imageops::crop_imm(
        frame.image(),
        bounds.x1,
        bounds.y1,
        bounds.width(),
        bounds.height(),
    )
    .to_image();

    EyeCrop { bounds, image }
}
