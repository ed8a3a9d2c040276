//! Shared inference utilities.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::domain::Point;

/// Sigmoid activation function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Converts an RGB image to a `(1, 3, H, W)` tensor, mapping each byte through `scale`.
///
/// # Errors
///
/// Returns an error if tensor creation fails.
pub fn rgb_to_tensor(image: &RgbImage, device: &Device, scale: impl Fn(u8) -> f32) -> Result<Tensor> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let data: Vec<f32> = image.pixels().flat_map(|p| p.0.map(&scale)).collect();

    Tensor::from_vec(data, (1, h, w, 3), device)?
        .permute((0, 3, 1, 2))?
        .contiguous()
        .context("Failed to build image tensor")
}

/// Maps a byte to `[-1, 1]`.
#[inline]
pub fn signed_unit(v: u8) -> f32 {
    f32::from(v) / 127.5 - 1.0
}

/// Maps a byte to `[0, 1]`.
#[inline]
pub fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// An axis-aligned square region in frame pixels. May extend past the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRoi {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Side length.
    pub size: f32,
}

impl SquareRoi {
    /// Square of side `scale * max(w, h)` centered on a normalized box `[x_min, y_min, x_max, y_max]`.
    #[must_use]
    pub fn around(bbox: [f32; 4], frame_w: u32, frame_h: u32, scale: f32) -> Self {
        let (fw, fh) = (frame_w as f32, frame_h as f32);
        let cx = (bbox[0] + bbox[2]) / 2.0 * fw;
        let cy = (bbox[1] + bbox[3]) / 2.0 * fh;
        let size = ((bbox[2] - bbox[0]) * fw).max((bbox[3] - bbox[1]) * fh) * scale;
        Self {
            x: cx - size / 2.0,
            y: cy - size / 2.0,
            size: size.max(1.0),
        }
    }

    /// Cuts the ROI out of `image`, zero-filling outside the frame, resized to `side × side`.
    #[must_use]
    pub fn extract(&self, image: &RgbImage, side: u32) -> RgbImage {
        let extent = self.size.ceil().max(1.0) as u32;
        let (x0, y0) = (self.x.floor() as i64, self.y.floor() as i64);
        let canvas = RgbImage::from_fn(extent, extent, |u, v| {
            let sx = x0 + i64::from(u);
            let sy = y0 + i64::from(v);
            if sx >= 0 && sy >= 0 && sx < i64::from(image.width()) && sy < i64::from(image.height()) {
                *image.get_pixel(sx as u32, sy as u32)
            } else {
                Rgb([0, 0, 0])
            }
        });
        imageops::resize(&canvas, side, side, FilterType::Triangle)
    }

    /// Maps a point in the `side × side` ROI raster back to normalized frame coordinates.
    #[must_use]
    pub fn to_frame(&self, px: f32, py: f32, side: u32, frame_w: u32, frame_h: u32) -> Point {
        let extent = self.size.ceil().max(1.0);
        let k = extent / side as f32;
        Point::new(
            (self.x.floor() + px * k) / frame_w as f32,
            (self.y.floor() + py * k) / frame_h as f32,
        )
    }
}

/// An image scaled to fit a square canvas with preserved aspect ratio.
#[derive(Debug, Clone)]
pub struct Letterbox {
    /// The padded square image.
    pub image: RgbImage,
    /// Frame-to-canvas scale factor.
    pub scale: f32,
    /// Horizontal padding on the left, in canvas pixels.
    pub pad_x: u32,
    /// Vertical padding on the top, in canvas pixels.
    pub pad_y: u32,
}

impl Letterbox {
    /// Fits `image` into a black `side × side` canvas, centered.
    #[must_use]
    pub fn fit(image: &RgbImage, side: u32) -> Self {
        let (w, h) = (image.width().max(1), image.height().max(1));
        let scale = side as f32 / w.max(h) as f32;
        let nw = ((w as f32 * scale).round() as u32).clamp(1, side);
        let nh = ((h as f32 * scale).round() as u32).clamp(1, side);
        let resized = imageops::resize(image, nw, nh, FilterType::Triangle);

        let pad_x = (side - nw) / 2;
        let pad_y = (side - nh) / 2;
        let mut canvas = RgbImage::new(side, side);
        imageops::replace(&mut canvas, &resized, i64::from(pad_x), i64::from(pad_y));

        Self {
            image: canvas,
            scale,
            pad_x,
            pad_y,
        }
    }

    /// Maps canvas pixel coordinates back to normalized frame coordinates.
    #[must_use]
    pub fn to_frame(&self, px: f32, py: f32, frame_w: u32, frame_h: u32) -> Point {
        Point::new(
            (px - self.pad_x as f32) / self.scale / frame_w.max(1) as f32,
            (py - self.pad_y as f32) / self.scale / frame_h.max(1) as f32,
        )
    }
}
