//! `BlazeFace` face detection model.
//!
//! The short-range ("front") variant from "`BlazeFace`: Sub-millisecond Neural Face
//! Detection on Mobile GPUs", with batch norm folded into convolution biases.
//! Used here only to locate the face ROI handed to the face-mesh regressor.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use super::blocks::{forward_all, BlockSpec, SeparableBlock};
use super::utils::{rgb_to_tensor, sigmoid, signed_unit};

/// Input image size for `BlazeFace`.
pub const INPUT_SIZE: u32 = 128;

/// Non-maximum suppression IOU threshold.
const NMS_THRESHOLD: f32 = 0.3;

/// Feature-map grids and anchors per cell.
const ANCHOR_GRIDS: [(u8, usize); 2] = [(16, 2), (8, 6)];

const BACKBONE1: [BlockSpec; 11] = [
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2),
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2),
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];

const BACKBONE2: [BlockSpec; 5] = [
    (88, 96, 2),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// A detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    /// Face bounding box `[x_min, y_min, x_max, y_max]` in normalized `[0,1]` coordinates.
    pub bbox: [f32; 4],
    /// Detection confidence score.
    pub score: f32,
}

/// `BlazeFace` face detection model.
pub struct BlazeFace {
    conv0: Conv2d,
    backbone1: Vec<SeparableBlock>,
    backbone2: Vec<SeparableBlock>,
    classifier_16: Conv2d,
    regressor_16: Conv2d,
    classifier_8: Conv2d,
    regressor_8: Conv2d,
    anchors: Vec<[f32; 2]>,
    device: Device,
}

impl BlazeFace {
    /// Creates the model from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let head = |in_c, out_c, name: &str| conv2d(in_c, out_c, 1, Conv2dConfig::default(), vb.pp(name));

        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        Ok(Self {
            conv0,
            backbone1: SeparableBlock::stack(&BACKBONE1, &vb.pp("backbone1"), 0, SeparableBlock::relu)?,
            backbone2: SeparableBlock::stack(&BACKBONE2, &vb.pp("backbone2"), 0, SeparableBlock::relu)?,
            classifier_16: head(88, 2, "classifier_16")?,
            regressor_16: head(88, 32, "regressor_16")?,
            classifier_8: head(96, 6, "classifier_8")?,
            regressor_8: head(96, 96, "regressor_8")?,
            anchors: anchor_centers(),
            device: vb.device().clone(),
        })
    }

    /// Runs the network, returning `(scores (1, 896, 1), boxes (1, 896, 16))`.
    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let x = self.conv0.forward(&x)?.relu()?;

        let feature_16 = forward_all(&self.backbone1, x)?;
        let feature_8 = forward_all(&self.backbone2, feature_16.clone())?;

        let flatten = |t: Tensor, n: usize, k: usize| -> candle_core::Result<Tensor> {
            t.permute((0, 2, 3, 1))?.reshape((1, n, k))
        };

        let scores = Tensor::cat(
            &[
                flatten(self.classifier_16.forward(&feature_16)?, 512, 1)?,
                flatten(self.classifier_8.forward(&feature_8)?, 384, 1)?,
            ],
            1,
        )?;
        let boxes = Tensor::cat(
            &[
                flatten(self.regressor_16.forward(&feature_16)?, 512, 16)?,
                flatten(self.regressor_8.forward(&feature_8)?, 384, 16)?,
            ],
            1,
        )?;

        Ok((scores, boxes))
    }

    /// Detects faces scoring at least `min_score`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(&self, image: &RgbImage, min_score: f32) -> Result<Vec<FaceDetection>> {
        let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let input = rgb_to_tensor(&resized, &self.device, signed_unit)?;
        let (scores, boxes) = self.forward(&input).context("BlazeFace forward pass failed")?;

        let scores = scores.squeeze(0)?.squeeze(1)?.to_vec1::<f32>()?;
        let boxes = boxes.squeeze(0)?.to_vec2::<f32>()?;

        let candidates: Vec<FaceDetection> = scores
            .iter()
            .zip(&boxes)
            .zip(&self.anchors)
            .filter_map(|((&logit, raw), anchor)| {
                let score = sigmoid(logit);
                (score >= min_score).then(|| decode_box(raw, *anchor, score))
            })
            .collect();

        let detections = nms(candidates);
        debug!(faces = detections.len(), "BlazeFace detections");
        Ok(detections)
    }
}

/// Anchor centers for every grid cell, 16×16×2 then 8×8×6.
fn anchor_centers() -> Vec<[f32; 2]> {
    ANCHOR_GRIDS
        .iter()
        .flat_map(|&(grid, per_cell)| {
            let g = f32::from(grid);
            (0..grid).flat_map(move |y| {
                (0..grid).flat_map(move |x| {
                    let c = [(f32::from(x) + 0.5) / g, (f32::from(y) + 0.5) / g];
                    std::iter::repeat(c).take(per_cell)
                })
            })
        })
        .collect()
}

/// Decodes one regressor row relative to its anchor.
fn decode_box(raw: &[f32], anchor: [f32; 2], score: f32) -> FaceDetection {
    let s = INPUT_SIZE as f32;
    let cx = anchor[0] + raw[0] / s;
    let cy = anchor[1] + raw[1] / s;
    let (w, h) = (raw[2] / s, raw[3] / s);

    FaceDetection {
        bbox: [
            (cx - w / 2.0).clamp(0.0, 1.0),
            (cy - h / 2.0).clamp(0.0, 1.0),
            (cx + w / 2.0).clamp(0.0, 1.0),
            (cy + h / 2.0).clamp(0.0, 1.0),
        ],
        score,
    }
}

/// Greedy non-maximum suppression; output sorted by score, best first.
fn nms(mut detections: Vec<FaceDetection>) -> Vec<FaceDetection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<FaceDetection> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(&k.bbox, &det.bbox) < NMS_THRESHOLD) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection over Union for two bounding boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = (a[2] - a[0]) * (a[3] - a[1]) + (b[2] - b[0]) * (b[3] - b[1]) - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
