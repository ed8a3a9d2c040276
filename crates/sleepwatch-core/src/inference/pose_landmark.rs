//! Body-pose landmark regressor and the pose landmarker built on it.
//!
//! A BlazePose-style single-person regressor over a letterboxed 256×256
//! frame: 33 landmarks in MediaPipe body topology, each
//! `(x, y, z, visibility, presence)` in input pixels, plus a pose-flag logit.

#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, prelu, Conv2d, Conv2dConfig, PReLU, VarBuilder};
use tracing::debug;

use super::blocks::{forward_all, BlockSpec, SeparableBlock};
use super::utils::{rgb_to_tensor, sigmoid, unit, Letterbox};
use crate::domain::{Frame, Point, PoseLandmarkSet};
use crate::ports::PoseLandmarker;

/// Input size of the pose regressor.
pub const POSE_INPUT_SIZE: u32 = 256;

/// Landmarks in the body topology.
pub const BODY_LANDMARKS: usize = 33;

/// Values per landmark.
const VALUES_PER_LANDMARK: usize = 5;

const BACKBONE: [BlockSpec; 11] = [
    (24, 24, 1),
    (24, 48, 2),
    (48, 48, 1),
    (48, 96, 2),
    (96, 96, 1),
    (96, 192, 2),
    (192, 192, 1),
    (192, 288, 2),
    (288, 288, 1),
    (288, 288, 2),
    (288, 288, 1),
];

/// Raw regressor output.
#[derive(Debug, Clone)]
pub struct PoseOutput {
    /// `[x, y, z, visibility, presence]` per landmark, coordinates in input pixels.
    pub landmarks: Vec<[f32; VALUES_PER_LANDMARK]>,
    /// Probability that a body is present.
    pub pose_score: f32,
}

/// Pose landmark regressor.
pub struct PoseLandmarkNet {
    stem: Conv2d,
    stem_act: PReLU,
    backbone: Vec<SeparableBlock>,
    landmark_block: SeparableBlock,
    landmark_out: Conv2d,
    flag_block: SeparableBlock,
    flag_out: Conv2d,
    device: Device,
}

impl PoseLandmarkNet {
    /// Creates the regressor from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let stem = conv2d(
            3,
            24,
            3,
            Conv2dConfig {
                stride: 2,
                padding: 1,
                ..Conv2dConfig::default()
            },
            vb.pp("stem.conv"),
        )?;
        let head_vb = vb.pp("landmark_head");
        let flag_vb = vb.pp("flag_head");

        Ok(Self {
            stem,
            stem_act: prelu(Some(24), vb.pp("stem.act"))?,
            backbone: SeparableBlock::stack(&BACKBONE, &vb.pp("backbone"), 0, SeparableBlock::prelu)?,
            landmark_block: SeparableBlock::prelu((288, 288, 2), &head_vb.pp("block"))?,
            landmark_out: conv2d(
                288,
                BODY_LANDMARKS * VALUES_PER_LANDMARK,
                2,
                Conv2dConfig::default(),
                head_vb.pp("out"),
            )?,
            flag_block: SeparableBlock::prelu((288, 288, 2), &flag_vb.pp("block"))?,
            flag_out: conv2d(288, 1, 2, Conv2dConfig::default(), flag_vb.pp("out"))?,
            device: vb.device().clone(),
        })
    }

    /// Runs the regressor on a `(1, 3, 256, 256)` input.
    fn forward(&self, x: &Tensor) -> Result<PoseOutput> {
        let x = self.stem_act.forward(&self.stem.forward(x)?)?;
        let features = forward_all(&self.backbone, x)?;

        let flag = self
            .flag_out
            .forward(&self.flag_block.forward(&features)?)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        let values = self
            .landmark_out
            .forward(&self.landmark_block.forward(&features)?)?
            .flatten_all()?
            .to_vec1::<f32>()?;

        let landmarks = values
            .chunks_exact(VALUES_PER_LANDMARK)
            .map(|c| [c[0], c[1], c[2], c[3], c[4]])
            .collect();
        Ok(PoseOutput {
            landmarks,
            pose_score: sigmoid(flag.first().copied().unwrap_or(f32::NEG_INFINITY)),
        })
    }
}

/// [`PoseLandmarker`] backed by [`PoseLandmarkNet`].
pub struct CandlePoseLandmarker {
    net: PoseLandmarkNet,
    min_confidence: f32,
}

impl CandlePoseLandmarker {
    /// Wraps a loaded network. Poses scoring below `min_confidence` count as absent.
    #[must_use]
    pub const fn new(net: PoseLandmarkNet, min_confidence: f32) -> Self {
        Self {
            net,
            min_confidence,
        }
    }
}

/// Converts regressor output to frame-normalized shoulders and hips.
///
/// Returns `None` when the pose score is under `min_confidence`.
fn to_pose_set(
    output: &PoseOutput,
    letterbox: &Letterbox,
    frame_w: u32,
    frame_h: u32,
    min_confidence: f32,
) -> Option<PoseLandmarkSet> {
    if output.pose_score < min_confidence {
        return None;
    }
    let points: Vec<Point> = output
        .landmarks
        .iter()
        .map(|l| letterbox.to_frame(l[0], l[1], frame_w, frame_h))
        .collect();
    PoseLandmarkSet::from_body_topology(&points)
}

impl PoseLandmarker for CandlePoseLandmarker {
    fn pose(&self, frame: &Frame) -> Result<Option<PoseLandmarkSet>> {
        let letterbox = Letterbox::fit(frame.image(), POSE_INPUT_SIZE);
        let input = rgb_to_tensor(&letterbox.image, &self.net.device, unit)?;
        let output = self
            .net
            .forward(&input)
            .context("Pose forward pass failed")?;

        debug!(score = output.pose_score, "Pose regressor");
        Ok(to_pose_set(
            &output,
            &letterbox,
            frame.width(),
            frame.height(),
            self.min_confidence,
        ))
    }
}
