//! Face-mesh landmark regressor and the face landmarker built on it.
//!
//! The regressor predicts 468 `(x, y, z)` points for a face ROI. The ROI
//! comes from [`BlazeFace`]: the best detection's box, squared and scaled up.

#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, prelu, Conv2d, Conv2dConfig, PReLU, VarBuilder};
use tracing::debug;

use super::blazeface::BlazeFace;
use super::blocks::{forward_all, BlockSpec, SeparableBlock};
use super::utils::{rgb_to_tensor, sigmoid, signed_unit, SquareRoi};
use crate::domain::{Frame, LandmarkSet, FACE_MESH_POINTS};
use crate::ports::FaceLandmarker;

/// Input size of the face-mesh regressor.
pub const MESH_INPUT_SIZE: u32 = 192;

/// Scale applied to the detection box to form the mesh ROI.
pub const ROI_SCALE: f32 = 1.5;

const BACKBONE: [BlockSpec; 14] = [
    (16, 16, 1),
    (16, 16, 1),
    (16, 32, 2),
    (32, 32, 1),
    (32, 32, 1),
    (32, 64, 2),
    (64, 64, 1),
    (64, 64, 1),
    (64, 128, 2),
    (128, 128, 1),
    (128, 128, 1),
    (128, 128, 2),
    (128, 128, 1),
    (128, 128, 1),
];

/// Face-mesh regressor.
pub struct FaceMesh {
    stem: Conv2d,
    stem_act: PReLU,
    backbone: Vec<SeparableBlock>,
    coord_blocks: Vec<SeparableBlock>,
    coord_reduce: Conv2d,
    coord_act: PReLU,
    coord_refine: SeparableBlock,
    coord_out: Conv2d,
    conf_block: SeparableBlock,
    conf_reduce: Conv2d,
    conf_act: PReLU,
    conf_refine: SeparableBlock,
    conf_out: Conv2d,
    device: Device,
}

impl FaceMesh {
    /// Creates the regressor from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let backbone_vb = vb.pp("backbone");
        let coord_vb = vb.pp("coord_head");
        let conf_vb = vb.pp("conf_head");

        let stem = conv2d(
            3,
            16,
            3,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            backbone_vb.pp("0"),
        )?;

        Ok(Self {
            stem,
            stem_act: prelu(Some(16), backbone_vb.pp("1"))?,
            backbone: SeparableBlock::stack(&BACKBONE, &backbone_vb, 2, SeparableBlock::prelu)?,
            coord_blocks: SeparableBlock::stack(
                &[(128, 128, 2), (128, 128, 1), (128, 128, 1)],
                &coord_vb,
                0,
                SeparableBlock::prelu,
            )?,
            coord_reduce: conv2d(128, 32, 1, Conv2dConfig::default(), coord_vb.pp("3"))?,
            coord_act: prelu(Some(32), coord_vb.pp("4"))?,
            coord_refine: SeparableBlock::prelu((32, 32, 1), &coord_vb.pp("5"))?,
            coord_out: conv2d(32, FACE_MESH_POINTS * 3, 3, Conv2dConfig::default(), coord_vb.pp("6"))?,
            conf_block: SeparableBlock::prelu((128, 128, 2), &conf_vb.pp("0"))?,
            conf_reduce: conv2d(128, 32, 1, Conv2dConfig::default(), conf_vb.pp("1"))?,
            conf_act: prelu(Some(32), conf_vb.pp("2"))?,
            conf_refine: SeparableBlock::prelu((32, 32, 1), &conf_vb.pp("3"))?,
            conf_out: conv2d(32, 1, 3, Conv2dConfig::default(), conf_vb.pp("4"))?,
            device: vb.device().clone(),
        })
    }

    /// Runs the regressor on a `(1, 3, 192, 192)` input.
    ///
    /// Returns 468 `[x, y, z]` points in input pixels and the face-presence logit.
    fn forward(&self, x: &Tensor) -> Result<(Vec<[f32; 3]>, f32)> {
        // reflection pad one pixel on the left and top
        let x = Tensor::cat(&[&x.narrow(3, 1, 1)?, x], 3)?;
        let x = Tensor::cat(&[&x.narrow(2, 1, 1)?, &x], 2)?;

        let x = self.stem_act.forward(&self.stem.forward(&x)?)?;
        let features = forward_all(&self.backbone, x)?;

        let c = self.conf_block.forward(&features)?;
        let c = self.conf_act.forward(&self.conf_reduce.forward(&c)?)?;
        let c = self.conf_out.forward(&self.conf_refine.forward(&c)?)?;
        let confidence = c.flatten_all()?.to_vec1::<f32>()?;

        let r = forward_all(&self.coord_blocks, features)?;
        let r = self.coord_act.forward(&self.coord_reduce.forward(&r)?)?;
        let r = self.coord_out.forward(&self.coord_refine.forward(&r)?)?;
        let coords = r.flatten_all()?.to_vec1::<f32>()?;

        let points = coords
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Ok((points, confidence.first().copied().unwrap_or(f32::NEG_INFINITY)))
    }
}

/// True when the mesh's presence logit clears `min_confidence`.
fn face_present(presence_logit: f32, min_confidence: f32) -> bool {
    sigmoid(presence_logit) >= min_confidence
}

/// [`FaceLandmarker`] backed by `BlazeFace` detection and the face-mesh regressor.
pub struct CandleFaceLandmarker {
    detector: BlazeFace,
    mesh: FaceMesh,
    min_confidence: f32,
}

impl CandleFaceLandmarker {
    /// Wraps loaded models.
    ///
    /// Faces are ignored when either the detector score or the mesh presence
    /// score is below `min_confidence`.
    #[must_use]
    pub const fn new(detector: BlazeFace, mesh: FaceMesh, min_confidence: f32) -> Self {
        Self {
            detector,
            mesh,
            min_confidence,
        }
    }
}

impl FaceLandmarker for CandleFaceLandmarker {
    fn landmarks(&self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        let detections = self.detector.detect(frame.image(), self.min_confidence)?;
        let Some(face) = detections.first() else {
            return Ok(None);
        };

        let roi = SquareRoi::around(face.bbox, frame.width(), frame.height(), ROI_SCALE);
        let patch = roi.extract(frame.image(), MESH_INPUT_SIZE);
        let input = rgb_to_tensor(&patch, &self.mesh.device, signed_unit)?;
        let (points, presence) = self
            .mesh
            .forward(&input)
            .context("Face-mesh forward pass failed")?;

        debug!(
            score = face.score,
            presence = sigmoid(presence),
            ?roi,
            "Face mesh"
        );

        if !face_present(presence, self.min_confidence) {
            debug!("Face mesh rejected the detector ROI");
            return Ok(None);
        }

        let landmarks = points
            .iter()
            .map(|p| roi.to_frame(p[0], p[1], MESH_INPUT_SIZE, frame.width(), frame.height()))
            .collect();
        Ok(Some(LandmarkSet::new(landmarks)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use candle_core::DType;

    #[test]
    fn test_forward_shapes_with_zero_weights() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let mesh = FaceMesh::new(vb).unwrap();
        let input = Tensor::zeros((1, 3, 192, 192), DType::F32, &Device::Cpu).unwrap();

        let (points, presence) = mesh.forward(&input).unwrap();
        assert_eq!(points.len(), FACE_MESH_POINTS);
        assert!(presence.abs() < 1e-6);
    }

    #[test]
    fn test_face_present_threshold() {
        // sigmoid(0) = 0.5
        assert!(face_present(0.0, 0.5));
        assert!(face_present(4.0, 0.9));
        assert!(!face_present(-4.0, 0.5));
        assert!(!face_present(f32::NEG_INFINITY, 0.1));
    }
}
