//! Eye-state classifier for open/closed detection.
//!
//! A small CNN over a 64×64 grayscale eye crop replicated to three channels.
//! Weights are a safetensors conversion of the trained state dict, so tensor
//! names follow its `conv_layers` / `fc_layers` sequential indices.

#![allow(clippy::cast_possible_truncation)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use crate::domain::EyeState;
use crate::ports::EyeStateClassifier;

/// Preprocessing constants the classifier was trained with.
pub struct EyePreprocessing;

impl EyePreprocessing {
    /// Side length of the square network input.
    pub const INPUT_SIZE: u32 = 64;
    /// Per-channel mean after scaling to `[0, 1]`.
    pub const MEAN: f32 = 0.5;
    /// Per-channel standard deviation after scaling to `[0, 1]`.
    pub const STD: f32 = 0.5;
    /// Resampling filter for the resize step (bilinear).
    pub const FILTER: FilterType = FilterType::Triangle;
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
    l.min(255) as u8
}

/// Turns an eye crop into the classifier's input values, CHW order, length `3 * 64 * 64`.
///
/// Grayscale, resize to 64×64 bilinear, scale to `[0, 1]`, then `(x - 0.5) / 0.5`;
/// the gray plane is repeated for all three channels.
#[must_use]
pub fn preprocess_eye(eye: &RgbImage) -> Vec<f32> {
    let gray = GrayImage::from_fn(eye.width(), eye.height(), |x, y| {
        let [r, g, b] = eye.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    });
    let side = EyePreprocessing::INPUT_SIZE;
    let resized = imageops::resize(&gray, side, side, EyePreprocessing::FILTER);

    let plane: Vec<f32> = resized
        .pixels()
        .map(|p| (f32::from(p.0[0]) / 255.0 - EyePreprocessing::MEAN) / EyePreprocessing::STD)
        .collect();

    let mut chw = Vec::with_capacity(plane.len() * 3);
    for _ in 0..3 {
        chw.extend_from_slice(&plane);
    }
    chw
}

/// The eye-state CNN.
///
/// `3 × (conv3x3 → ReLU → maxpool2)` over 3→32→64→128 channels, then
/// `8192 → 128 → ReLU → 2` logits indexed Closed, Open.
pub struct EyeStateNet {
    convs: [Conv2d; 3],
    fc1: Linear,
    fc2: Linear,
}

impl EyeStateNet {
    /// Creates the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let conv_vb = vb.pp("conv_layers");
        let cfg = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };
        let conv = |in_c, out_c, idx: usize| conv2d(in_c, out_c, 3, cfg, conv_vb.pp(idx.to_string()));

        let fc_vb = vb.pp("fc_layers");
        Ok(Self {
            convs: [conv(3, 32, 0)?, conv(32, 64, 3)?, conv(64, 128, 6)?],
            fc1: linear(128 * 8 * 8, 128, fc_vb.pp("1"))?,
            fc2: linear(128, 2, fc_vb.pp("3"))?,
        })
    }
}

impl Module for EyeStateNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for conv in &self.convs {
            h = conv.forward(&h)?.relu()?.max_pool2d(2)?;
        }
        let h = self.fc1.forward(&h.flatten_from(1)?)?.relu()?;
        self.fc2.forward(&h)
    }
}

/// [`EyeStateClassifier`] backed by [`EyeStateNet`].
pub struct CandleEyeClassifier {
    net: EyeStateNet,
    device: Device,
}

impl CandleEyeClassifier {
    /// Wraps a loaded network.
    #[must_use]
    pub const fn new(net: EyeStateNet, device: Device) -> Self {
        Self { net, device }
    }
}

impl EyeStateClassifier for CandleEyeClassifier {
    fn classify(&self, eye: &RgbImage) -> Result<EyeState> {
        let side = EyePreprocessing::INPUT_SIZE as usize;
        let input = Tensor::from_vec(preprocess_eye(eye), (1, 3, side, side), &self.device)?;

        let logits = self.net.forward(&input).context("Eye-state forward pass failed")?;
        let class = logits.argmax(D::Minus1)?.squeeze(0)?.to_scalar::<u32>()?;
        debug!(class, "Eye-state logits argmax");

        EyeState::from_class_index(class as usize)
            .with_context(|| format!("Eye-state model produced class index {class}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use candle_core::DType;
    use image::Rgb;

    #[test]
    fn test_fc_input_size() {
        // 64 -> 32 -> 16 -> 8
        assert_eq!(EyePreprocessing::INPUT_SIZE / 2 / 2 / 2, 8);
    }

    #[test]
    fn test_luma_matches_pil() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let eye = RgbImage::from_fn(23, 11, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 77]));
        let v = preprocess_eye(&eye);
        assert_eq!(v.len(), 3 * 64 * 64);
        assert!(v.iter().all(|&a| (-1.0..=1.0).contains(&a)));

        let plane = 64 * 64;
        assert_eq!(&v[..plane], &v[plane..2 * plane]);
        assert_eq!(&v[..plane], &v[2 * plane..]);
    }

    #[test]
    fn test_preprocess_extremes() {
        let black = preprocess_eye(&RgbImage::new(8, 8));
        assert!(black.iter().all(|&a| (a + 1.0).abs() < 1e-6));

        let white = preprocess_eye(&RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        assert!(white.iter().all(|&a| (a - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_classify_follows_argmax() {
        // zero weights everywhere, so the final bias alone decides the class
        let zeros = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let mut net = EyeStateNet::new(zeros).unwrap();

        for (bias, expected) in [([0.0f32, 1.0], EyeState::Open), ([1.0, 0.0], EyeState::Closed)] {
            net.fc2 = Linear::new(
                Tensor::zeros((2, 128), DType::F32, &Device::Cpu).unwrap(),
                Some(Tensor::new(&bias, &Device::Cpu).unwrap()),
            );
            let classifier = CandleEyeClassifier::new(net, Device::Cpu);
            assert_eq!(classifier.classify(&RgbImage::new(20, 10)).unwrap(), expected);
            net = classifier.net;
        }
    }

    #[test]
    fn test_net_loads_from_zero_backend() {
        let net = EyeStateNet::new(VarBuilder::zeros(DType::F32, &Device::Cpu)).unwrap();
        let input = Tensor::zeros((1, 3, 64, 64), DType::F32, &Device::Cpu).unwrap();
        assert_eq!(net.forward(&input).unwrap().dims(), &[1, 2]);
    }
}
