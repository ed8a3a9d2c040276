//! Depthwise-separable residual blocks shared by the BlazeFace family of networks.

use anyhow::Result;
use candle_core::{Module, Tensor};
use candle_nn::{conv2d, prelu, Conv2d, Conv2dConfig, PReLU, VarBuilder};

/// Block geometry: `(in_channels, out_channels, stride)` with a 3×3 depthwise kernel.
pub type BlockSpec = (usize, usize, usize);

enum Activation {
    Relu,
    PRelu(PReLU),
}

/// Depthwise conv → pointwise conv, added to a (max-pooled, channel-padded) skip path,
/// then activated.
///
/// Convolutions carry biases with batch norm folded in.
pub struct SeparableBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    activation: Activation,
    channel_pad: usize,
    stride: usize,
}

impl SeparableBlock {
    /// ReLU block with weights under `depthwise` / `pointwise`.
    pub fn relu(spec: BlockSpec, vb: &VarBuilder) -> Result<Self> {
        Self::build(spec, vb.pp("depthwise"), vb.pp("pointwise"), Activation::Relu)
    }

    /// PReLU block with weights under `convs.0` / `convs.1` / `act`.
    pub fn prelu(spec: BlockSpec, vb: &VarBuilder) -> Result<Self> {
        let act = prelu(Some(spec.1), vb.pp("act"))?;
        Self::build(
            spec,
            vb.pp("convs.0"),
            vb.pp("convs.1"),
            Activation::PRelu(act),
        )
    }

    fn build(
        (in_channels, out_channels, stride): BlockSpec,
        depthwise_vb: VarBuilder,
        pointwise_vb: VarBuilder,
        activation: Activation,
    ) -> Result<Self> {
        let padding = if stride == 2 { 0 } else { 1 };
        let depthwise = conv2d(
            in_channels,
            in_channels,
            3,
            Conv2dConfig {
                stride,
                padding,
                groups: in_channels,
                ..Conv2dConfig::default()
            },
            depthwise_vb,
        )?;
        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            pointwise_vb,
        )?;

        Ok(Self {
            depthwise,
            pointwise,
            activation,
            channel_pad: out_channels.saturating_sub(in_channels),
            stride,
        })
    }

    /// Builds a run of blocks named `{prefix}.{offset + i}`.
    pub fn stack(
        specs: &[BlockSpec],
        vb: &VarBuilder,
        offset: usize,
        ctor: fn(BlockSpec, &VarBuilder) -> Result<Self>,
    ) -> Result<Vec<Self>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| ctor(*spec, &vb.pp((offset + i).to_string())))
            .collect()
    }
}

impl Module for SeparableBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (h, skip) = if self.stride == 2 {
            // pad bottom/right only
            let padded = x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?;
            (padded, x.max_pool2d(2)?)
        } else {
            (x.clone(), x.clone())
        };

        let h = self.pointwise.forward(&self.depthwise.forward(&h)?)?;
        let skip = if self.channel_pad > 0 {
            skip.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            skip
        };

        let sum = (h + skip)?;
        match &self.activation {
            Activation::Relu => sum.relu(),
            Activation::PRelu(act) => act.forward(&sum),
        }
    }
}

/// Runs `x` through every block in order.
pub fn forward_all(blocks: &[SeparableBlock], x: Tensor) -> candle_core::Result<Tensor> {
    blocks.iter().try_fold(x, |h, block| block.forward(&h))
}
