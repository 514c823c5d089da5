use tch::{nn, Tensor};
use tch::nn::ModuleT;
use crate::neural::activation::Activation;
use crate::neural::mix_conv::MixConv;
use crate::neural::se_layer::SELayer;
use crate::neural::utils::{batch_norm2d, conv2d};

/// Pre-activation residual block with a mixed depthwise convolution in the middle.
///
/// The block widens to `channels_operating` with a 1x1 convolution, runs the
/// mixed convolution there, projects back to `channels` and adds the input.
/// There is no activation after the skip connection.
#[derive(Debug)]
pub struct ResidualBlock {
    bn1: nn::BatchNorm,
    conv1: nn::Conv2D,
    bn2: nn::BatchNorm,
    conv2: MixConv,
    bn3: nn::BatchNorm,
    conv3: nn::Conv2D,
    bn4: nn::BatchNorm,
    se: Option<SELayer>,
    act: Activation,
}

impl ResidualBlock {
    pub fn new(
        vs: &nn::Path,
        channels: i64,
        channels_operating: i64,
        kernels: &[i64],
        act: Activation,
        se_ratio: Option<i64>,
    ) -> Self {
        ResidualBlock {
            bn1: batch_norm2d(vs / "bn1", channels),
            conv1: conv2d(vs / "conv1", channels, channels_operating, 1),
            bn2: batch_norm2d(vs / "bn2", channels_operating),
            conv2: MixConv::new(&(vs / "conv2"), channels_operating, channels_operating, kernels),
            bn3: batch_norm2d(vs / "bn3", channels_operating),
            conv3: conv2d(vs / "conv3", channels_operating, channels, 1),
            bn4: batch_norm2d(vs / "bn4", channels),
            se: se_ratio.map(|ratio| SELayer::new(&(vs / "se"), channels, ratio, act, true)),
            act,
        }
    }

    pub fn has_se(&self) -> bool {
        self.se.is_some()
    }

    pub fn activation(&self) -> Activation {
        self.act
    }

    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let residual = x;

        let mut out = self.bn1.forward_t(x, train).apply(&self.conv1);
        out = self.act.apply(&self.bn2.forward_t(&out, train));

        out = self.conv2.forward(&out);
        out = self.act.apply(&self.bn3.forward_t(&out, train));

        out = out.apply(&self.conv3);
        out = self.bn4.forward_t(&out, train);

        if let Some(se) = &self.se {
            out = se.forward(&out);
        }

        out + residual
    }
}
