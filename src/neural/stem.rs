use tch::{nn, Tensor};
use tch::nn::ModuleT;
use crate::neural::activation::Activation;
use crate::neural::utils::{batch_norm2d, conv2d};

// Convolution stem in front of the residual tower, its layers sit at the
// root as `stem_conv0` and `stem_bn0`
#[derive(Debug)]
pub struct Stem {
    conv0: nn::Conv2D,
    bn0: nn::BatchNorm,
    act: Activation,
}

impl Stem {
    pub fn new(vs: &nn::Path, input_channels: i64, channels: i64, act: Activation) -> Self {
        Stem {
            conv0: conv2d(vs / "stem_conv0", input_channels, channels, 3),
            bn0: batch_norm2d(vs / "stem_bn0", channels),
            act,
        }
    }

    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let out = x.apply(&self.conv0);
        self.act.apply(&self.bn0.forward_t(&out, train))
    }
}
