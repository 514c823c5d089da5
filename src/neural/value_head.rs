use tch::{nn, Tensor};
use crate::neural::activation::Activation;
use crate::neural::config::RiseConfig;
use crate::neural::constants::VALUE_MIX_CONV_KERNELS;
use crate::neural::mix_conv::MixConv;
use crate::neural::utils::{batch_norm2d, conv2d, global_avg_pool};

/// Outputs the value evaluation, a number in `[-1, 1]` per position.
#[derive(Debug)]
pub struct ValueHead {
    conv0: nn::Conv2D,
    bn0: nn::BatchNorm,
    mix: Option<(MixConv, nn::BatchNorm)>,
    // Concatenates globally pooled body features onto the flattened planes
    pool_concat: bool,
    fc0: nn::Linear,
    fc1: nn::Linear,
    act: Activation,
}

impl ValueHead {
    pub fn new(vs: &nn::Path, config: &RiseConfig) -> Self {
        let cvh = config.channels_value_head;
        let mut fc_in = cvh * config.board_height * config.board_width;
        if config.value_head_use_se {
            fc_in += config.channels;
        }

        let mix = config.value_head_mix_conv.then(|| {
            (
                MixConv::new(&(vs / "mix_conv0"), cvh, cvh, &VALUE_MIX_CONV_KERNELS),
                batch_norm2d(vs / "mix_bn1", cvh),
            )
        });

        ValueHead {
            conv0: conv2d(vs / "conv0", config.channels, cvh, config.value_kernel_size),
            bn0: batch_norm2d(vs / "bn0", cvh),
            mix,
            pool_concat: config.value_head_use_se,
            fc0: nn::linear(vs / "fc0", fc_in, config.value_fc_size, Default::default()),
            fc1: nn::linear(vs / "fc1", config.value_fc_size, 1, Default::default()),
            act: config.act_type,
        }
    }

    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let mut out = x.apply(&self.conv0).apply_t(&self.bn0, train);
        out = self.act.apply(&out);

        if let Some((mix_conv, bn)) = &self.mix {
            out = mix_conv.forward(&out).apply_t(bn, train);
            out = self.act.apply(&out);
        }

        let mut flat = out.flatten(1, -1);
        if self.pool_concat {
            flat = Tensor::cat(&[flat, global_avg_pool(x)], 1);
        }

        let hidden = self.act.apply(&flat.apply(&self.fc0));
        hidden.apply(&self.fc1).tanh()
    }
}
