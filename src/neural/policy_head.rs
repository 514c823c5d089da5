use tch::{nn, Tensor};
use crate::neural::activation::Activation;
use crate::neural::config::RiseConfig;
use crate::neural::constants::POLICY_KERNEL_SIZE;
use crate::neural::se_layer::SELayer;
use crate::neural::utils::{batch_norm2d, conv2d};

/// Outputs policy logits for a given position.
#[derive(Debug)]
pub enum PolicyHead {
    /// Move probabilities laid out as planes over the board, flattened.
    PolicyMap {
        conv0: nn::Conv2D,
        bn0: nn::BatchNorm,
        se: Option<SELayer>,
        conv1: nn::Conv2D,
        act: Activation,
    },
    /// Flattened features mapped to the move labels by a dense layer.
    FullyConnected {
        conv0: nn::Conv2D,
        bn0: nn::BatchNorm,
        se: Option<SELayer>,
        fc: nn::Linear,
        act: Activation,
    },
}

impl PolicyHead {
    pub fn new(vs: &nn::Path, config: &RiseConfig) -> Self {
        let act = config.act_type;
        let se_ratio = config.policy_head_use_se.then_some(config.se_ratio);

        if config.select_policy_from_plane {
            let channels = config.channels;
            PolicyHead::PolicyMap {
                conv0: conv2d(vs / "conv0", channels, channels, POLICY_KERNEL_SIZE),
                bn0: batch_norm2d(vs / "bn0", channels),
                se: se_ratio.map(|ratio| SELayer::new(&(vs / "se"), channels, ratio, act, true)),
                conv1: conv2d(vs / "conv1", channels, config.channels_policy_head, POLICY_KERNEL_SIZE),
                act,
            }
        } else {
            let cph = config.channels_policy_head;
            let fc_in = cph * config.board_height * config.board_width;
            PolicyHead::FullyConnected {
                conv0: conv2d(vs / "conv0", config.channels, cph, POLICY_KERNEL_SIZE),
                bn0: batch_norm2d(vs / "bn0", cph),
                se: se_ratio.map(|ratio| SELayer::new(&(vs / "se"), cph, ratio, act, true)),
                fc: nn::linear(vs / "fc_out", fc_in, config.n_labels, Default::default()),
                act,
            }
        }
    }

    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        match self {
            PolicyHead::PolicyMap { conv0, bn0, se, conv1, act } => {
                let mut out = act.apply(&x.apply(conv0).apply_t(bn0, train));
                if let Some(se) = se {
                    out = se.forward(&out);
                }
                out.apply(conv1).flatten(1, -1)
            }
            PolicyHead::FullyConnected { conv0, bn0, se, fc, act } => {
                let mut out = act.apply(&x.apply(conv0).apply_t(bn0, train));
                if let Some(se) = se {
                    out = se.forward(&out);
                }
                out.flatten(1, -1).apply(fc)
            }
        }
    }
}
