use lazy_static::lazy_static;
use tch::{nn, Device, Kind, Tensor};
use crate::neural::constants::{BN_EPSILON, BN_MOMENTUM};

lazy_static! {
    pub static ref DEVICE: Device = Device::cuda_if_available();
}

/// Convolution without bias that keeps the board size for odd kernels.
pub fn same_conv_config(kernel: i64) -> nn::ConvConfig {
    nn::ConvConfig {
        padding: kernel / 2,
        bias: false,
        ..Default::default()
    }
}

pub fn conv2d(vs: nn::Path, in_channels: i64, out_channels: i64, kernel: i64) -> nn::Conv2D {
    nn::conv2d(vs, in_channels, out_channels, kernel, same_conv_config(kernel))
}

pub fn batch_norm2d(vs: nn::Path, channels: i64) -> nn::BatchNorm {
    let config = nn::BatchNormConfig {
        eps: BN_EPSILON,
        momentum: BN_MOMENTUM,
        ..Default::default()
    };
    nn::batch_norm2d(vs, channels, config)
}

/// Average over the spatial dimensions, `[N, C, H, W] -> [N, C]`.
pub fn global_avg_pool(x: &Tensor) -> Tensor {
    x.mean_dim(&[-2, -1][..], false, Kind::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_conv_keeps_board_size() {
        let vs = nn::VarStore::new(Device::Cpu);
        for kernel in [1, 3, 5, 7, 9] {
            let conv = conv2d(&vs.root() / format!("k{}", kernel), 4, 6, kernel);
            let x = Tensor::randn([2, 4, 8, 8], (Kind::Float, Device::Cpu));
            assert_eq!(x.apply(&conv).size(), [2, 6, 8, 8]);
            assert!(conv.bs.is_none());
        }
    }

    #[test]
    fn test_global_avg_pool() {
        let x = Tensor::ones([3, 5, 8, 8], (Kind::Float, Device::Cpu));
        let pooled = global_avg_pool(&x);
        assert_eq!(pooled.size(), [3, 5]);
        assert_eq!(pooled.sum(Kind::Float).double_value(&[]), 15.0);
    }
}
