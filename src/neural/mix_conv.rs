use tch::{nn, Tensor};
use crate::neural::utils::conv2d;

/// Mixed depthwise convolution.
///
/// The input planes are split into one equal group per kernel size, each group
/// is convolved with its own kernel and the results are concatenated again.
/// With a single kernel this is a plain same-padded convolution.
#[derive(Debug)]
pub struct MixConv {
    convs: Vec<nn::Conv2D>,
    kernels: Vec<i64>,
}

impl MixConv {
    pub fn new(vs: &nn::Path, in_channels: i64, channels: i64, kernels: &[i64]) -> Self {
        let num_splits = kernels.len() as i64;

        let convs = kernels
            .iter()
            .map(|&kernel| {
                conv2d(
                    vs / format!("conv_k{}", kernel),
                    in_channels / num_splits,
                    channels / num_splits,
                    kernel,
                )
            })
            .collect();

        MixConv {
            convs,
            kernels: kernels.to_vec(),
        }
    }

    pub fn kernels(&self) -> &[i64] {
        &self.kernels
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        if let [conv] = self.convs.as_slice() {
            return x.apply(conv);
        }

        let groups = x.chunk(self.convs.len() as i64, 1);
        let outputs: Vec<Tensor> = groups
            .iter()
            .zip(&self.convs)
            .map(|(group, conv)| group.apply(conv))
            .collect();

        Tensor::cat(&outputs, 1)
    }
}
