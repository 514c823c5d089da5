use tch::{nn, Tensor};
use crate::neural::activation::{hard_sigmoid, Activation};
use crate::neural::utils::global_avg_pool;

/// Channel squeeze-excitation: rescales every feature plane by a learned gate.
#[derive(Debug)]
pub struct SELayer {
    fc1: nn::Linear,
    fc2: nn::Linear,
    act: Activation,
    use_hard_sigmoid: bool,
}

impl SELayer {
    pub fn new(vs: &nn::Path, channels: i64, ratio: i64, act: Activation, use_hard_sigmoid: bool) -> Self {
        let se_channels = channels / ratio;
        SELayer {
            fc1: nn::linear(vs / "fc0", channels, se_channels, Default::default()),
            fc2: nn::linear(vs / "fc1", se_channels, channels, Default::default()),
            act,
            use_hard_sigmoid,
        }
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        let channels = x.size()[1];

        let se = global_avg_pool(x).apply(&self.fc1);
        let se = self.act.apply(&se).apply(&self.fc2);

        let gate = if self.use_hard_sigmoid { hard_sigmoid(&se) } else { se.sigmoid() };
        x * gate.view([-1, channels, 1, 1])
    }
}
