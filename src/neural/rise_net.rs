use std::fs;
use std::path::Path;
use tch::{nn, Device, Kind, Tensor};
use tch::nn::ModuleT;
use tracing::{debug, info};
use crate::neural::activation::Activation;
use crate::neural::combined_policy_value_network::CombinedPolicyValueNetwork;
use crate::neural::config::RiseConfig;
use crate::neural::error::{NetError, Result};
use crate::neural::policy_head::PolicyHead;
use crate::neural::residual_block::ResidualBlock;
use crate::neural::stem::Stem;
use crate::neural::training_utils::log_tensor_stats;
use crate::neural::utils::batch_norm2d;
use crate::neural::value_head::ValueHead;

pub const CONFIG_FILE: &str = "config.toml";
pub const WEIGHTS_FILE: &str = "weights.safetensors";
// Residual blocks and their SE gates always use relu, `act_type` only
// reaches the stem, the tower output and the heads
pub const BLOCK_ACTIVATION: Activation = Activation::Relu;

/// Inference output of the network.
#[derive(Debug)]
pub struct NetOutput {
    /// `[N, 1]`, in `[-1, 1]`
    pub value: Tensor,
    /// `[N, num_policy_outputs]`, rows sum to one
    pub policy: Tensor,
}

/// RISE v3: convolution stem, a tower of pre-activation mixed convolution
/// blocks with growing operating width, and separate value and policy heads.
#[derive(Debug)]
pub struct RiseNet {
    pub vs: nn::VarStore,
    pub config: RiseConfig,
    stem: Stem,
    blocks: Vec<ResidualBlock>,
    bn1: nn::BatchNorm,
    value_head: ValueHead,
    policy_head: PolicyHead,
}

impl RiseNet {
    pub fn new(device: Device, config: RiseConfig) -> Result<RiseNet> {
        config.validate()?;

        let vs = nn::VarStore::new(device);
        let root = &vs.root();
        let act = config.act_type;

        let stem = Stem::new(root, config.input_channels, config.channels, act);

        let mut blocks = Vec::with_capacity(config.res_blocks());
        for (idx, block) in config.blocks.iter().enumerate() {
            let name = RiseConfig::block_name(idx);
            let channels_operating = config.channels_operating(idx);
            debug!(
                block = %name,
                channels_operating,
                kernels = ?block.kernels,
                use_se = block.use_se,
                "building residual block"
            );
            blocks.push(ResidualBlock::new(
                &(root / name.as_str()),
                config.channels,
                channels_operating,
                &block.kernels,
                BLOCK_ACTIVATION,
                block.use_se.then_some(config.se_ratio),
            ));
        }

        let bn1 = batch_norm2d(root / "stem_bn1", config.channels);
        let value_head = ValueHead::new(&(root / "value"), &config);
        let policy_head = PolicyHead::new(&(root / "policy"), &config);

        let net = RiseNet {
            vs,
            config,
            stem,
            blocks,
            bn1,
            value_head,
            policy_head,
        };
        info!(
            res_blocks = net.blocks.len(),
            channels = net.config.channels,
            parameters = net.num_parameters(),
            ?device,
            "built RISE net"
        );
        Ok(net)
    }

    /// Rebuilds a net from a directory written by [`RiseNet::save_checkpoint`].
    pub fn load_checkpoint(dir: impl AsRef<Path>, device: Device) -> Result<RiseNet> {
        let dir = dir.as_ref();
        let config = RiseConfig::from_file(dir.join(CONFIG_FILE))?;
        let mut net = RiseNet::new(device, config)?;
        net.load(dir.join(WEIGHTS_FILE))?;
        Ok(net)
    }

    pub fn save_checkpoint(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        self.config.save(dir.join(CONFIG_FILE))?;
        self.save(dir.join(WEIGHTS_FILE))
    }

    /// Save model weights, the format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.vs.save(path.as_ref())?;
        info!(path = %path.as_ref().display(), "saved weights");
        Ok(())
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.vs.load(path.as_ref())?;
        info!(path = %path.as_ref().display(), "loaded weights");
        Ok(())
    }

    pub fn num_parameters(&self) -> usize {
        self.vs.trainable_variables().iter().map(Tensor::numel).sum()
    }

    pub fn blocks(&self) -> &[ResidualBlock] {
        &self.blocks
    }

    pub fn check_input(&self, input: &Tensor) -> Result<()> {
        let actual = input.size();
        let expected = self.config.input_shape(actual.first().copied().unwrap_or(0));
        if actual.len() != 4 || actual[1..] != expected[1..] || actual[0] <= 0 {
            return Err(NetError::ShapeMismatch {
                expected: expected.to_vec(),
                actual,
            });
        }
        Ok(())
    }

    /// Evaluation mode forward pass without gradient tracking.
    pub fn predict(&self, input: &Tensor) -> Result<NetOutput> {
        self.check_input(input)?;
        let (policy_logits, value) = tch::no_grad(|| self.forward_t(input, false));
        Ok(NetOutput {
            value,
            policy: policy_logits.softmax(-1, Kind::Float),
        })
    }

    /// The shared tower output both heads read from.
    pub fn body_t(&self, x: &Tensor, train: bool) -> Tensor {
        let mut x = self.stem.forward_t(x, train);

        for block in &self.blocks {
            x = block.forward_t(&x, train);
        }

        x = self.config.act_type.apply(&self.bn1.forward_t(&x, train));
        if self.config.dropout_rate != 0.0 {
            x = x.dropout(self.config.dropout_rate, train);
        }
        x
    }
}

impl CombinedPolicyValueNetwork for RiseNet {
    fn forward_t(&self, input: &Tensor, train: bool) -> (Tensor, Tensor) {
        assert_eq!(input.size().len(), 4);
        assert_eq!(input.size()[1..4], self.config.input_shape(-1)[1..4]);
        assert!(input.size()[0] > 0);

        let x = self.body_t(&input.to_kind(Kind::Float), train);
        log_tensor_stats(&x, "tower output");

        let policy = self.policy_head.forward_t(&x, train);
        let value = self.value_head.forward_t(&x, train);

        (policy, value)
    }
}

#[cfg(test)]
mod tests {
    use tch::nn::OptimizerConfig;
    use crate::neural::config::tests::small_config;
    use crate::neural::config::BlockConfig;
    use crate::neural::training::{train_step, Batch};
    use crate::neural::training_utils::synthetic_batch;
    use super::*;

    fn random_input(config: &RiseConfig, batch_size: i64) -> Tensor {
        Tensor::rand(config.input_shape(batch_size), (Kind::Float, Device::Cpu))
    }

    #[test]
    fn test_forward_shapes() {
        let config = small_config();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();

        let (policy, value) = net.forward_t(&random_input(&config, 4), true);
        assert_eq!(policy.size(), [4, config.num_policy_outputs()]);
        assert_eq!(value.size(), [4, 1]);
    }

    #[test]
    fn test_predict_outputs_distribution() {
        let config = small_config();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();

        let output = net.predict(&random_input(&config, 3)).unwrap();
        let row_sums = output.policy.sum_dim_intlist(&[-1][..], false, Kind::Float);
        assert!(row_sums.allclose(&Tensor::ones([3], (Kind::Float, Device::Cpu)), 1e-4, 1e-5, false));
        assert!(output.value.abs().max().double_value(&[]) <= 1.0);
        assert!(!output.policy.requires_grad());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let config = small_config();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        let input = random_input(&config, 2);

        let a = net.predict(&input).unwrap();
        let b = net.predict(&input).unwrap();
        assert!(a.policy.allclose(&b.policy, 1e-6, 1e-7, false));
        assert!(a.value.allclose(&b.value, 1e-6, 1e-7, false));
    }

    #[test]
    fn test_predict_rejects_wrong_shape() {
        let config = small_config();
        let net = RiseNet::new(Device::Cpu, config).unwrap();

        let input = Tensor::zeros([2, 17, 8, 8], (Kind::Float, Device::Cpu));
        let err = net.predict(&input).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { .. }));

        let input = Tensor::zeros([34, 8, 8], (Kind::Float, Device::Cpu));
        assert!(net.predict(&input).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config();
        config.blocks.push(BlockConfig::new(&[2], false));
        assert!(RiseNet::new(Device::Cpu, config).is_err());
    }

    #[test]
    fn test_named_blocks() {
        let net = RiseNet::new(Device::Cpu, small_config()).unwrap();
        let variables = net.vs.variables();

        for idx in 0..13 {
            let name = format!("dconv_{}.conv1.weight", idx);
            assert!(variables.contains_key(&name), "missing {}", name);
        }
        assert!(variables.contains_key("stem_conv0.weight"));
        assert!(variables.contains_key("stem_bn0.running_mean"));
        assert!(variables.contains_key("stem_bn1.running_var"));
        assert!(!variables.keys().any(|name| name.starts_with("stem.")));
        assert!(variables.contains_key("value.mix_conv0.conv_k7.weight"));
        assert!(variables.contains_key("policy.conv1.weight"));

        let se_blocks: Vec<usize> = net.blocks().iter().enumerate().filter(|(_, b)| b.has_se()).map(|(i, _)| i).collect();
        assert_eq!(se_blocks, vec![4, 9, 10, 11, 12]);
    }

    #[test]
    fn test_operating_channels_grow() {
        let config = small_config();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        let variables = net.vs.variables();

        for idx in 0..config.res_blocks() {
            let conv1 = &variables[&format!("dconv_{}.conv1.weight", idx)];
            assert_eq!(conv1.size(), [config.channels_operating(idx), config.channels, 1, 1]);
        }
    }

    #[test]
    fn test_dropout_only_in_training() {
        let mut config = small_config();
        config.dropout_rate = 0.5;
        let mut net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        let input = random_input(&config, 2);

        let eval_a = tch::no_grad(|| net.body_t(&input, false));
        let eval_b = tch::no_grad(|| net.body_t(&input, false));
        assert!(eval_a.allclose(&eval_b, 1e-6, 1e-7, false));

        let train_a = tch::no_grad(|| net.body_t(&input, true));
        let train_b = tch::no_grad(|| net.body_t(&input, true));
        assert!(!train_a.allclose(&train_b, 1e-6, 1e-7, false));

        // Without dropout the same training pass is the reference, dropped
        // activations are zero and kept ones are scaled by 1 / (1 - rate)
        net.config.dropout_rate = 0.0;
        let kept = tch::no_grad(|| net.body_t(&input, true));
        let zeros = |x: &Tensor| x.eq(0.0).sum(Kind::Int64).int64_value(&[]);
        assert!(zeros(&train_a) > zeros(&kept));

        let mask = train_a.ne(0.0);
        let scaled = (&kept * 2.0).masked_select(&mask);
        assert!(train_a.masked_select(&mask).allclose(&scaled, 1e-4, 1e-5, false));
    }

    #[test]
    fn test_zero_dropout_rate_is_deterministic_in_training() {
        let mut config = small_config();
        config.dropout_rate = 0.0;
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        let input = random_input(&config, 2);

        let train_a = tch::no_grad(|| net.body_t(&input, true));
        let train_b = tch::no_grad(|| net.body_t(&input, true));
        assert!(train_a.allclose(&train_b, 1e-5, 1e-6, false));
    }

    #[test]
    fn test_blocks_keep_relu_for_other_activations() {
        let mut config = small_config().with_res_blocks(5).unwrap();
        config.act_type = Activation::Tanh;
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();

        assert!(net.blocks().iter().all(|block| block.activation() == Activation::Relu));
        assert!(net.blocks()[4].has_se());

        // tanh after the tower output bounds the shared features
        let x = tch::no_grad(|| net.body_t(&random_input(&config, 2), false));
        assert!(x.abs().max().double_value(&[]) <= 1.0);
    }

    #[test]
    fn test_fully_connected_policy_variant() {
        let mut config = small_config().with_res_blocks(3).unwrap();
        config.select_policy_from_plane = false;
        config.n_labels = 2272;
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();

        let (policy, _) = net.forward_t(&random_input(&config, 2), false);
        assert_eq!(policy.size(), [2, 2272]);
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config().with_res_blocks(4).unwrap();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        net.save_checkpoint(dir.path()).unwrap();

        let restored = RiseNet::load_checkpoint(dir.path(), Device::Cpu).unwrap();
        assert_eq!(restored.config, config);

        let restored_variables = restored.vs.variables();
        for (name, tensor) in net.vs.variables() {
            let tensor2 = &restored_variables[&name];
            assert!(tensor.allclose(tensor2, 0.0, 0.0, false), "{} differs", name);
        }
    }

    #[test]
    fn test_training_step_moves_weights() {
        let config = small_config().with_res_blocks(2).unwrap();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        let mut optimizer = nn::Adam::default().build(&net.vs, 1e-3).unwrap();
        let mut rng = rand::thread_rng();
        let batch: Batch = synthetic_batch(&config, 4, Device::Cpu, &mut rng).unwrap();

        let before = net.vs.variables()["stem_conv0.weight"].copy();
        let metrics = train_step(&net, &mut optimizer, &batch);
        let variables = net.vs.variables();
        let after = &variables["stem_conv0.weight"];

        assert!(metrics.total_loss.is_finite());
        assert!(!before.allclose(after, 0.0, 0.0, false));
    }
}
