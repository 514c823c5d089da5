use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::neural::activation::Activation;
use crate::neural::constants::*;
use crate::neural::error::{NetError, Result};

/// One residual block of the tower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub kernels: Vec<i64>,
    #[serde(default)]
    pub use_se: bool,
}

impl BlockConfig {
    pub fn new(kernels: &[i64], use_se: bool) -> Self {
        BlockConfig { kernels: kernels.to_vec(), use_se }
    }
}

/// The default tower: 13 blocks, kernel mix widening with depth and
/// squeeze-excitation on block 4 and on the last four blocks.
pub fn default_blocks() -> Vec<BlockConfig> {
    const KERNELS: [&[i64]; 13] = [
        &[3],          // 0
        &[3],          // 1
        &[3, 5],       // 2
        &[3, 5],       // 3
        &[3, 5, 7, 9], // 4
        &[3, 5],       // 5
        &[3, 5],       // 6
        &[3, 5],       // 7
        &[3, 5],       // 8
        &[3, 5],       // 9
        &[3, 5],       // 10
        &[3, 5, 7, 9], // 11
        &[3, 5, 7, 9], // 12
    ];

    KERNELS
        .iter()
        .enumerate()
        .map(|(idx, kernels)| BlockConfig::new(kernels, idx == 4 || idx >= 9))
        .collect()
}

/// Hyperparameters of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiseConfig {
    pub input_channels: i64,
    pub board_height: i64,
    pub board_width: i64,

    /// Main number of channels between the residual blocks
    pub channels: i64,
    /// Operating channels of the first block's mixed convolution
    pub channels_operating_init: i64,
    /// Operating channels added after each residual block
    pub channel_expansion: i64,
    pub act_type: Activation,
    pub se_ratio: i64,
    /// Zero disables dropout
    pub dropout_rate: f64,
    pub blocks: Vec<BlockConfig>,

    pub channels_value_head: i64,
    pub value_kernel_size: i64,
    pub value_fc_size: i64,
    pub value_head_use_se: bool,
    pub value_head_mix_conv: bool,

    pub channels_policy_head: i64,
    pub select_policy_from_plane: bool,
    pub policy_head_use_se: bool,
    /// Only used by the fully connected policy head
    pub n_labels: i64,

    pub grad_scale_value: f64,
    pub grad_scale_policy: f64,
}

impl Default for RiseConfig {
    fn default() -> Self {
        RiseConfig {
            input_channels: NUM_INPUT_PLANES,
            board_height: BOARD_HEIGHT,
            board_width: BOARD_WIDTH,
            channels: DEFAULT_CHANNELS,
            channels_operating_init: DEFAULT_CHANNELS_OPERATING_INIT,
            channel_expansion: DEFAULT_CHANNEL_EXPANSION,
            act_type: Activation::Relu,
            se_ratio: DEFAULT_SE_RATIO,
            dropout_rate: DEFAULT_DROPOUT_RATE,
            blocks: default_blocks(),
            channels_value_head: DEFAULT_CHANNELS_VALUE_HEAD,
            value_kernel_size: DEFAULT_VALUE_KERNEL_SIZE,
            value_fc_size: DEFAULT_VALUE_FC_SIZE,
            value_head_use_se: true,
            value_head_mix_conv: true,
            channels_policy_head: NUM_POLICY_PLANES,
            select_policy_from_plane: true,
            policy_head_use_se: false,
            n_labels: NUM_FLAT_POLICY_LABELS,
            grad_scale_value: DEFAULT_GRAD_SCALE_VALUE,
            grad_scale_policy: DEFAULT_GRAD_SCALE_POLICY,
        }
    }
}

impl RiseConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RiseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Keeps the first `res_blocks` blocks of the schedule.
    pub fn with_res_blocks(mut self, res_blocks: usize) -> Result<Self> {
        if res_blocks > self.blocks.len() {
            return Err(NetError::invalid_config(format!(
                "{} residual blocks requested but the kernel schedule only has {}",
                res_blocks,
                self.blocks.len()
            )));
        }
        self.blocks.truncate(res_blocks);
        Ok(self)
    }

    pub fn res_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_name(idx: usize) -> String {
        format!("dconv_{}", idx)
    }

    /// Operating channels of residual block `idx`.
    pub fn channels_operating(&self, idx: usize) -> i64 {
        self.channels_operating_init + idx as i64 * self.channel_expansion
    }

    /// Number of logits the policy head produces.
    pub fn num_policy_outputs(&self) -> i64 {
        if self.select_policy_from_plane {
            self.channels_policy_head * self.board_height * self.board_width
        } else {
            self.n_labels
        }
    }

    pub fn input_shape(&self, batch_size: i64) -> [i64; 4] {
        [batch_size, self.input_channels, self.board_height, self.board_width]
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("input_channels", self.input_channels),
            ("board_height", self.board_height),
            ("board_width", self.board_width),
            ("channels", self.channels),
            ("channels_operating_init", self.channels_operating_init),
            ("channels_value_head", self.channels_value_head),
            ("value_kernel_size", self.value_kernel_size),
            ("value_fc_size", self.value_fc_size),
            ("channels_policy_head", self.channels_policy_head),
            ("n_labels", self.n_labels),
            ("se_ratio", self.se_ratio),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(NetError::invalid_config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.channel_expansion < 0 {
            return Err(NetError::invalid_config("channel_expansion must not be negative"));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(NetError::invalid_config(format!(
                "dropout_rate must be in [0, 1), got {}",
                self.dropout_rate
            )));
        }
        for (name, scale) in [("grad_scale_value", self.grad_scale_value), ("grad_scale_policy", self.grad_scale_policy)] {
            if !scale.is_finite() || scale < 0.0 {
                return Err(NetError::invalid_config(format!(
                    "{} must be finite and not negative, got {}",
                    name, scale
                )));
            }
        }
        if self.blocks.is_empty() {
            return Err(NetError::invalid_config("the tower needs at least one residual block"));
        }
        if self.value_kernel_size % 2 == 0 {
            return Err(NetError::EvenKernel {
                block: "value_conv0".to_string(),
                kernel: self.value_kernel_size,
            });
        }

        for (idx, block) in self.blocks.iter().enumerate() {
            let name = Self::block_name(idx);
            check_kernels(&name, &block.kernels)?;
            check_divisible(&name, self.channels_operating(idx), block.kernels.len())?;
            if block.use_se {
                check_se_ratio(&name, self.channels, self.se_ratio)?;
            }
        }

        if self.value_head_mix_conv {
            check_divisible("value_mix_conv0", self.channels_value_head, VALUE_MIX_CONV_KERNELS.len())?;
        }
        if self.policy_head_use_se {
            let channels = if self.select_policy_from_plane { self.channels } else { self.channels_policy_head };
            check_se_ratio("policy_se", channels, self.se_ratio)?;
        }

        Ok(())
    }
}

fn check_kernels(block: &str, kernels: &[i64]) -> Result<()> {
    if kernels.is_empty() {
        return Err(NetError::EmptyKernelList { block: block.to_string() });
    }
    match kernels.iter().find(|&&k| k <= 0 || k % 2 == 0) {
        Some(&kernel) => Err(NetError::EvenKernel { block: block.to_string(), kernel }),
        None => Ok(()),
    }
}

fn check_divisible(block: &str, channels: i64, splits: usize) -> Result<()> {
    if channels % splits as i64 != 0 {
        return Err(NetError::IndivisibleChannels {
            block: block.to_string(),
            channels,
            splits,
        });
    }
    Ok(())
}

fn check_se_ratio(block: &str, channels: i64, ratio: i64) -> Result<()> {
    if channels / ratio == 0 {
        return Err(NetError::invalid_config(format!(
            "{}: squeeze-excitation ratio {} leaves no hidden units for {} channels",
            block, ratio, channels
        )));
    }
    Ok(())
}
