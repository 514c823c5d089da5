use std::fmt;
use crate::neural::config::RiseConfig;
use crate::neural::rise_net::RiseNet;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    pub name: String,
    pub kernels: Vec<i64>,
    pub channels_operating: i64,
    pub use_se: bool,
    pub num_parameters: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetSummary {
    pub stem_parameters: usize,
    pub blocks: Vec<BlockSummary>,
    pub value_head_parameters: usize,
    pub policy_head_parameters: usize,
    pub total_parameters: usize,
    pub num_policy_outputs: i64,
}

impl NetSummary {
    pub fn new(net: &RiseNet) -> Self {
        let trainable: Vec<(String, usize)> = net
            .vs
            .variables()
            .into_iter()
            .filter(|(_, tensor)| tensor.requires_grad())
            .map(|(name, tensor)| (name, tensor.numel()))
            .collect();

        // Variable names are dot separated, so the trailing dot keeps dconv_1 apart from dconv_10
        let count = |prefix: &str| -> usize {
            let prefix = format!("{}.", prefix);
            trainable
                .iter()
                .filter(|(name, _)| name.starts_with(&prefix))
                .map(|(_, numel)| numel)
                .sum()
        };

        let blocks = net
            .config
            .blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| {
                let name = RiseConfig::block_name(idx);
                BlockSummary {
                    num_parameters: count(&name),
                    name,
                    kernels: block.kernels.clone(),
                    channels_operating: net.config.channels_operating(idx),
                    use_se: block.use_se,
                }
            })
            .collect();

        NetSummary {
            stem_parameters: count("stem_conv0") + count("stem_bn0") + count("stem_bn1"),
            blocks,
            value_head_parameters: count("value"),
            policy_head_parameters: count("policy"),
            total_parameters: trainable.iter().map(|(_, numel)| numel).sum(),
            num_policy_outputs: net.config.num_policy_outputs(),
        }
    }
}

impl fmt::Display for NetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:<14} {:>10} {:>4} {:>12}", "block", "kernels", "operating", "se", "parameters")?;
        writeln!(f, "{:<10} {:<14} {:>10} {:>4} {:>12}", "stem", "", "", "", self.stem_parameters)?;
        for block in &self.blocks {
            let kernels = block.kernels.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(",");
            writeln!(
                f,
                "{:<10} {:<14} {:>10} {:>4} {:>12}",
                block.name,
                kernels,
                block.channels_operating,
                if block.use_se { "yes" } else { "no" },
                block.num_parameters
            )?;
        }
        writeln!(f, "{:<10} {:<14} {:>10} {:>4} {:>12}", "value", "", "", "", self.value_head_parameters)?;
        writeln!(f, "{:<10} {:<14} {:>10} {:>4} {:>12}", "policy", "", "", "", self.policy_head_parameters)?;
        writeln!(f, "policy outputs: {}", self.num_policy_outputs)?;
        write!(f, "total parameters: {}", self.total_parameters)
    }
}
