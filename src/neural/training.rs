use tch::{nn, Kind, Reduction, Tensor};
use tracing::debug;
use crate::neural::combined_policy_value_network::CombinedPolicyValueNetwork;
use crate::neural::config::RiseConfig;
use crate::neural::rise_net::RiseNet;

/// Re-weighting of the gradient flowing back from each output layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradScales {
    pub value: f64,
    pub policy: f64,
}

impl From<&RiseConfig> for GradScales {
    fn from(config: &RiseConfig) -> Self {
        GradScales {
            value: config.grad_scale_value,
            policy: config.grad_scale_policy,
        }
    }
}

#[derive(Debug)]
pub enum PolicyTarget {
    /// Index of the played move per example, `[N]` int64
    Labels(Tensor),
    /// Full target distribution per example, `[N, num_policy_outputs]`
    Distribution(Tensor),
}

#[derive(Debug)]
pub struct Batch {
    pub inputs: Tensor,
    pub policy: PolicyTarget,
    /// Game results from the side to move, `[N]` or `[N, 1]`
    pub values: Tensor,
}

#[derive(Debug, Clone, Copy)]
pub struct LossMetrics {
    pub policy_loss: f64,
    pub value_loss: f64,
    pub total_loss: f64,
}

/// Linear regression output: `0.5 * mean((value - target)^2)`.
pub fn value_loss(value: &Tensor, target: &Tensor) -> Tensor {
    value.mse_loss(&target.view([-1, 1]).to_kind(value.kind()), Reduction::Mean) * 0.5
}

/// Softmax output: mean cross entropy between the logits and the target.
pub fn policy_loss(policy_logits: &Tensor, target: &PolicyTarget) -> Tensor {
    match target {
        PolicyTarget::Labels(labels) => policy_logits.cross_entropy_for_logits(labels),
        PolicyTarget::Distribution(distribution) => {
            let log_probs = policy_logits.log_softmax(-1, Kind::Float);
            -(distribution * log_probs)
                .sum_dim_intlist(&[-1][..], false, Kind::Float)
                .mean(Kind::Float)
        }
    }
}

/// Combines both output layers. Scaling the loss terms scales the gradient
/// each head sends back into the shared tower.
pub fn multi_task_loss(
    policy_logits: &Tensor,
    value: &Tensor,
    batch: &Batch,
    scales: GradScales,
) -> (Tensor, LossMetrics) {
    let policy_loss = policy_loss(policy_logits, &batch.policy);
    let value_loss = value_loss(value, &batch.values);

    assert_eq!(policy_loss.size(), [] as [i64; 0]);
    assert_eq!(value_loss.size(), [] as [i64; 0]);

    let total_loss = &policy_loss * scales.policy + &value_loss * scales.value;

    let metrics = LossMetrics {
        policy_loss: policy_loss.double_value(&[]),
        value_loss: value_loss.double_value(&[]),
        total_loss: total_loss.double_value(&[]),
    };
    (total_loss, metrics)
}

/// Helper function to calculate losses and optionally update the model
pub fn run_model(
    model: &dyn CombinedPolicyValueNetwork,
    optimizer: Option<&mut nn::Optimizer>,
    batch: &Batch,
    scales: GradScales,
) -> LossMetrics {
    let is_training = optimizer.is_some();

    let (policy_logits, value) = model.forward_t(&batch.inputs, is_training);
    let (total_loss, metrics) = multi_task_loss(&policy_logits, &value, batch, scales);

    if let Some(opt) = optimizer {
        opt.zero_grad();
        total_loss.backward();
        opt.step();
    }

    debug!(
        policy_loss = metrics.policy_loss,
        value_loss = metrics.value_loss,
        total_loss = metrics.total_loss,
        is_training,
        "ran batch"
    );
    metrics
}

/// Compute the losses for a batch without updating the model
pub fn compute_loss(net: &RiseNet, batch: &Batch) -> LossMetrics {
    tch::no_grad(|| run_model(net, None, batch, GradScales::from(&net.config)))
}

/// A single optimizer step on one batch
pub fn train_step(net: &RiseNet, optimizer: &mut nn::Optimizer, batch: &Batch) -> LossMetrics {
    run_model(net, Some(optimizer), batch, GradScales::from(&net.config))
}

#[cfg(test)]
mod tests {
    use tch::Device;
    use crate::neural::config::tests::small_config;
    use crate::neural::training_utils::synthetic_batch;
    use super::*;

    fn batch_with_values(values: &[f32], policy: PolicyTarget) -> Batch {
        Batch {
            inputs: Tensor::zeros([values.len() as i64, 34, 8, 8], (Kind::Float, Device::Cpu)),
            policy,
            values: Tensor::from_slice(values),
        }
    }

    #[test]
    fn test_value_loss_is_half_mse() {
        let value = Tensor::from_slice(&[0.0f32, 0.5]).view([2, 1]);
        let target = Tensor::from_slice(&[1.0f32, 0.5]);
        let loss = value_loss(&value, &target).double_value(&[]);
        assert!((loss - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_logits_give_log_k() {
        let logits = Tensor::zeros([3, 10], (Kind::Float, Device::Cpu));
        let labels = Tensor::from_slice(&[0i64, 4, 9]);
        let loss = policy_loss(&logits, &PolicyTarget::Labels(labels)).double_value(&[]);
        assert!((loss - 10f64.ln()).abs() < 1e-5);

        let distribution = Tensor::full([3, 10], 0.1, (Kind::Float, Device::Cpu));
        let loss = policy_loss(&logits, &PolicyTarget::Distribution(distribution)).double_value(&[]);
        assert!((loss - 10f64.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_one_hot_distribution_matches_labels() {
        let logits = Tensor::randn([4, 6], (Kind::Float, Device::Cpu));
        let labels = Tensor::from_slice(&[1i64, 0, 5, 2]);
        let one_hot = labels.one_hot(6).to_kind(Kind::Float);

        let a = policy_loss(&logits, &PolicyTarget::Labels(labels)).double_value(&[]);
        let b = policy_loss(&logits, &PolicyTarget::Distribution(one_hot)).double_value(&[]);
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn test_grad_scale_reweights_value_gradient() {
        let value = Tensor::zeros([2, 1], (Kind::Float, Device::Cpu)).set_requires_grad(true);
        let logits = Tensor::zeros([2, 4], (Kind::Float, Device::Cpu)).set_requires_grad(true);
        let batch = batch_with_values(&[1.0, 1.0], PolicyTarget::Labels(Tensor::from_slice(&[0i64, 1])));

        let scales = GradScales { value: 0.01, policy: 1.0 };
        let (loss, metrics) = multi_task_loss(&logits, &value, &batch, scales);
        loss.backward();

        // d/dv 0.01 * 0.5 * mean((v - 1)^2) = 0.01 * (v - 1) / N
        let grad = Vec::<f32>::try_from(value.grad().view([-1])).unwrap();
        for g in grad {
            assert!((g + 0.005).abs() < 1e-7);
        }
        assert!((metrics.value_loss - 0.5).abs() < 1e-6);
        assert!((metrics.total_loss - (metrics.policy_loss + 0.005)).abs() < 1e-5);
    }

    #[test]
    fn test_compute_loss_does_not_train() {
        let config = small_config().with_res_blocks(2).unwrap();
        let net = RiseNet::new(Device::Cpu, config.clone()).unwrap();
        let mut rng = rand::thread_rng();
        let batch = synthetic_batch(&config, 3, Device::Cpu, &mut rng).unwrap();

        let a = compute_loss(&net, &batch);
        let b = compute_loss(&net, &batch);
        assert!(a.total_loss.is_finite());
        assert_eq!(a.total_loss, b.total_loss);
    }
}
