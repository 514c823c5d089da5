use rand::Rng;
use rand_distr::{Dirichlet, Distribution};
use tch::{Device, Kind, Tensor};
use tracing::{enabled, trace, Level};
use crate::neural::config::RiseConfig;
use crate::neural::error::{NetError, Result};
use crate::neural::training::{Batch, PolicyTarget};

// Concentration of the random policy targets
const POLICY_TARGET_ALPHA: f64 = 0.3;
// Share of input squares set in a random position
const PLANE_DENSITY: f64 = 0.2;

pub fn log_tensor_stats(tensor: &Tensor, message: &str) {
    if !enabled!(Level::TRACE) {
        return;
    }
    trace!(
        sum = tensor.sum(Kind::Float).double_value(&[]),
        mean = tensor.mean(Kind::Float).double_value(&[]),
        std = tensor.std(true).double_value(&[]),
        max = tensor.max().double_value(&[]),
        min = tensor.min().double_value(&[]),
        "{}",
        message
    );
}

/// Random batch with binary input planes, Dirichlet policy targets and
/// results drawn from win, draw and loss.
pub fn synthetic_batch(config: &RiseConfig, batch_size: i64, device: Device, rng: &mut impl Rng) -> Result<Batch> {
    let num_outputs = config.num_policy_outputs() as usize;
    let dirichlet = Dirichlet::new_with_size(POLICY_TARGET_ALPHA, num_outputs)
        .map_err(|e| NetError::invalid_config(format!("cannot sample policy targets: {}", e)))?;

    let shape = config.input_shape(batch_size);
    let num_inputs = shape.iter().product::<i64>() as usize;
    let planes: Vec<f32> = (0..num_inputs)
        .map(|_| if rng.gen_bool(PLANE_DENSITY) { 1. } else { 0. })
        .collect();

    let mut policies = Vec::with_capacity(batch_size as usize * num_outputs);
    let mut values = Vec::with_capacity(batch_size as usize);
    for _ in 0..batch_size {
        policies.extend(dirichlet.sample(rng).into_iter().map(|p| p as f32));
        values.push(rng.gen_range(-1..=1) as f32);
    }

    Ok(Batch {
        inputs: Tensor::from_slice(&planes).view(shape).to_device(device),
        policy: PolicyTarget::Distribution(
            Tensor::from_slice(&policies).view([batch_size, num_outputs as i64]).to_device(device),
        ),
        values: Tensor::from_slice(&values).to_device(device),
    })
}
