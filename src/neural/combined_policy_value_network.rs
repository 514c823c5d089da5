use tch::Tensor;

pub trait CombinedPolicyValueNetwork {
    /// Returns `(policy_logits, value)` for a batch of input planes.
    fn forward_t(&self, input: &Tensor, train: bool) -> (Tensor, Tensor);
}
