/// Decides how the parameters move given the gradient of a batch.
pub trait Optimizer {
    /// Applies one update to `params`, `grad` has the same length.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]);
}
