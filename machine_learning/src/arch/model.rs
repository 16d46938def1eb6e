use ndarray::{Array2, ArrayView2};

use crate::{Result, arch::loss::LossFn, optimization::Optimizer};

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Makes a forward pass through the model without keeping track of the gradient.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data, one case per row.
    ///
    /// # Returns
    /// The model's outputs, one row per case.
    fn predict(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Computes the gradient of the loss function with respect to the parameters of the model over
    /// the provided batches. **`params` gets updated** for each batch according to the
    /// optimization algorithm.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer for writing the computed gradient on each batch pass.
    /// * `loss_fn` - The loss function.
    /// * `optimizer` - The optimizer that dictates how to update the weights on each gradient calculation.
    /// * `batches` - The batches of data.
    ///
    /// # Returns
    /// The epoch error, the sum of each batch's loss measured before its update.
    fn backprop<'a, L, O, I>(
        &mut self,
        params: &mut [f32],
        grad: &mut [f32],
        loss_fn: &L,
        optimizer: &mut O,
        batches: I,
    ) -> Result<f32>
    where
        L: LossFn,
        O: Optimizer,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>;
}
