use ndarray::{Array2, ArrayView2};

use super::LossFn;

/// Half of the sum of squared errors, `0.5 * sum((T - F)^2)`.
///
/// This is the perceptron's error function: its derivative is simply `F - T`, so a gradient
/// descent step of length `lambda` adds `lambda * a * psi` to every weight.
#[derive(Default, Clone, Copy, Debug)]
pub struct HalfSse;

impl HalfSse {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for HalfSse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        0.5 * (&y - &y_pred).mapv(|x| x.powi(2)).sum()
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        &y_pred - &y
    }
}
