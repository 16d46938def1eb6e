use ndarray::{ArrayView1, ArrayViewMut1};

use super::Optimizer;

/// Plain gradient descent, `w -= lambda * dE/dw` for every weight.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    lambda: f32,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` with the perceptron's learning rate `lambda`.
    pub fn new(lambda: f32) -> Self {
        Self { lambda }
    }

    pub fn learning_rate(&self) -> f32 {
        self.lambda
    }
}

impl Optimizer for GradientDescent {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) {
        let mut params = ArrayViewMut1::from(params);
        params.scaled_add(-self.lambda, &ArrayView1::from(grad));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let mut optimizer = GradientDescent::new(0.5);
        let mut params = [1., -1., 0.];

        optimizer.update_params(&mut params, &[2., -2., 0.]);
        assert_eq!(params, [0., 0., 0.]);
    }

    #[test]
    fn lambda_scales_the_step() {
        let mut params = [0.];

        GradientDescent::new(2.).update_params(&mut params, &[0.25]);
        assert_eq!(params, [-0.5]);
        assert_eq!(GradientDescent::new(2.).learning_rate(), 2.);
    }
}
