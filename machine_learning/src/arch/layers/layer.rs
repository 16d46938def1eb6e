use ndarray::{ArrayView2, ArrayViewMut2};

use super::Dense;
use crate::{Result, arch::activations::ActFn};

#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
}
use Layer::*;

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    /// Returns the amount of parameters of this layer.
    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
        }
    }

    /// Returns the `(inputs, outputs)` dimension of this layer.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Dense(l) => l.dim(),
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        match self {
            Dense(l) => l.forward(params, x),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: ArrayViewMut2<f32>,
    ) -> Result<ArrayViewMut2<'_, f32>> {
        match self {
            Dense(l) => l.backward(params, grad, d),
        }
    }
}
