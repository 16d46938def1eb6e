use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected connectivity layer between two activation layers.
///
/// The layer has no biases, its parameters are the `inputs * outputs` weights laid out as
/// `w[source][dest]` in row-major order.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,
    a: Array2<f32>,

    // Backward metadata
    d: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The amount of source and destination nodes.
    /// * `act_fn` - The threshold function applied to each destination node, if any.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        let zeros = Array2::zeros((0, 0));

        Self {
            dim,
            size: dim.0 * dim.1,
            act_fn,
            x: zeros.clone(),
            z: zeros.clone(),
            a: zeros.clone(),
            d: zeros,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    pub fn act_fn(&self) -> Option<&ActFn> {
        self.act_fn.as_ref()
    }

    /// Computes the dot products `theta = x . w` and, if present, applies the activation function.
    ///
    /// Both `x` and `theta` are kept for the following `backward` call.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "layer inputs",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let w = self.view_params(params)?;
        let shape = (x.nrows(), self.dim.1);

        reshape(&mut self.z, shape);
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut self.z);

        self.x = x.to_owned();

        let Some(ref act_fn) = self.act_fn else {
            return Ok(self.z.view());
        };

        reshape(&mut self.a, shape);
        self.a.zip_mut_with(&self.z, |a, &z| *a = act_fn.f(z));
        Ok(self.a.view())
    }

    /// Back propagates the delta `d` of this layer's outputs.
    ///
    /// Writes the partial derivatives of the loss with respect to this layer's weights into
    /// `grad` and returns the delta for the previous layer's outputs.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: ArrayViewMut2<f32>,
    ) -> Result<ArrayViewMut2<'_, f32>> {
        if d.dim() != self.z.dim() {
            return Err(MlErr::SizeMismatch {
                what: "layer deltas",
                got: d.len(),
                expected: self.z.len(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let mut dw = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &self.x.t(), &d, 0.0, &mut dw);

        let w = self.view_params(params)?;
        reshape(&mut self.d, (d.nrows(), self.dim.0));
        linalg::general_mat_mul(1.0, &d, &w.t(), 0.0, &mut self.d);

        Ok(self.d.view_mut())
    }

    /// Gives a view of the raw gradient slice as the delta weights of this layer.
    fn view_grad<'a>(&self, grad: &'a mut [f32]) -> Result<ArrayViewMut2<'a, f32>> {
        let got = grad.len();

        ArrayViewMut2::from_shape(self.dim, grad).map_err(|_| MlErr::SizeMismatch {
            what: "layer gradient",
            got,
            expected: self.size,
        })
    }

    /// Gives a view of the raw parameter slice as the weights of this layer.
    fn view_params<'a>(&self, params: &'a [f32]) -> Result<ArrayView2<'a, f32>> {
        ArrayView2::from_shape(self.dim, params).map_err(|_| MlErr::SizeMismatch {
            what: "layer parameters",
            got: params.len(),
            expected: self.size,
        })
    }
}

fn reshape(buf: &mut Array2<f32>, shape: (usize, usize)) {
    if buf.dim() != shape {
        *buf = Array2::zeros(shape);
    }
}
