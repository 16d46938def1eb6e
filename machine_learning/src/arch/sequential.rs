use log::trace;
use ndarray::{Array2, ArrayView2};

use super::{
    LayerSnapshot, Model, ModelSnapshot, activations::ActFn, layers::Layer, loss::LossFn,
};
use crate::{MlErr, Result, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The model doesn't own its parameters, every layer consumes its slice of a flat parameter
/// buffer in order.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance or an error if there are no layers or two adjacent layers
    /// don't agree on their dimensions.
    pub fn new<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<_> = layers.into_iter().collect();

        if layers.is_empty() {
            return Err(MlErr::InvalidArchitecture(
                "a model needs at least one layer".into(),
            ));
        }

        if let Some(i) = layers.iter().position(|l| l.size() == 0) {
            return Err(MlErr::InvalidArchitecture(format!(
                "layer {i} has no connections"
            )));
        }

        for (i, pair) in layers.windows(2).enumerate() {
            let (_, prev_out) = pair[0].dim();
            let (curr_in, _) = pair[1].dim();

            if prev_out != curr_in {
                return Err(MlErr::InvalidArchitecture(format!(
                    "layer {}: input size ({curr_in}) does not match previous layer output size ({prev_out})",
                    i + 1
                )));
            }
        }

        Ok(Self { layers })
    }

    /// Creates a fully connected perceptron `inputs -> hidden[0] -> ... -> outputs`.
    ///
    /// # Arguments
    /// * `inputs` - The amount of nodes in the input activation layer.
    /// * `hidden` - The amount of nodes in each hidden activation layer.
    /// * `outputs` - The amount of nodes in the output activation layer.
    /// * `act_fn` - The threshold function used by every connectivity layer.
    pub fn perceptron(
        inputs: usize,
        hidden: &[usize],
        outputs: usize,
        act_fn: ActFn,
    ) -> Result<Self> {
        if hidden.is_empty() {
            return Err(MlErr::InvalidArchitecture(
                "a perceptron needs at least one hidden layer".into(),
            ));
        }

        let nodes: Vec<usize> = std::iter::once(inputs)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(outputs))
            .collect();

        let layers = nodes
            .windows(2)
            .map(|w| Layer::dense((w[0], w[1]), Some(act_fn.clone())));

        Self::new(layers)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The amount of nodes of the input activation layer.
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.dim().0)
    }

    /// The amount of nodes of the output activation layer.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.dim().1)
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `params` - The parameters of every layer, in order.
    /// * `x` - The input data, one case per row.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward<'x>(
        &'x mut self,
        params: &[f32],
        mut x: ArrayView2<'x, f32>,
    ) -> Result<ArrayView2<'x, f32>> {
        self.check_size("parameters", params.len())?;

        let mut rest = params;
        for layer in self.layers.iter_mut() {
            let (head, tail) = rest.split_at(layer.size());
            rest = tail;
            x = layer.forward(head, x)?;
        }

        Ok(x)
    }

    /// Exports the given parameters as a per layer `w[source][dest]` snapshot.
    pub fn snapshot(&self, params: &[f32]) -> Result<ModelSnapshot> {
        self.check_size("parameters", params.len())?;

        let mut rest = params;
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                let dim = layer.dim();
                let (head, tail) = rest.split_at(layer.size());
                rest = tail;

                LayerSnapshot {
                    dim,
                    weights: head.chunks(dim.1).map(<[f32]>::to_vec).collect(),
                }
            })
            .collect();

        Ok(ModelSnapshot { layers })
    }

    /// Builds the flat parameter buffer described by a snapshot.
    ///
    /// # Returns
    /// The parameters or an error if the snapshot doesn't describe this model's architecture.
    pub fn params_from(&self, snapshot: &ModelSnapshot) -> Result<Vec<f32>> {
        if snapshot.layers.len() != self.layers.len() {
            return Err(MlErr::SizeMismatch {
                what: "snapshot layers",
                got: snapshot.layers.len(),
                expected: self.layers.len(),
            });
        }

        let mut params = Vec::with_capacity(self.size());

        for (i, (layer, saved)) in self.layers.iter().zip(&snapshot.layers).enumerate() {
            let dim = layer.dim();
            let rows = saved.weights.len();
            let well_formed = rows == dim.0 && saved.weights.iter().all(|row| row.len() == dim.1);

            if saved.dim != dim || !well_formed {
                return Err(MlErr::InvalidArchitecture(format!(
                    "layer {i} is {dim:?} but the snapshot holds {:?} with {rows} rows",
                    saved.dim
                )));
            }

            params.extend(saved.weights.iter().flatten());
        }

        Ok(params)
    }

    fn check_size(&self, what: &'static str, got: usize) -> Result<()> {
        let expected = self.size();

        if got != expected {
            return Err(MlErr::SizeMismatch {
                what,
                got,
                expected,
            });
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn predict(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(self.forward(params, x)?.to_owned())
    }

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
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        let size = self.size();
        self.check_size("parameters", params.len())?;
        self.check_size("gradient", grad.len())?;

        let mut total_loss = 0.0;

        for (x, y) in batches {
            let y_pred = self.forward(params, x)?;

            if y_pred.dim() != y.dim() {
                return Err(MlErr::SizeMismatch {
                    what: "expected outputs",
                    got: y.len(),
                    expected: y_pred.len(),
                });
            }

            let loss = loss_fn.loss(y_pred, y);
            trace!(loss = loss; "batch forwarded");
            total_loss += loss;

            let mut d_last = loss_fn.loss_prime(y_pred, y);
            let mut d = d_last.view_mut();
            let mut end = size;

            for layer in self.layers.iter_mut().rev() {
                let start = end - layer.size();
                d = layer.backward(&params[start..end], &mut grad[start..end], d)?;
                end = start;
            }

            optimizer.update_params(params, grad);
        }

        Ok(total_loss)
    }
}
