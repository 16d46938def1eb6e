use std::num::NonZeroUsize;

use machine_learning::{
    arch::{Sequential, activations::ActFn},
    dataset::Dataset,
    initialization::{ParamGen, RandParamGen},
    optimization::GradientDescent,
    training::TrainerConfig,
};
use rand::Rng;

use super::NetworkConfig;
use crate::{OrchestratorError, Result};

/// Turns a `NetworkConfig` into the components of a perceptron training session.
pub struct Adapter;

impl Adapter {
    pub fn new() -> Self {
        Self
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Checks that the network can be built and trained.
    pub fn validate(&self, network: &NetworkConfig) -> Result<()> {
        if network.inputs == 0 || network.outputs == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "input and output layers must have at least one node".into(),
            ));
        }

        if network.hidden.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "at least one hidden layer is required".into(),
            ));
        }

        if let Some(i) = network.hidden.iter().position(|&n| n == 0) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "hidden layer {i} has no nodes"
            )));
        }

        if !(network.lambda.is_finite() && network.lambda > 0.) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "lambda must be positive, got {}",
                network.lambda
            )));
        }

        if network.min_error.is_nan() || network.min_error < 0. {
            return Err(OrchestratorError::InvalidConfig(format!(
                "minimum error must not be negative, got {}",
                network.min_error
            )));
        }

        if !(network.low.is_finite() && network.high.is_finite() && network.low < network.high) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "random weight bounds must satisfy low < high, got [{}, {})",
                network.low, network.high
            )));
        }

        if network.num_cases == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "at least one training case is required".into(),
            ));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Adaptation
    // -------------------------------------------------------------------------

    /// Builds the perceptron, a sigmoid threshold on every connectivity layer.
    pub fn adapt_model(&self, network: &NetworkConfig) -> Result<Sequential> {
        let model = Sequential::perceptron(
            network.inputs,
            &network.hidden,
            network.outputs,
            ActFn::default(),
        )?;

        Ok(model)
    }

    pub fn adapt_optimizer(&self, network: &NetworkConfig) -> GradientDescent {
        GradientDescent::new(network.lambda)
    }

    /// Visits the cases one at a time, in file order unless `shuffle` is set.
    pub fn adapt_trainer_config(&self, network: &NetworkConfig, shuffle: bool) -> TrainerConfig {
        TrainerConfig {
            min_error: network.min_error,
            max_steps: network.max_steps,
            batch_size: NonZeroUsize::MIN,
            shuffle,
        }
    }

    /// Pairs every input row with its truth row.
    ///
    /// # Returns
    /// The dataset or an error if the amount of cases or their widths don't match the network.
    pub fn adapt_dataset(
        &self,
        network: &NetworkConfig,
        inputs: &[Vec<f32>],
        truths: &[Vec<f32>],
    ) -> Result<Dataset> {
        for (what, rows, width) in [
            ("activation", inputs, network.inputs),
            ("truth", truths, network.outputs),
        ] {
            if rows.len() != network.num_cases {
                return Err(OrchestratorError::InvalidConfig(format!(
                    "expected {} {what} cases, got {}",
                    network.num_cases,
                    rows.len()
                )));
            }

            if let Some(i) = rows.iter().position(|row| row.len() != width) {
                return Err(OrchestratorError::InvalidConfig(format!(
                    "{what} case {} has {} values, expected {width}",
                    i + 1,
                    rows[i].len()
                )));
            }
        }

        Ok(Dataset::from_cases(inputs, truths)?)
    }

    /// Draws `size` initial weights uniformly from `[low, high)`.
    pub fn adapt_param_gen<R: Rng>(
        &self,
        network: &NetworkConfig,
        size: usize,
        rng: R,
    ) -> Result<impl ParamGen + use<R>> {
        RandParamGen::uniform(rng, size, network.low, network.high)
            .map_err(|e| OrchestratorError::Ml(e.into()))
    }
}
