use std::time::Instant;

use log::{debug, info};
use ndarray::Array2;
use rand::Rng;

use super::{StopReason, TrainerConfig, TrainingReport};
use crate::{
    Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::Optimizer,
};

/// A model `Trainer`. Contains the relevant components needed for training a model,
/// including the model itself.
pub struct Trainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    grad: Vec<f32>,
    dataset: Dataset,
    optimizer: O,
    loss_fn: L,
    model: M,

    config: TrainerConfig,
    rng: R,
}

impl<M, O, L, R> Trainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `Trainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The rule used to update the parameters after each batch.
    /// * `dataset` - The dataset the model will be trained with.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `config` - The stop criteria and batching.
    /// * `rng` - A random number generator, used when shuffling.
    pub fn new(
        model: M,
        optimizer: O,
        dataset: Dataset,
        loss_fn: L,
        config: TrainerConfig,
        rng: R,
    ) -> Self {
        Self {
            grad: vec![0.0; model.size()],
            model,
            optimizer,
            dataset,
            loss_fn,
            config,
            rng,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Runs training epochs until the epoch error is at most `min_error` or `max_steps` epochs
    /// have been run, whichever comes first.
    ///
    /// # Arguments
    /// * `params` - The parameters of the model, updated in place.
    ///
    /// # Returns
    /// A report of the session or an error if the model, parameters and dataset don't agree.
    pub fn train(&mut self, params: &mut [f32]) -> Result<TrainingReport> {
        let TrainerConfig {
            min_error,
            max_steps,
            batch_size,
            shuffle,
        } = self.config;

        let start = Instant::now();
        let mut error: Option<f32> = None;
        let mut steps = 0;

        while error.is_none_or(|e| e > min_error) && steps < max_steps {
            if shuffle {
                self.dataset.shuffle(&mut self.rng);
            }

            let batches = self.dataset.batches(batch_size);
            let epoch_error = self.model.backprop(
                params,
                &mut self.grad,
                &self.loss_fn,
                &mut self.optimizer,
                batches,
            )?;

            steps += 1;
            error = Some(epoch_error);
            debug!(step = steps, error = epoch_error; "training step finished");

            if epoch_error.is_nan() {
                break;
            }
        }

        let stop = match error {
            Some(e) if e.is_nan() => StopReason::Diverged,
            Some(e) if e <= min_error => StopReason::ErrorThreshold,
            _ => StopReason::StepLimit,
        };

        let report = TrainingReport {
            steps,
            error,
            stop,
            elapsed: start.elapsed(),
        };

        info!(
            steps = report.steps;
            "training terminated because {stop}, error: {error:?}, minimum error: {min_error}, max steps: {max_steps}"
        );

        Ok(report)
    }

    /// Runs every case of the dataset through the model, in order.
    ///
    /// # Returns
    /// The model's outputs, one row per case.
    pub fn predict_cases(&mut self, params: &[f32]) -> Result<Array2<f32>> {
        self.model.predict(params, self.dataset.inputs())
    }
}
