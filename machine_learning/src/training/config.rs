use std::num::NonZeroUsize;

/// The stop criteria and batching of a `Trainer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    /// Training stops as soon as the epoch error is less than or equal to this value.
    pub min_error: f32,
    /// Training stops after this many epochs.
    pub max_steps: usize,
    pub batch_size: NonZeroUsize,
    /// Whether to shuffle the cases before each epoch.
    pub shuffle: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            min_error: 0.01,
            max_steps: 10_000,
            batch_size: NonZeroUsize::MIN,
            shuffle: false,
        }
    }
}
