//! Teaches a perceptron to reproduce bitmaps: text file formats, training sessions and the
//! encode, train, decode and display pipeline.

pub mod cases;
pub mod configs;
pub mod error;
mod pipeline;
mod session;

pub use error::{OrchestratorError, Result};
pub use pipeline::{Pipeline, PipelineEvent, Stage, Viewer};
pub use session::{
    TrainOptions, decode, encode, load_weights, save_weights, train_combined, train_files,
};
