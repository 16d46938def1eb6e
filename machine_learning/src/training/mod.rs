mod config;
mod report;
mod trainer;

pub use config::TrainerConfig;
pub use report::{StopReason, TrainingReport};
pub use trainer::Trainer;
