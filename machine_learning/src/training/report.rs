use std::{fmt, time::Duration};

/// Why a training session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The error got below the minimum error.
    ErrorThreshold,
    /// The maximum amount of steps was reached.
    StepLimit,
    /// The error stopped being a number.
    Diverged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::ErrorThreshold => "error is less than the minimum error",
            StopReason::StepLimit => "number of steps reached the maximum",
            StopReason::Diverged => "error diverged",
        };

        f.write_str(s)
    }
}

/// The outcome of `Trainer::train`.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// The amount of epochs run.
    pub steps: usize,
    /// The error of the last epoch, `None` if no epoch was run.
    pub error: Option<f32>,
    pub stop: StopReason,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            StopReason::StepLimit.to_string(),
            "number of steps reached the maximum"
        );
    }
}
