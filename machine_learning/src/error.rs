use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::initialization::RandErr;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidArchitecture(String),
    InvalidDataset {
        len: usize,
        row_size: usize,
    },
    EmptyDataset,
    ParamGenExhausted {
        got: usize,
        expected: usize,
    },
    Rand(RandErr),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidArchitecture(msg) => write!(f, "Invalid architecture: {msg}"),
            MlErr::InvalidDataset { len, row_size } => write!(
                f,
                "The dataset has {len} values, which can't be split in rows of {row_size}"
            ),
            MlErr::EmptyDataset => write!(f, "The dataset has no rows"),
            MlErr::ParamGenExhausted { got, expected } => write!(
                f,
                "The parameter generator got exhausted after {got} of {expected} parameters"
            ),
            MlErr::Rand(e) => write!(f, "Failed to create the weight distribution: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Rand(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RandErr> for MlErr {
    fn from(value: RandErr) -> Self {
        Self::Rand(value)
    }
}
