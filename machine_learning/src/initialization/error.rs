use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::uniform::Error as UniformError;

/// The result type of the `RandParamGen` constructors.
pub type Result<T> = std::result::Result<T, RandErr>;

/// Why a weight distribution couldn't be built.
#[derive(Debug)]
pub enum RandErr {
    /// The bounds leave no value to draw, or aren't numbers at all.
    EmptyRange { low: f32, high: f32 },
    Distribution(UniformError),
}

impl Display for RandErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandErr::EmptyRange { low, high } => {
                write!(f, "no weights can be drawn between {low} and {high}")
            }
            RandErr::Distribution(e) => write!(f, "{e}"),
        }
    }
}

impl Error for RandErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RandErr::Distribution(e) => Some(e),
            RandErr::EmptyRange { .. } => None,
        }
    }
}

impl From<UniformError> for RandErr {
    fn from(value: UniformError) -> Self {
        Self::Distribution(value)
    }
}
