use std::{error::Error, fmt, io};

/// The bitmap module's result type.
pub type Result<T> = std::result::Result<T, DibErr>;

/// Failures reading, writing or converting a bitmap.
#[derive(Debug)]
pub enum DibErr {
    Io(io::Error),
    NotABitmap { magic: [u8; 2] },
    UnsupportedHeader { size: u32 },
    UnsupportedBitCount { bit_count: u16 },
    UnsupportedCompression { compression: u32, bit_count: u16 },
    Truncated { what: &'static str },
    InvalidDimensions { width: i64, height: i64 },
    ActivationCount { got: usize, expected: usize },
}

impl fmt::Display for DibErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DibErr::Io(e) => write!(f, "io error: {e}"),
            DibErr::NotABitmap { magic } => {
                write!(f, "not a bitmap: expected magic \"BM\", got {magic:?}")
            }
            DibErr::UnsupportedHeader { size } => {
                write!(f, "unsupported info header of {size} bytes")
            }
            DibErr::UnsupportedBitCount { bit_count } => {
                write!(f, "unsupported bit count {bit_count}")
            }
            DibErr::UnsupportedCompression {
                compression,
                bit_count,
            } => write!(
                f,
                "unsupported compression {compression} for a {bit_count} bit bitmap"
            ),
            DibErr::Truncated { what } => write!(f, "truncated bitmap while reading {what}"),
            DibErr::InvalidDimensions { width, height } => {
                write!(f, "invalid bitmap dimensions {width}x{height}")
            }
            DibErr::ActivationCount { got, expected } => write!(
                f,
                "activation count mismatch: got {got}, expected {expected}"
            ),
        }
    }
}

impl Error for DibErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DibErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DibErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
