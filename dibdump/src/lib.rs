//! Conversion between Windows device independent bitmaps and perceptron activations.

mod bitmap;
mod encoding;
pub mod error;
mod header;

pub use bitmap::{Bitmap, Rgb};
pub use encoding::PixelEncoding;
pub use error::{DibErr, Result};
