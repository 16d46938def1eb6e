pub mod activations;
pub mod layers;
pub mod loss;
mod model;
mod sequential;
mod snapshot;

pub use model::Model;
pub use sequential::Sequential;
pub use snapshot::{LayerSnapshot, ModelSnapshot};
