use serde::{Deserialize, Serialize};

/// The weights of a single connectivity layer, indexed as `weights[source][dest]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub dim: (usize, usize),
    pub weights: Vec<Vec<f32>>,
}

/// A serializable copy of every weight of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub layers: Vec<LayerSnapshot>,
}
