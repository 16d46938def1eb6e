use super::Sigmoid;

/// The threshold function applied to the dot products of a layer.
#[derive(Clone, Debug)]
pub enum ActFn {
    Sigmoid(Sigmoid),
}
use ActFn::*;

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Sigmoid(Sigmoid::new(amp))
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Sigmoid(a) => a.f(x),
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            Sigmoid(a) => a.df(x),
        }
    }
}

impl Default for ActFn {
    fn default() -> Self {
        Self::sigmoid(1.0)
    }
}
