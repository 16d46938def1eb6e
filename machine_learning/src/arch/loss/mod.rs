mod half_sse;
mod loss_fn;

pub use half_sse::HalfSse;
pub use loss_fn::LossFn;
