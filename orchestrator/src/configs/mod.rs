mod adapter;
mod network;
mod pipeline;

pub use adapter::Adapter;
pub use network::NetworkConfig;
pub use pipeline::PipelineConfig;
