//! Biased samplers and their decay schedules

pub mod decay;
pub mod graph_sampler;

pub use decay::{ExponentialDecay, LinearDecay};
pub use graph_sampler::{GraphSampler, GraphSamplerConfig, GraphSamplerKind};
