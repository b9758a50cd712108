//! Multi-level planners over sequences of bundle spaces.
//!
//! Each level searches a bundle space that projects onto the space of the
//! level below it. Coarse levels are solved first and their roadmaps and
//! solution paths bias the sampling of the finer levels.

pub mod algorithms;
pub mod bundle_space;
pub mod bundle_space_graph;
pub mod components;
pub mod graph;
pub mod level;
pub mod path_restriction;
pub mod sampler;
pub mod sequence;

pub use algorithms::{GrowthStrategy, PlannerKind, Qmp, QmpConfig, QmpStar, QmpStarConfig, Qrrt};
pub use bundle_space::{BundleSpace, Importance};
pub use bundle_space_graph::{BundleSpaceGraph, BundleSpaceGraphConfig, Problem};
pub use level::{BundleLevel, LevelStats};
pub use path_restriction::PathRestriction;
pub use sampler::{GraphSampler, GraphSamplerConfig, GraphSamplerKind};
pub use sequence::BundleSpaceSequence;
