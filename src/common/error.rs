//! Error types for multilevel_planning

use std::fmt;

use thiserror::Error;

/// Which member of a bundle/base/fiber triple an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceRole {
    Bundle,
    Base,
    Fiber,
}

impl fmt::Display for SpaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceRole::Bundle => write!(f, "Bundle"),
            SpaceRole::Base => write!(f, "Base"),
            SpaceRole::Fiber => write!(f, "Fiber"),
        }
    }
}

/// Main error type for the multilevel planners.
///
/// Everything here is a configuration problem detected while a level is being
/// built or tuned. Sampling and connection failures inside `grow()` are not
/// errors and never surface through this type.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// dim(Base) + dim(Fiber) != dim(Bundle)
    #[error("Dimension mismatch: base {base} + fiber {fiber} != bundle {bundle}")]
    DimensionMismatch {
        base: usize,
        fiber: usize,
        bundle: usize,
    },
    /// A space without finite bounds cannot be sampled uniformly
    #[error("{role} space has no bounds (dimension {dimension}, measure {measure})")]
    InfiniteMeasure {
        role: SpaceRole,
        dimension: usize,
        measure: f64,
    },
    /// A space with empty interior
    #[error("Zero-measure {role} space detected (dimension {dimension}, measure {measure})")]
    ZeroMeasure {
        role: SpaceRole,
        dimension: usize,
        measure: f64,
    },
    /// No component knows how to split this bundle over this base
    #[error("Unsupported projection: bundle {bundle} over base {base}")]
    UnsupportedProjection { bundle: String, base: String },
    /// A graph sampler was paired with a graph it cannot work on
    #[error("Invalid sampler: {0}")]
    InvalidSampler(String),
    /// Operation that is not meant to be called on this object
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Planning requested before start/goal were given
    #[error("Problem definition missing: {0}")]
    MissingProblem(String),
}

/// Result type alias for planner construction and configuration
pub type PlanningResult<T> = Result<T, PlanningError>;
