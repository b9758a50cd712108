//! multilevel_planning - sampling based motion planning over sequences of
//! nested state spaces
//!
//! This crate provides the multi-level planners QRRT, QMP and QMP*, the
//! bundle space projections they rely on, a sparse roadmap spanner and the
//! graph samplers that pass information from coarse to fine levels.

// Core modules
pub mod common;
pub mod space;
pub mod nearest;

// Planner modules
pub mod multilevel;

// Re-export common types for convenience
pub use common::{State, StatePath, GoalState, IterationBudget};
pub use common::{Goal, StateValidityChecker, TerminationCondition};
pub use common::{PlanningError, PlanningResult};
pub use space::{SpaceInformation, StateSpace, RealVectorBounds};
pub use multilevel::{BundleSpaceSequence, BundleSpaceGraphConfig, PlannerKind};
