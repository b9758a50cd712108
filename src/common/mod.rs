//! Common types, traits, and error definitions for multilevel_planning
//!
//! This module provides the foundational building blocks shared by the
//! spaces, the nearest-neighbour index and the multilevel planners.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
