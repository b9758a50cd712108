//! State spaces, validity checking and motion validation consumed by the
//! multilevel planners.

pub mod bounds;
pub mod state_space;
pub mod space_information;
pub mod validity;

pub use bounds::RealVectorBounds;
pub use state_space::{wrap_angle, StateSpace};
pub use space_information::{MotionCheck, SpaceInformation};
pub use validity::{AllValid, BoxObstacle, BoxObstacleChecker, SphereObstacle, SphereObstacleChecker};
