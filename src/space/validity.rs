//! Ready-made state validity checkers

use nalgebra::DVector;

use crate::common::traits::StateValidityChecker;
use crate::common::types::State;

/// Every state is valid (obstacle free space)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllValid;

impl StateValidityChecker for AllValid {
    fn is_valid(&self, _state: &State) -> bool {
        true
    }
}

/// Spherical obstacle over the leading coordinates of a state
#[derive(Debug, Clone)]
pub struct SphereObstacle {
    pub center: DVector<f64>,
    pub radius: f64,
}

impl SphereObstacle {
    pub fn new(center: Vec<f64>, radius: f64) -> Self {
        Self {
            center: DVector::from_vec(center),
            radius,
        }
    }
}

/// Collision checker for a robot of radius `robot_radius` among spheres.
///
/// Only the first `center.len()` coordinates of a state are considered, so
/// the same checker works for R^n, SE(2), SE(3) and compounds that start with
/// one of these.
#[derive(Debug, Clone)]
pub struct SphereObstacleChecker {
    pub obstacles: Vec<SphereObstacle>,
    pub robot_radius: f64,
}

impl SphereObstacleChecker {
    pub fn new(obstacles: Vec<SphereObstacle>, robot_radius: f64) -> Self {
        Self {
            obstacles,
            robot_radius,
        }
    }
}

impl StateValidityChecker for SphereObstacleChecker {
    fn is_valid(&self, state: &State) -> bool {
        self.obstacles.iter().all(|obs| {
            let n = obs.center.len().min(state.len());
            let d = state
                .rows(0, n)
                .iter()
                .zip(obs.center.iter())
                .map(|(x, c)| (x - c).powi(2))
                .sum::<f64>()
                .sqrt();
            d > obs.radius + self.robot_radius
        })
    }
}

/// Axis aligned box over the leading coordinates of a state
#[derive(Debug, Clone)]
pub struct BoxObstacle {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl BoxObstacle {
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, state: &State) -> bool {
        self.low
            .iter()
            .zip(self.high.iter())
            .enumerate()
            .all(|(i, (lo, hi))| i < state.len() && state[i] >= *lo && state[i] <= *hi)
    }
}

/// A state is valid when it lies outside every box
#[derive(Debug, Clone, Default)]
pub struct BoxObstacleChecker {
    pub boxes: Vec<BoxObstacle>,
}

impl BoxObstacleChecker {
    pub fn new(boxes: Vec<BoxObstacle>) -> Self {
        Self { boxes }
    }
}

impl StateValidityChecker for BoxObstacleChecker {
    fn is_valid(&self, state: &State) -> bool {
        !self.boxes.iter().any(|b| b.contains(state))
    }
}
