//! A state space paired with its validity checker and a discrete motion
//! validator.

use std::fmt;

use rand::Rng;

use crate::common::error::{PlanningError, PlanningResult};
use crate::common::traits::StateValidityChecker;
use crate::common::types::State;
use crate::space::state_space::StateSpace;
use crate::space::validity::AllValid;

/// Default motion check resolution, as a fraction of the maximum extent
pub const DEFAULT_MOTION_RESOLUTION: f64 = 0.01;

/// Fraction under which a partially valid motion is considered stuck
const MIN_PROGRESS: f64 = 1e-9;

/// Outcome of a motion check that reports how far it got
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCheck {
    Valid,
    /// `last_valid` is the last collision free interpolated state,
    /// `fraction` its position along the motion in `[0, 1)`
    Blocked { last_valid: State, fraction: f64 },
}

pub struct SpaceInformation {
    space: StateSpace,
    checker: Box<dyn StateValidityChecker>,
    resolution: f64,
}

impl SpaceInformation {
    pub fn new(space: StateSpace, checker: Box<dyn StateValidityChecker>) -> Self {
        SpaceInformation {
            space,
            checker,
            resolution: DEFAULT_MOTION_RESOLUTION,
        }
    }

    /// Space without obstacles; used for fiber spaces
    pub fn unconstrained(space: StateSpace) -> Self {
        Self::new(space, Box::new(AllValid))
    }

    pub fn with_checker<C>(space: StateSpace, checker: C) -> Self
    where
        C: StateValidityChecker + 'static,
    {
        Self::new(space, Box::new(checker))
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: f64) -> PlanningResult<()> {
        if !(resolution > 0.0 && resolution <= 1.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "motion resolution must be in (0, 1], got {}",
                resolution
            )));
        }
        self.resolution = resolution;
        Ok(())
    }

    /// Inside the space bounds and accepted by the checker
    pub fn is_valid(&self, state: &State) -> bool {
        self.space.satisfies_bounds(state) && self.checker.is_valid(state)
    }

    pub fn distance(&self, a: &State, b: &State) -> f64 {
        self.space.distance(a, b)
    }

    fn segment_count(&self, a: &State, b: &State) -> usize {
        let step = self.resolution * self.space.maximum_extent();
        if step <= 0.0 {
            return 1;
        }
        ((self.space.distance(a, b) / step).ceil() as usize).max(1)
    }

    /// Checks `b` and the interpolated states between `a` and `b`.
    /// `a` is assumed valid.
    pub fn check_motion(&self, a: &State, b: &State) -> bool {
        if !self.is_valid(b) {
            return false;
        }
        let n = self.segment_count(a, b);
        (1..n).all(|i| {
            let s = self.space.interpolate(a, b, i as f64 / n as f64);
            self.is_valid(&s)
        })
    }

    /// Like [`check_motion`](Self::check_motion) but walks from `a` towards `b`
    /// and reports the last valid state on failure.
    pub fn check_motion_partial(&self, a: &State, b: &State) -> MotionCheck {
        let n = self.segment_count(a, b);
        let mut last_valid = a.clone();
        let mut fraction = 0.0;
        for i in 1..=n {
            let t = i as f64 / n as f64;
            let s = self.space.interpolate(a, b, t);
            if !self.is_valid(&s) {
                return MotionCheck::Blocked {
                    last_valid,
                    fraction,
                };
            }
            last_valid = s;
            fraction = t;
        }
        MotionCheck::Valid
    }

    /// Follows up to `steps` random motions starting at `start`, stopping
    /// each one at its first collision. Returns the reached states in order.
    pub fn random_bounce_motion<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        start: &State,
        steps: usize,
    ) -> Vec<State> {
        let mut states = Vec::with_capacity(steps);
        let mut prev = start.clone();
        for _ in 0..steps {
            let target = self.space.sample_uniform(rng);
            match self.check_motion_partial(&prev, &target) {
                MotionCheck::Valid => {
                    states.push(target.clone());
                    prev = target;
                }
                MotionCheck::Blocked {
                    last_valid,
                    fraction,
                } if fraction > MIN_PROGRESS => {
                    states.push(last_valid.clone());
                    prev = last_valid;
                }
                MotionCheck::Blocked { .. } => {}
            }
        }
        states
    }
}

impl fmt::Debug for SpaceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceInformation")
            .field("space", &self.space)
            .field("resolution", &self.resolution)
            .finish()
    }
}
