//! Common traits describing the collaborators the planners consume

use crate::common::types::State;
use crate::space::StateSpace;

/// Decides whether a single state is feasible (collision free, within limits)
pub trait StateValidityChecker {
    fn is_valid(&self, state: &State) -> bool;
}

impl<F> StateValidityChecker for F
where
    F: Fn(&State) -> bool,
{
    fn is_valid(&self, state: &State) -> bool {
        self(state)
    }
}

/// Goal region of a planning problem
pub trait Goal {
    /// Distance from `state` to the goal region (0 inside)
    fn distance_goal(&self, state: &State) -> f64;

    /// Tolerance under which a state counts as reaching the goal
    fn threshold(&self) -> f64;

    fn is_satisfied(&self, state: &State) -> bool {
        self.distance_goal(state) <= self.threshold()
    }
}

/// Goal given by a single state and a tolerance around it
#[derive(Debug, Clone)]
pub struct GoalState {
    space: StateSpace,
    state: State,
    threshold: f64,
}

impl GoalState {
    pub fn new(space: StateSpace, state: State, threshold: f64) -> Self {
        Self {
            space,
            state,
            threshold,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

impl Goal for GoalState {
    fn distance_goal(&self, state: &State) -> f64 {
        self.space.distance(&self.state, state)
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// External stop signal polled by the sequence between `grow()` calls.
///
/// The planners never read a clock themselves; wall-clock budgets are built by
/// the caller on top of this trait.
pub trait TerminationCondition {
    fn should_terminate(&mut self) -> bool;
}

impl<F> TerminationCondition for F
where
    F: FnMut() -> bool,
{
    fn should_terminate(&mut self) -> bool {
        self()
    }
}

/// Terminates after a fixed number of polls
#[derive(Debug, Clone)]
pub struct IterationBudget {
    remaining: usize,
}

impl IterationBudget {
    pub fn new(iterations: usize) -> Self {
        Self {
            remaining: iterations,
        }
    }
}

impl TerminationCondition for IterationBudget {
    fn should_terminate(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}
