//! Common types used throughout multilevel_planning

use itertools::Itertools;
use nalgebra::DVector;

use crate::space::StateSpace;

/// A point of some state space, stored as flat coordinates.
///
/// The coordinate layout is fixed by the owning [`StateSpace`]: rotations in
/// SO(2) take one slot (the yaw), rotations in SO(3) take four (a unit
/// quaternion `x, y, z, w`), compound spaces concatenate their parts.
pub type State = DVector<f64>;

/// Allocate a zeroed state with `len` coordinates
pub fn alloc_state(len: usize) -> State {
    DVector::zeros(len)
}

/// Path represented as a sequence of states of one space
#[derive(Debug, Clone, PartialEq)]
pub struct StatePath {
    pub states: Vec<State>,
}

impl StatePath {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub fn from_states(states: Vec<State>) -> Self {
        Self { states }
    }

    pub fn push(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }

    /// Lengths of the individual segments under the metric of `space`
    pub fn segment_lengths(&self, space: &StateSpace) -> Vec<f64> {
        self.states
            .iter()
            .tuple_windows()
            .map(|(a, b)| space.distance(a, b))
            .collect()
    }

    pub fn total_length(&self, space: &StateSpace) -> f64 {
        self.segment_lengths(space).iter().sum()
    }
}

impl Default for StatePath {
    fn default() -> Self {
        Self::new()
    }
}
