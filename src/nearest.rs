//! Nearest neighbour index over states
//!
//! Brute force search in the manner of a small KD-tree replacement: every
//! query scans all stored states under the space metric.

use ordered_float::OrderedFloat;

use crate::common::types::State;
use crate::space::StateSpace;

/// Nearest neighbour collaborator contract, keyed by vertex id
pub trait NearestNeighbors {
    fn add(&mut self, id: usize, state: State);

    /// Returns true if `id` was stored
    fn remove(&mut self, id: usize) -> bool;

    fn nearest(&self, query: &State) -> Option<usize>;

    /// Up to `k` ids ordered by increasing distance
    fn nearest_k(&self, query: &State, k: usize) -> Vec<usize>;

    /// All ids within `radius`, with their distance, ordered by distance
    fn nearest_r(&self, query: &State, radius: f64) -> Vec<(usize, f64)>;

    fn size(&self) -> usize;

    fn clear(&mut self);
}

/// Linear scan index
#[derive(Debug, Clone)]
pub struct NearestNeighborsLinear {
    space: StateSpace,
    points: Vec<(usize, State)>,
}

impl NearestNeighborsLinear {
    pub fn new(space: StateSpace) -> Self {
        NearestNeighborsLinear {
            space,
            points: Vec::new(),
        }
    }

    fn distances(&self, query: &State) -> Vec<(usize, f64)> {
        self.points
            .iter()
            .map(|(id, s)| (*id, self.space.distance(query, s)))
            .collect()
    }
}

impl NearestNeighbors for NearestNeighborsLinear {
    fn add(&mut self, id: usize, state: State) {
        self.points.push((id, state));
    }

    fn remove(&mut self, id: usize) -> bool {
        let before = self.points.len();
        self.points.retain(|(i, _)| *i != id);
        self.points.len() != before
    }

    fn nearest(&self, query: &State) -> Option<usize> {
        self.distances(query)
            .into_iter()
            .min_by_key(|(_, d)| OrderedFloat(*d))
            .map(|(id, _)| id)
    }

    fn nearest_k(&self, query: &State, k: usize) -> Vec<usize> {
        let mut distances = self.distances(query);
        distances.sort_by_key(|(_, d)| OrderedFloat(*d));
        distances.truncate(k);
        distances.into_iter().map(|(id, _)| id).collect()
    }

    fn nearest_r(&self, query: &State, radius: f64) -> Vec<(usize, f64)> {
        let mut within: Vec<(usize, f64)> = self
            .distances(query)
            .into_iter()
            .filter(|(_, d)| *d <= radius)
            .collect();
        within.sort_by_key(|(_, d)| OrderedFloat(*d));
        within
    }

    fn size(&self) -> usize {
        self.points.len()
    }

    fn clear(&mut self) {
        self.points.clear();
    }
}
