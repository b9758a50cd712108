//! Undirected weighted graph of configurations

use crate::common::types::State;

/// Graph vertex payload
#[derive(Debug, Clone)]
pub struct Configuration {
    pub state: State,
    /// Neighbour connections attempted from this vertex
    pub total_connection_attempts: u32,
    /// ...and how many of them produced an edge
    pub successful_connection_attempts: u32,
    /// Sparse graph only: the sparse vertex representing this one
    pub representative: Option<usize>,
    /// Sparse graph only: id of the dense vertex this sparse vertex copies
    pub dense_vertex: Option<usize>,
    pub is_start: bool,
    pub is_goal: bool,
}

impl Configuration {
    pub fn new(state: State) -> Self {
        Configuration {
            state,
            total_connection_attempts: 0,
            successful_connection_attempts: 0,
            representative: None,
            dense_vertex: None,
            is_start: false,
            is_goal: false,
        }
    }

    /// `(attempts - successes) / attempts`, zero while nothing was attempted
    pub fn failure_rate(&self) -> f64 {
        if self.total_connection_attempts == 0 {
            return 0.0;
        }
        let failures = self
            .total_connection_attempts
            .saturating_sub(self.successful_connection_attempts);
        failures as f64 / self.total_connection_attempts as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Roadmap {
    vertices: Vec<Configuration>,
    adjacency: Vec<Vec<Edge>>,
    num_edges: usize,
}

impl Roadmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, configuration: Configuration) -> usize {
        self.vertices.push(configuration);
        self.adjacency.push(Vec::new());
        self.vertices.len() - 1
    }

    /// Adds an undirected edge. Self loops and parallel edges are ignored and
    /// reported as `false`.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) -> bool {
        if a == b || self.has_edge(a, b) {
            return false;
        }
        self.adjacency[a].push(Edge { target: b, weight });
        self.adjacency[b].push(Edge { target: a, weight });
        self.num_edges += 1;
        true
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].iter().any(|e| e.target == b)
    }

    pub fn neighbors(&self, v: usize) -> &[Edge] {
        &self.adjacency[v]
    }

    pub fn vertex(&self, v: usize) -> &Configuration {
        &self.vertices[v]
    }

    pub fn vertex_mut(&mut self, v: usize) -> &mut Configuration {
        &mut self.vertices[v]
    }

    pub fn state(&self, v: usize) -> &State {
        &self.vertices[v].state
    }

    pub fn vertices(&self) -> &[Configuration] {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.adjacency.clear();
        self.num_edges = 0;
    }
}
