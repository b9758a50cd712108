//! Roadmap growth with PRM* neighbour count and failure driven expansion
//! (QMP*)

use std::f64::consts::E;

use log::trace;
use rand::distributions::{Distribution, WeightedIndex};

use super::GrowthStrategy;
use crate::common::types::State;
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::level::BundleLevel;

/// `ceil((e + e/d) * ln(n))` neighbours for a roadmap of `n` vertices in
/// dimension `d`
pub fn milestone_k(num_vertices: usize, dimension: usize) -> usize {
    let d = dimension.max(1) as f64;
    let n = num_vertices.max(1) as f64;
    ((E + E / d) * n.ln()).ceil() as usize
}

#[derive(Debug, Clone)]
pub struct QmpStarConfig {
    /// Every n-th call expands instead of adding a milestone
    pub expand_every: u64,
    /// Number of random bounce motions per expansion
    pub bounce_steps: usize,
}

impl Default for QmpStarConfig {
    fn default() -> Self {
        Self {
            expand_every: 5,
            bounce_steps: 5,
        }
    }
}

#[derive(Debug)]
pub struct QmpStar {
    config: QmpStarConfig,
    grow_counter: u64,
}

impl QmpStar {
    pub fn new(config: QmpStarConfig) -> Self {
        QmpStar {
            config,
            grow_counter: 0,
        }
    }

    /// Inserts `state` and tries to connect it to its `milestone_k`
    /// nearest vertices, counting every attempt on both ends.
    pub fn add_milestone(&mut self, graph: &mut BundleSpaceGraph, state: State) -> usize {
        let v_next = graph.add_configuration(state);
        let k = milestone_k(graph.num_vertices(), graph.space().bundle_dimension());
        let neighbors: Vec<usize> = graph
            .nearest_k(graph.state(v_next), k + 1)
            .into_iter()
            .filter(|&q| q != v_next)
            .take(k)
            .collect();

        for q in neighbors {
            graph.vertex_mut(v_next).total_connection_attempts += 1;
            graph.vertex_mut(q).total_connection_attempts += 1;
            if graph.check_motion(graph.state(q), graph.state(v_next)) {
                graph.add_edge(q, v_next);
                graph.vertex_mut(v_next).successful_connection_attempts += 1;
                graph.vertex_mut(q).successful_connection_attempts += 1;
            }
        }
        graph.has_solution();
        v_next
    }

    /// Picks a vertex with probability proportional to its failure rate and
    /// grows a chain of random bounce motions out of it
    pub fn expand(&mut self, graph: &mut BundleSpaceGraph) {
        let weights: Vec<f64> = graph
            .roadmap()
            .vertices()
            .iter()
            .map(|c| c.failure_rate())
            .collect();
        // fails when every weight is zero, e.g. before any connection attempt
        let pdf = match WeightedIndex::new(&weights) {
            Ok(pdf) => pdf,
            Err(_) => return,
        };
        let v = pdf.sample(graph.rng_mut());

        let start = graph.state(v).clone();
        let si = graph.bundle().clone();
        let states = si.random_bounce_motion(graph.rng_mut(), &start, self.config.bounce_steps);
        let (last, chain) = match states.split_last() {
            Some(split) => split,
            None => return,
        };
        trace!("QMP* expanding vertex {} with {} bounce states", v, states.len());

        let v_last = self.add_milestone(graph, last.clone());
        let mut prev = v;
        for s in chain {
            let tmp = graph.add_configuration(s.clone());
            graph.add_edge(prev, tmp);
            prev = tmp;
        }
        if !graph.same_component(prev, v_last) {
            graph.add_edge(prev, v_last);
        }
        graph.has_solution();
    }
}

impl GrowthStrategy for QmpStar {
    fn name(&self) -> &'static str {
        "QMPStar"
    }

    fn init(&mut self, graph: &mut BundleSpaceGraph) {
        if graph.goal_vertex().is_none() {
            graph.add_goal_configuration();
        }
    }

    fn grow(&mut self, graph: &mut BundleSpaceGraph, ancestors: &mut [BundleLevel]) {
        self.grow_counter += 1;
        if self.config.expand_every > 0 && self.grow_counter % self.config.expand_every == 0 {
            self.expand(graph);
            return;
        }
        let x_random = graph.sample_bundle_goal_bias(ancestors);
        if !graph.space().is_valid(&x_random) {
            return;
        }
        self.add_milestone(graph, x_random);
    }

    fn clear(&mut self) {
        self.grow_counter = 0;
    }
}
