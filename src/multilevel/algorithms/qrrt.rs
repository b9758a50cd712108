//! Tree growth (QRRT)

use log::trace;

use super::{check_goal_and_wire, truncate_to_range, GrowthStrategy};
use crate::common::types::State;
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::level::BundleLevel;

/// Rapidly exploring tree over the bundle space. Goal biased until the level
/// is solved; after that new vertices are only recorded for sampling by the
/// finer levels.
#[derive(Debug, Default)]
pub struct Qrrt;

impl Qrrt {
    pub fn new() -> Self {
        Qrrt
    }
}

impl GrowthStrategy for Qrrt {
    fn name(&self) -> &'static str {
        "QRRT"
    }

    fn grow(&mut self, graph: &mut BundleSpaceGraph, ancestors: &mut [BundleLevel]) {
        let mut x_random = graph.sample_bundle_goal_bias(ancestors);

        let nearest = match graph.nearest(&x_random) {
            Some(v) => v,
            None => return,
        };
        let x_nearest = graph.state(nearest).clone();
        let space = graph.bundle().clone();
        truncate_to_range(space.space(), &x_nearest, &mut x_random, graph.max_distance());

        if !graph.check_motion(&x_nearest, &x_random) {
            return;
        }
        let v_next = graph.add_configuration(x_random);
        if !graph.has_solution() {
            graph.add_edge(nearest, v_next);
            if check_goal_and_wire(graph, v_next) {
                trace!("QRRT reached the goal from vertex {}", v_next);
            }
        }
    }

    /// Exact copy of a random tree vertex
    fn sample_base(&mut self, graph: &mut BundleSpaceGraph) -> State {
        graph.random_vertex_state()
    }
}
