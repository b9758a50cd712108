//! Roadmap growth (QMP)

use super::{check_goal_and_wire, truncate_to_range, GrowthStrategy};
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::level::BundleLevel;

#[derive(Debug, Clone)]
pub struct QmpConfig {
    /// Neighbours tested per sample
    pub nearest_k: usize,
    /// Wire every feasible neighbour, not only the first one
    pub connect_all_feasible: bool,
}

impl Default for QmpConfig {
    fn default() -> Self {
        Self {
            nearest_k: 7,
            connect_all_feasible: true,
        }
    }
}

/// Probabilistic roadmap that adds at most one vertex per call
#[derive(Debug)]
pub struct Qmp {
    config: QmpConfig,
}

impl Qmp {
    pub fn new(config: QmpConfig) -> Self {
        Qmp { config }
    }

    pub fn config(&self) -> &QmpConfig {
        &self.config
    }
}

impl GrowthStrategy for Qmp {
    fn name(&self) -> &'static str {
        "QMP"
    }

    fn grow(&mut self, graph: &mut BundleSpaceGraph, ancestors: &mut [BundleLevel]) {
        let mut x_random = graph.sample_bundle_goal_bias(ancestors);
        let neighbors = graph.nearest_k(&x_random, self.config.nearest_k);
        let space = graph.bundle().clone();

        let mut v_next = None;
        for q in neighbors {
            let next = match v_next {
                None => {
                    let x_neighbor = graph.state(q).clone();
                    if !graph.check_motion(&x_neighbor, &x_random) {
                        continue;
                    }
                    truncate_to_range(space.space(), &x_neighbor, &mut x_random, graph.max_distance());
                    let v = graph.add_configuration(x_random.clone());
                    v_next = Some(v);
                    v
                }
                Some(v) => {
                    if !self.config.connect_all_feasible {
                        break;
                    }
                    // the new vertex may have been truncated towards the first neighbour
                    if !graph.check_motion(graph.state(q), graph.state(v)) {
                        continue;
                    }
                    v
                }
            };
            if !graph.has_solution() {
                graph.add_edge(q, next);
                check_goal_and_wire(graph, next);
            }
        }
    }
}
