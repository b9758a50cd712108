//! Bounded recursive search around blocked sections

use log::trace;

use super::head::BasePathHead;
use super::section::PathSection;
use super::PathRestriction;
use crate::common::types::State;
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::sampler::GraphSampler;

pub const PATH_SECTION_TREE_MAX_DEPTH: usize = 3;
pub const PATH_SECTION_TREE_MAX_BRANCHING: usize = 10;
/// Fiber samples drawn per side step before the branch is given up
pub const FIBER_SAMPLING_ATTEMPTS: usize = 10;

/// Side-stepping section finder. When a section is blocked, tries fiber
/// states over the blocked base location and restarts the section from each
/// of them with the interpolation order flipped.
pub struct FindSectionSideStep<'a> {
    restriction: &'a PathRestriction,
    base_sampler: &'a mut GraphSampler,
}

impl<'a> FindSectionSideStep<'a> {
    /// `base_sampler` is the sampler of the level that owns the base path;
    /// blocked locations move its path bias window forward.
    pub fn new(restriction: &'a PathRestriction, base_sampler: &'a mut GraphSampler) -> Self {
        FindSectionSideStep {
            restriction,
            base_sampler,
        }
    }

    /// Fiber first from the head, then fiber last from the starting head
    pub fn solve(&mut self, graph: &mut BundleSpaceGraph, head: &mut BasePathHead) -> bool {
        let start = head.clone();
        if self.recursive_side_step(graph, head, true, 0) {
            return true;
        }
        *head = start;
        self.recursive_side_step(graph, head, false, 0)
    }

    fn recursive_side_step(
        &mut self,
        graph: &mut BundleSpaceGraph,
        head: &mut BasePathHead,
        interpolate_fiber_first: bool,
        depth: usize,
    ) -> bool {
        let section = if interpolate_fiber_first {
            PathSection::interpolate_fiber_first(self.restriction, graph, head)
        } else {
            PathSection::interpolate_fiber_last(self.restriction, graph, head)
        };
        if section.check_motion(graph, head) {
            return true;
        }

        self.base_sampler.set_path_bias_start_segment(head.location());

        if depth + 1 >= PATH_SECTION_TREE_MAX_DEPTH {
            return false;
        }

        let location = head.location();
        let x_base = self.restriction.interpolate_base_path(location);

        for _ in 0..PATH_SECTION_TREE_MAX_BRANCHING {
            let x_side_step = match find_feasible_state_on_fiber(graph, &x_base) {
                Some(x) => x,
                None => continue,
            };
            if !graph.check_motion(head.state(), &x_side_step) {
                continue;
            }
            let v = graph.add_configuration(x_side_step.clone());
            graph.add_edge(head.vertex(), v);

            let mut next = head.clone();
            next.set_current(v, x_side_step, location);
            trace!("Side step at base location {} (depth {})", location, depth + 1);
            if self.recursive_side_step(graph, &mut next, !interpolate_fiber_first, depth + 1) {
                *head = next;
                return true;
            }
        }
        false
    }
}

/// Valid bundle state over `x_base` with a random fiber
pub fn find_feasible_state_on_fiber(graph: &mut BundleSpaceGraph, x_base: &State) -> Option<State> {
    let mut x = graph.space().bundle_space().identity_state();
    for _ in 0..FIBER_SAMPLING_ATTEMPTS {
        graph.space_mut().lift_from_base(x_base, &mut x);
        if graph.space().is_valid(&x) {
            return Some(x);
        }
    }
    None
}
