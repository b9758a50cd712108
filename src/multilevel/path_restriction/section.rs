//! L1 interpolation of a lifted path section and its validation

use log::trace;

use super::head::BasePathHead;
use super::PathRestriction;
use crate::common::types::State;
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::space::MotionCheck;

/// Bundle states from the head to the target, each tagged with the arc
/// length of its base projection
#[derive(Debug, Clone, Default)]
pub struct PathSection {
    states: Vec<State>,
    locations: Vec<f64>,
}

impl PathSection {
    fn push(&mut self, state: State, location: f64) {
        if self.states.last() == Some(&state) {
            return;
        }
        self.states.push(state);
        self.locations.push(location);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    /// Move the fiber to the target fiber at the head's base position,
    /// then follow the base path
    pub fn interpolate_fiber_first(
        restriction: &PathRestriction,
        graph: &BundleSpaceGraph,
        head: &BasePathHead,
    ) -> Self {
        let space = graph.space();
        let fiber_target = fiber_of(graph, head.target());
        let mut section = PathSection::default();
        let mut x = space.bundle_space().alloc_state();

        let base = restriction.interpolate_base_path(head.location());
        space.lift_state(&base, &fiber_target, &mut x);
        if &x != head.state() {
            section.push(x.clone(), head.location());
        }

        let states = &restriction.base_path().states;
        for i in restriction.first_index_after(head.location())..states.len().saturating_sub(1) {
            space.lift_state(&states[i], &fiber_target, &mut x);
            section.push(x.clone(), restriction.location_of(i));
        }
        section.push(head.target().clone(), restriction.length());
        section
    }

    /// Follow the base path with the head's fiber, then move the fiber to
    /// the target fiber at the end of the base path
    pub fn interpolate_fiber_last(
        restriction: &PathRestriction,
        graph: &BundleSpaceGraph,
        head: &BasePathHead,
    ) -> Self {
        let space = graph.space();
        let fiber_current = fiber_of(graph, head.state());
        let mut section = PathSection::default();
        let mut x = space.bundle_space().alloc_state();

        let states = &restriction.base_path().states;
        for i in restriction.first_index_after(head.location())..states.len() {
            space.lift_state(&states[i], &fiber_current, &mut x);
            section.push(x.clone(), restriction.location_of(i));
        }
        section.push(head.target().clone(), restriction.length());
        section
    }

    /// Validates the section from the head onwards. Valid states are added to
    /// the graph as they are reached and the head follows them. On a
    /// collision the head stops at the last valid state and `false` is
    /// returned.
    pub fn check_motion(&self, graph: &mut BundleSpaceGraph, head: &mut BasePathHead) -> bool {
        let si = graph.bundle().clone();
        let last = self.states.len().saturating_sub(1);

        for (i, (x, &location)) in self.states.iter().zip(&self.locations).enumerate() {
            match si.check_motion_partial(head.state(), x) {
                MotionCheck::Valid => {
                    let v = if i == last {
                        match graph.goal_vertex().or_else(|| graph.add_goal_configuration()) {
                            Some(g) => g,
                            None => return false,
                        }
                    } else {
                        graph.add_configuration(x.clone())
                    };
                    graph.add_edge(head.vertex(), v);
                    head.set_current(v, x.clone(), location);
                }
                MotionCheck::Blocked {
                    last_valid,
                    fraction,
                } => {
                    if fraction > 0.0 {
                        let reached = head.location() + fraction * (location - head.location());
                        let v = graph.add_configuration(last_valid.clone());
                        graph.add_edge(head.vertex(), v);
                        head.set_current(v, last_valid, reached);
                    }
                    trace!("Section blocked at base location {}", head.location());
                    return false;
                }
            }
        }
        true
    }
}

fn fiber_of(graph: &BundleSpaceGraph, x: &State) -> State {
    let space = graph.space();
    let mut fiber = space
        .alloc_fiber_state()
        .unwrap_or_else(|| State::zeros(0));
    space.project_fiber(x, &mut fiber);
    fiber
}
