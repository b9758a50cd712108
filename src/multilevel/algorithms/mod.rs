//! Growth strategies: one `grow()` call is one increment of graph
//! construction on a single level.

pub mod qmp;
pub mod qmp_star;
pub mod qrrt;

use std::fmt;

pub use qmp::{Qmp, QmpConfig};
pub use qmp_star::{milestone_k, QmpStar, QmpStarConfig};
pub use qrrt::Qrrt;

use crate::common::types::State;
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::level::BundleLevel;
use crate::space::StateSpace;

pub trait GrowthStrategy: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Called once after the start vertex has been inserted
    fn init(&mut self, _graph: &mut BundleSpaceGraph) {}

    /// One increment. `ancestors` are the coarser levels, root first.
    /// Invalid samples and blocked motions are dropped silently.
    fn grow(&mut self, graph: &mut BundleSpaceGraph, ancestors: &mut [BundleLevel]);

    /// State handed to the next finer level as its base sample
    fn sample_base(&mut self, graph: &mut BundleSpaceGraph) -> State {
        graph.sample_from_datastructure()
    }

    fn clear(&mut self) {}
}

/// Pulls `to` back onto the segment from `from` so that it lies at most
/// `max_distance` away
pub fn truncate_to_range(space: &StateSpace, from: &State, to: &mut State, max_distance: f64) {
    let d = space.distance(from, to);
    if d > max_distance && d > 0.0 {
        *to = space.interpolate(from, to, max_distance / d);
    }
}

/// Joins `v` to the goal vertex if `v` satisfies the goal and the motion to
/// the exact goal state is free. Inserts the goal vertex on first use.
pub fn check_goal_and_wire(graph: &mut BundleSpaceGraph, v: usize) -> bool {
    if !graph.is_goal_satisfied(graph.state(v)) {
        return false;
    }
    let goal = match graph.problem() {
        Some(p) => p.goal.state().clone(),
        None => return false,
    };
    if !graph.check_motion(graph.state(v), &goal) {
        return false;
    }
    let v_goal = match graph.goal_vertex() {
        Some(g) => g,
        None => match graph.add_goal_configuration() {
            Some(g) => g,
            None => return false,
        },
    };
    graph.add_edge(v, v_goal);
    graph.mark_solved();
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerKind {
    Qrrt,
    Qmp,
    QmpStar,
}

impl PlannerKind {
    pub fn build(self) -> Box<dyn GrowthStrategy> {
        match self {
            PlannerKind::Qrrt => Box::new(Qrrt::new()),
            PlannerKind::Qmp => Box::new(Qmp::new(QmpConfig::default())),
            PlannerKind::QmpStar => Box::new(QmpStar::new(QmpStarConfig::default())),
        }
    }
}

impl fmt::Display for PlannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlannerKind::Qrrt => "QRRT",
            PlannerKind::Qmp => "QMP",
            PlannerKind::QmpStar => "QMPStar",
        };
        write!(f, "{}", name)
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::space::SpaceInformation;

    #[test]
    fn test_truncate_to_range() {
        let space = unit_square();
        let from = State::from_vec(vec![0.0, 0.0]);
        let mut to = State::from_vec(vec![1.0, 0.0]);
        truncate_to_range(&space, &from, &mut to, 0.25);
        assert!((to[0] - 0.25).abs() < 1e-12);
        let mut near = State::from_vec(vec![0.1, 0.0]);
        truncate_to_range(&space, &from, &mut near, 0.25);
        assert_eq!(near, State::from_vec(vec![0.1, 0.0]));
    }

    #[test]
    fn test_goal_wiring() {
        let mut graph = corner_graph(SpaceInformation::unconstrained(unit_square()), 1);
        graph.init();
        let far = graph.add_configuration(State::from_vec(vec![0.5, 0.5]));
        assert!(!check_goal_and_wire(&mut graph, far));
        assert!(graph.goal_vertex().is_none());

        let start = graph.start_vertex().unwrap();
        let close = graph.add_configuration(State::from_vec(vec![0.93, 0.95]));
        graph.add_edge(start, close);
        assert!(check_goal_and_wire(&mut graph, close));
        assert!(graph.has_solution());
        assert_eq!(graph.get_solution().unwrap().len(), 3);
    }
}
