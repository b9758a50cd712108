//! Path restriction: lifting a solved base path into the bundle space.
//!
//! The bundle path is searched only over the restriction of the bundle to
//! the base path, so every state of a lifted section projects onto the base
//! path. Sections are interpolated in L1 fashion (fiber first or fiber last)
//! and blocked sections are repaired by [`FindSectionSideStep`].

pub mod head;
pub mod section;
pub mod side_step;

use itertools::Itertools;
use log::debug;

pub use head::BasePathHead;
pub use section::PathSection;
pub use side_step::{
    find_feasible_state_on_fiber, FindSectionSideStep, PATH_SECTION_TREE_MAX_BRANCHING,
    PATH_SECTION_TREE_MAX_DEPTH,
};

use crate::common::types::{State, StatePath};
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::sampler::GraphSampler;
use crate::space::StateSpace;

#[derive(Debug, Clone)]
pub struct PathRestriction {
    base_path: StatePath,
    base_space: StateSpace,
    /// Arc length at each base path vertex, starting at 0
    cumulative: Vec<f64>,
}

impl PathRestriction {
    pub fn new(base_path: StatePath, base_space: &StateSpace) -> Self {
        let mut cumulative = Vec::with_capacity(base_path.len());
        if !base_path.is_empty() {
            cumulative.push(0.0);
        }
        let mut total = 0.0;
        for (a, b) in base_path.states.iter().tuple_windows() {
            total += base_space.distance(a, b);
            cumulative.push(total);
        }
        PathRestriction {
            base_path,
            base_space: base_space.clone(),
            cumulative,
        }
    }

    pub fn base_path(&self) -> &StatePath {
        &self.base_path
    }

    /// Total arc length of the base path
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn location_of(&self, index: usize) -> f64 {
        self.cumulative[index]
    }

    /// Index of the first base path vertex strictly beyond `location`
    pub fn first_index_after(&self, location: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&l| l > location)
            .unwrap_or(self.cumulative.len())
    }

    /// Base state at arc length `location`, clamped to the path ends
    pub fn interpolate_base_path(&self, location: f64) -> State {
        let states = &self.base_path.states;
        let i = self.first_index_after(location);
        if i == 0 {
            return states[0].clone();
        }
        if i >= states.len() {
            return states[states.len() - 1].clone();
        }
        let (l0, l1) = (self.cumulative[i - 1], self.cumulative[i]);
        let t = if l1 > l0 { (location - l0) / (l1 - l0) } else { 0.0 };
        self.base_space.interpolate(&states[i - 1], &states[i], t)
    }

    /// Lift the base path into `graph`, from its start vertex to its goal.
    /// Returns true when start and goal end up connected.
    pub fn lift(&self, graph: &mut BundleSpaceGraph, base_sampler: &mut GraphSampler) -> bool {
        if self.base_path.len() < 2 {
            return false;
        }
        let (v_start, target) = match (graph.start_vertex(), graph.problem()) {
            (Some(v), Some(p)) => (v, p.goal.state().clone()),
            _ => return false,
        };
        let mut head = BasePathHead::new(v_start, graph.state(v_start).clone(), target);
        let found = FindSectionSideStep::new(self, base_sampler).solve(graph, &mut head);
        debug!(
            "Path restriction over {} base states: {}",
            self.base_path.len(),
            if found { "feasible section" } else { "no section" }
        );
        found && graph.has_solution()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::common::traits::GoalState;
    use crate::multilevel::bundle_space::BundleSpace;
    use crate::multilevel::bundle_space_graph::BundleSpaceGraphConfig;
    use crate::multilevel::sampler::GraphSamplerConfig;
    use crate::space::{BoxObstacle, BoxObstacleChecker, RealVectorBounds, SpaceInformation};

    fn line() -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(1, 0.0, 1.0))
    }

    fn square() -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0))
    }

    fn base_path() -> StatePath {
        StatePath::from_states(vec![
            State::from_vec(vec![0.1]),
            State::from_vec(vec![0.5]),
            State::from_vec(vec![0.9]),
        ])
    }

    /// Square over the unit line with start (0.1, 0.5) and goal (0.9, 0.5)
    fn lifted_graph(si: SpaceInformation) -> BundleSpaceGraph {
        let base = Rc::new(SpaceInformation::unconstrained(line()));
        let space = BundleSpace::new(1, 1, Rc::new(si), Some(base), 5).unwrap();
        let mut graph = BundleSpaceGraph::new(space, BundleSpaceGraphConfig::default()).unwrap();
        graph.set_problem(
            State::from_vec(vec![0.1, 0.5]),
            GoalState::new(square(), State::from_vec(vec![0.9, 0.5]), 0.01),
        );
        graph.init();
        graph
    }

    fn base_sampler() -> GraphSampler {
        GraphSampler::new(GraphSamplerConfig::default(), &line(), None).unwrap()
    }

    #[test]
    fn test_interpolate_base_path() {
        let r = PathRestriction::new(base_path(), &line());
        assert!((r.length() - 0.8).abs() < 1e-12);
        assert_eq!(r.first_index_after(0.0), 1);
        assert_eq!(r.first_index_after(r.length()), 3);
        assert!((r.interpolate_base_path(0.2)[0] - 0.3).abs() < 1e-12);
        assert_eq!(r.interpolate_base_path(-1.0), State::from_vec(vec![0.1]));
        assert_eq!(r.interpolate_base_path(5.0), State::from_vec(vec![0.9]));
    }

    #[test]
    fn test_free_lift_connects_start_and_goal() {
        let mut graph = lifted_graph(SpaceInformation::unconstrained(square()));
        let restriction = PathRestriction::new(base_path(), &line());
        let mut sampler = base_sampler();
        assert!(restriction.lift(&mut graph, &mut sampler));
        assert!(graph.has_solution());
        let path = graph.get_solution().unwrap();
        assert_eq!(path.last(), Some(&State::from_vec(vec![0.9, 0.5])));
        for x in &path.states {
            assert!((x[1] - 0.5).abs() < 1e-12);
        }
        assert_eq!(sampler.path_bias_start_segment(), 0.0);
    }

    #[test]
    fn test_side_step_around_obstacle() {
        // box on the straight lift, free above it
        let obstacle = BoxObstacle::new(vec![0.45, 0.3], vec![0.55, 0.7]);
        let si = SpaceInformation::with_checker(square(), BoxObstacleChecker::new(vec![obstacle]));
        let mut graph = lifted_graph(si);
        let restriction = PathRestriction::new(base_path(), &line());
        let mut sampler = base_sampler();
        let lifted = restriction.lift(&mut graph, &mut sampler);
        // the blocked location is reported to the base sampler either way
        assert!(sampler.path_bias_start_segment() > 0.3);
        if lifted {
            let path = graph.get_solution().unwrap();
            let checker = graph.bundle().clone();
            for w in path.states.windows(2) {
                assert!(checker.check_motion(&w[0], &w[1]));
            }
        }
    }

    #[test]
    fn test_section_interpolation_orders() {
        let graph = lifted_graph(SpaceInformation::unconstrained(square()));
        let restriction = PathRestriction::new(base_path(), &line());
        let head = BasePathHead::new(0, State::from_vec(vec![0.1, 0.2]), State::from_vec(vec![0.9, 0.8]));

        let first = PathSection::interpolate_fiber_first(&restriction, &graph, &head);
        assert_eq!(first.states()[0], State::from_vec(vec![0.1, 0.8]));
        assert_eq!(first.states()[1], State::from_vec(vec![0.5, 0.8]));
        assert_eq!(first.states().last(), Some(&State::from_vec(vec![0.9, 0.8])));

        let last = PathSection::interpolate_fiber_last(&restriction, &graph, &head);
        assert_eq!(last.states()[0], State::from_vec(vec![0.5, 0.2]));
        assert_eq!(last.states()[1], State::from_vec(vec![0.9, 0.2]));
        assert_eq!(last.states()[2], State::from_vec(vec![0.9, 0.8]));
        let locations = last.locations();
        assert_relative_eq!(locations[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(locations[1], restriction.length());
        assert_relative_eq!(locations[2], restriction.length());
    }
}
