//! A level of the hierarchy: a bundle space graph driven by a growth strategy

use std::fmt;

use log::debug;

use crate::common::error::{PlanningError, PlanningResult};
use crate::common::traits::GoalState;
use crate::common::types::{State, StatePath};
use crate::multilevel::algorithms::GrowthStrategy;
use crate::multilevel::bundle_space_graph::BundleSpaceGraph;
use crate::multilevel::path_restriction::PathRestriction;

/// Vertex and edge counts of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    pub level: usize,
    pub vertices: usize,
    pub edges: usize,
    pub sparse_vertices: usize,
    pub sparse_edges: usize,
    pub solved: bool,
}

pub struct BundleLevel {
    graph: BundleSpaceGraph,
    strategy: Box<dyn GrowthStrategy>,
}

impl BundleLevel {
    pub fn new(graph: BundleSpaceGraph, strategy: Box<dyn GrowthStrategy>) -> Self {
        BundleLevel { graph, strategy }
    }

    pub fn graph(&self) -> &BundleSpaceGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut BundleSpaceGraph {
        &mut self.graph
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn level(&self) -> usize {
        self.graph.space().level()
    }

    pub fn set_problem(&mut self, start: State, goal: GoalState) {
        self.graph.set_problem(start, goal);
    }

    pub fn setup(&mut self) {
        self.graph.setup();
    }

    pub fn set_range(&mut self, range: f64) -> PlanningResult<()> {
        self.graph.set_range(range)
    }

    pub fn set_goal_bias(&mut self, goal_bias: f64) -> PlanningResult<()> {
        self.graph.set_goal_bias(goal_bias)
    }

    /// Levels are only grown through a sequence
    pub fn solve(&mut self) -> PlanningResult<()> {
        Err(PlanningError::UnsupportedOperation(format!(
            "{} cannot be solved on its own, grow it through a BundleSpaceSequence",
            self.graph.space()
        )))
    }

    /// One increment of graph construction. `ancestors` are the coarser
    /// levels, root first.
    pub fn grow(&mut self, ancestors: &mut [BundleLevel]) {
        if self.graph.is_first_run() {
            if !self.graph.init() {
                return;
            }
            self.strategy.init(&mut self.graph);
            if let Some((parent, _)) = ancestors.split_last_mut() {
                self.lift_parent_solution(parent);
            }
        }
        self.strategy.grow(&mut self.graph, ancestors);
        self.graph.update_sparse();
    }

    /// Tries to follow the parent's solution path directly in this level
    fn lift_parent_solution(&mut self, parent: &mut BundleLevel) {
        let base_path = match parent.get_solution() {
            Some(path) => path,
            None => return,
        };
        let restriction = PathRestriction::new(base_path, parent.graph.space().bundle_space());
        if restriction.lift(&mut self.graph, parent.graph.sampler_mut()) {
            debug!("{}: lifted the parent solution path", self.graph.space());
        }
        self.graph.update_sparse();
    }

    /// Base sample for the next finer level
    pub fn sample_base(&mut self, ancestors: &mut [BundleLevel]) -> State {
        if self.graph.is_empty() {
            return self.graph.sample_bundle(ancestors);
        }
        self.strategy.sample_base(&mut self.graph)
    }

    pub fn has_solution(&mut self) -> bool {
        self.graph.has_solution()
    }

    pub fn get_solution(&mut self) -> Option<StatePath> {
        self.graph.get_solution()
    }

    pub fn importance(&self) -> f64 {
        self.graph.importance()
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.strategy.clear();
    }

    pub fn stats(&mut self) -> LevelStats {
        let (sparse_vertices, sparse_edges) = self
            .graph
            .sparse()
            .map_or((0, 0), |s| (s.num_vertices(), s.num_edges()));
        LevelStats {
            level: self.level(),
            vertices: self.graph.num_vertices(),
            edges: self.graph.num_edges(),
            sparse_vertices,
            sparse_edges,
            solved: self.graph.has_solution(),
        }
    }
}

impl fmt::Display for BundleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.strategy.name(), self.graph.space())
    }
}

impl fmt::Debug for BundleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleLevel")
            .field("space", self.graph.space())
            .field("strategy", &self.strategy)
            .field("vertices", &self.graph.num_vertices())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::multilevel::algorithms::PlannerKind;
    use crate::multilevel::bundle_space::BundleSpace;
    use crate::multilevel::bundle_space_graph::BundleSpaceGraphConfig;
    use crate::space::{RealVectorBounds, SpaceInformation, StateSpace};

    fn rn(n: usize) -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(n, 0.0, 1.0))
    }

    fn level(level: usize, bundle: StateSpace, base: Option<StateSpace>, kind: PlannerKind) -> BundleLevel {
        let si = Rc::new(SpaceInformation::unconstrained(bundle));
        let base = base.map(|b| Rc::new(SpaceInformation::unconstrained(b)));
        let space = BundleSpace::new(level, level, si, base, 100 + level as u64).unwrap();
        let graph = BundleSpaceGraph::new(space, BundleSpaceGraphConfig::default()).unwrap();
        BundleLevel::new(graph, kind.build())
    }

    /// Parent whose roadmap holds the single state `x`
    fn single_vertex_parent(x: &State) -> BundleLevel {
        let mut parent = level(0, rn(x.len()), None, PlannerKind::Qrrt);
        parent.graph_mut().add_configuration(x.clone());
        parent
    }

    #[test]
    fn test_solve_is_unsupported() {
        let mut l = level(0, rn(2), None, PlannerKind::Qmp);
        assert!(matches!(l.solve(), Err(PlanningError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_setters_validate() {
        let mut l = level(0, rn(2), None, PlannerKind::Qrrt);
        assert!(matches!(l.set_goal_bias(2.0), Err(PlanningError::InvalidParameter(_))));
        assert!(matches!(l.set_range(f64::NAN), Err(PlanningError::InvalidParameter(_))));
        assert!(l.set_goal_bias(0.3).is_ok());
        assert_eq!(l.graph().goal_bias(), 0.3);
    }

    #[test]
    fn test_grow_without_problem_does_nothing() {
        let mut l = level(0, rn(2), None, PlannerKind::Qrrt);
        l.grow(&mut []);
        assert_eq!(l.graph().num_vertices(), 0);
        assert!(!l.has_solution());
    }

    #[test]
    fn test_identity_fiber_sample_is_parent_sample() {
        let x = State::from_vec(vec![0.3, 0.7]);
        let mut ancestors = vec![single_vertex_parent(&x)];
        let mut child = level(1, rn(2), Some(rn(2)), PlannerKind::Qrrt);
        assert_eq!(child.graph().space().fiber_dimension(), 0);
        for _ in 0..5 {
            let sample = child.graph_mut().sample_bundle(&mut ancestors);
            assert_eq!(sample, x);
        }
    }

    #[test]
    fn test_line_to_square_sample_projects_to_parent_sample() {
        let x = State::from_vec(vec![0.42]);
        let mut ancestors = vec![single_vertex_parent(&x)];
        let mut child = level(1, rn(2), Some(rn(1)), PlannerKind::Qrrt);
        assert_eq!(child.graph().space().fiber_dimension(), 1);
        let sample = child.graph_mut().sample_bundle(&mut ancestors);
        let mut base = child.graph().space().alloc_base_state().unwrap();
        child.graph().space().project_base(&sample, &mut base);
        assert_eq!(base, x);
        assert!((0.0..=1.0).contains(&sample[1]));
    }

    #[test]
    fn test_stats_and_display() {
        let mut l = level(0, rn(2), None, PlannerKind::Qrrt);
        l.graph_mut().add_configuration(State::from_vec(vec![0.5, 0.5]));
        let stats = l.stats();
        assert_eq!(stats.vertices, 1);
        assert_eq!(stats.edges, 0);
        assert!(!stats.solved);
        assert!(l.to_string().starts_with("QRRT [Level 0"));
    }
}
