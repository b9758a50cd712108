//! Roadmap over the Bundle space of one level.
//!
//! Holds the dense graph of configurations, the nearest neighbour index, the
//! union-find used to decide whether start and goal are connected, the cached
//! start-goal path, the graph sampler that feeds the next finer level, and
//! optionally the sparse spanner.

use std::rc::Rc;

use log::{info, trace, warn};
use rand::Rng;

use crate::common::error::{PlanningError, PlanningResult};
use crate::common::traits::{Goal, GoalState};
use crate::common::types::{State, StatePath};
use crate::multilevel::bundle_space::BundleSpace;
use crate::multilevel::graph::{astar, Configuration, DisjointSets, Roadmap, SparseGraph, SparseGraphConfig};
use crate::multilevel::level::BundleLevel;
use crate::multilevel::sampler::{GraphSampler, GraphSamplerConfig};
use crate::nearest::{NearestNeighbors, NearestNeighborsLinear};
use crate::space::SpaceInformation;

/// Share of the maximum extent used as step size when `range` is 0
const DEFAULT_RANGE_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct BundleSpaceGraphConfig {
    /// Maximum step length; 0 selects a fraction of the space extent
    pub range: f64,
    /// Probability of sampling the goal while unsolved
    pub goal_bias: f64,
    pub graph_sampler: GraphSamplerConfig,
    /// Maintain a sparse spanner next to the dense roadmap
    pub sparse: Option<SparseGraphConfig>,
    pub seed: u64,
}

impl Default for BundleSpaceGraphConfig {
    fn default() -> Self {
        Self {
            range: 0.0,
            goal_bias: 0.1,
            graph_sampler: GraphSamplerConfig::default(),
            sparse: None,
            seed: 0,
        }
    }
}

impl BundleSpaceGraphConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        validate_goal_bias(self.goal_bias)?;
        validate_range(self.range)
    }
}

pub(crate) fn validate_goal_bias(goal_bias: f64) -> PlanningResult<()> {
    if !(0.0..=1.0).contains(&goal_bias) {
        return Err(PlanningError::InvalidParameter(format!(
            "goal bias must be in [0, 1], got {}",
            goal_bias
        )));
    }
    Ok(())
}

pub(crate) fn validate_range(range: f64) -> PlanningResult<()> {
    if !range.is_finite() || range < 0.0 {
        return Err(PlanningError::InvalidParameter(format!(
            "range must be finite and >= 0, got {}",
            range
        )));
    }
    Ok(())
}

/// Start state and goal region of one level
#[derive(Debug, Clone)]
pub struct Problem {
    pub start: State,
    pub goal: GoalState,
}

/// Cached shortest start-goal path
#[derive(Debug, Clone)]
struct Solution {
    vertices: Vec<usize>,
    path: StatePath,
    length: f64,
}

pub struct BundleSpaceGraph {
    space: BundleSpace,
    config: BundleSpaceGraphConfig,
    max_distance: f64,
    graph: Roadmap,
    nn: NearestNeighborsLinear,
    components: DisjointSets,
    sampler: GraphSampler,
    sparse: Option<SparseGraph>,
    pending_sparse: Vec<usize>,
    /// Endpoints of dense edges added since the last sparse update
    pending_touched: Vec<usize>,
    problem: Option<Problem>,
    v_start: Option<usize>,
    v_goal: Option<usize>,
    has_solution: bool,
    solution: Option<Solution>,
    solution_dirty: bool,
    first_run: bool,
}

impl BundleSpaceGraph {
    pub fn new(space: BundleSpace, config: BundleSpaceGraphConfig) -> PlanningResult<Self> {
        config.validate()?;
        let bundle = space.bundle_space().clone();
        let sparse = match &config.sparse {
            Some(c) => Some(SparseGraph::new(c.clone(), &bundle)?),
            None => None,
        };
        let sampler = GraphSampler::new(
            config.graph_sampler.clone(),
            &bundle,
            sparse.as_ref().map(|s| s.sparse_delta()),
        )?;
        let mut graph = BundleSpaceGraph {
            space,
            max_distance: 0.0,
            graph: Roadmap::new(),
            nn: NearestNeighborsLinear::new(bundle),
            components: DisjointSets::new(),
            sampler,
            sparse,
            pending_sparse: Vec::new(),
            pending_touched: Vec::new(),
            problem: None,
            v_start: None,
            v_goal: None,
            has_solution: false,
            solution: None,
            solution_dirty: false,
            first_run: true,
            config,
        };
        graph.setup();
        Ok(graph)
    }

    /// Resolve the step size from the configured range
    pub fn setup(&mut self) {
        self.max_distance = if self.config.range > 0.0 {
            self.config.range
        } else {
            DEFAULT_RANGE_FRACTION * self.space.bundle_space().maximum_extent()
        };
    }

    /// Drop all vertices and edges and return to the uninitialised state
    pub fn clear(&mut self) {
        self.graph.clear();
        self.nn.clear();
        self.components.clear();
        self.sampler.reset();
        if let Some(sparse) = &mut self.sparse {
            sparse.clear();
        }
        self.pending_sparse.clear();
        self.pending_touched.clear();
        self.v_start = None;
        self.v_goal = None;
        self.has_solution = false;
        self.solution = None;
        self.solution_dirty = false;
        self.first_run = true;
    }

    pub fn space(&self) -> &BundleSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut BundleSpace {
        &mut self.space
    }

    pub fn bundle(&self) -> &Rc<SpaceInformation> {
        self.space.bundle()
    }

    pub fn rng_mut(&mut self) -> &mut rand::rngs::StdRng {
        self.space.rng_mut()
    }

    pub fn config(&self) -> &BundleSpaceGraphConfig {
        &self.config
    }

    pub fn range(&self) -> f64 {
        self.config.range
    }

    pub fn set_range(&mut self, range: f64) -> PlanningResult<()> {
        validate_range(range)?;
        self.config.range = range;
        self.setup();
        Ok(())
    }

    /// Effective step size
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn goal_bias(&self) -> f64 {
        self.config.goal_bias
    }

    pub fn set_goal_bias(&mut self, goal_bias: f64) -> PlanningResult<()> {
        validate_goal_bias(goal_bias)?;
        self.config.goal_bias = goal_bias;
        Ok(())
    }

    pub fn set_problem(&mut self, start: State, goal: GoalState) {
        self.problem = Some(Problem { start, goal });
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.graph
    }

    pub fn sampler(&self) -> &GraphSampler {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut GraphSampler {
        &mut self.sampler
    }

    pub fn sparse(&self) -> Option<&SparseGraph> {
        self.sparse.as_ref()
    }

    pub fn sparse_mut(&mut self) -> Option<&mut SparseGraph> {
        self.sparse.as_mut()
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn start_vertex(&self) -> Option<usize> {
        self.v_start
    }

    pub fn goal_vertex(&self) -> Option<usize> {
        self.v_goal
    }

    pub fn state(&self, v: usize) -> &State {
        self.graph.state(v)
    }

    pub fn vertex_mut(&mut self, v: usize) -> &mut Configuration {
        self.graph.vertex_mut(v)
    }

    /// Insert the start vertex. Returns false when no problem is set.
    pub fn init(&mut self) -> bool {
        let start = match &self.problem {
            Some(p) => p.start.clone(),
            None => {
                warn!("{}: grown without a problem definition", self.space);
                return false;
            }
        };
        self.first_run = false;
        let v = self.add_configuration(start);
        self.graph.vertex_mut(v).is_start = true;
        self.v_start = Some(v);
        true
    }

    pub fn add_configuration(&mut self, state: State) -> usize {
        let v = self.graph.add_vertex(Configuration::new(state.clone()));
        self.nn.add(v, state);
        self.components.make_set();
        if self.sparse.is_some() {
            self.pending_sparse.push(v);
        }
        v
    }

    /// Insert a copy of the goal state as the goal vertex
    pub fn add_goal_configuration(&mut self) -> Option<usize> {
        let goal = self.problem.as_ref()?.goal.state().clone();
        let v = self.add_configuration(goal);
        self.graph.vertex_mut(v).is_goal = true;
        self.v_goal = Some(v);
        Some(v)
    }

    /// Edge weighted by bundle distance. The motion must already be checked.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        let w = self.space.bundle().distance(self.graph.state(a), self.graph.state(b));
        if self.graph.add_edge(a, b, w) {
            self.components.union(a, b);
            self.solution_dirty = true;
            if self.sparse.is_some() {
                self.pending_touched.push(a);
                self.pending_touched.push(b);
            }
            true
        } else {
            false
        }
    }

    pub fn same_component(&mut self, a: usize, b: usize) -> bool {
        self.components.same_component(a, b)
    }

    pub fn nearest(&self, state: &State) -> Option<usize> {
        self.nn.nearest(state)
    }

    pub fn nearest_k(&self, state: &State, k: usize) -> Vec<usize> {
        self.nn.nearest_k(state, k)
    }

    pub fn check_motion(&self, a: &State, b: &State) -> bool {
        self.space.bundle().check_motion(a, b)
    }

    pub fn is_goal_satisfied(&self, state: &State) -> bool {
        self.problem
            .as_ref()
            .map_or(false, |p| p.goal.is_satisfied(state))
    }

    /// Records that the level is solved. Never reverts until `clear`.
    pub fn mark_solved(&mut self) {
        if !self.has_solution {
            info!(
                "{} found a solution with {} vertices",
                self.space,
                self.graph.num_vertices()
            );
        }
        self.has_solution = true;
    }

    /// Start and goal vertices share a component. Checked lazily, cached
    /// once true.
    pub fn has_solution(&mut self) -> bool {
        if !self.has_solution {
            if let (Some(s), Some(g)) = (self.v_start, self.v_goal) {
                if self.components.same_component(s, g) {
                    self.mark_solved();
                }
            }
        }
        self.has_solution
    }

    fn update_solution(&mut self) -> bool {
        if !self.has_solution() {
            return false;
        }
        if self.solution.is_some() && !self.solution_dirty {
            return true;
        }
        let (start, goal) = match (self.v_start, self.v_goal) {
            (Some(s), Some(g)) => (s, g),
            _ => return false,
        };
        let space = self.space.bundle_space();
        let goal_state = self.graph.state(goal).clone();
        let graph = &self.graph;
        let found = astar(graph, start, goal, |v| space.distance(graph.state(v), &goal_state));
        match found {
            Some((vertices, length)) => {
                let path = StatePath::from_states(
                    vertices.iter().map(|&v| self.graph.state(v).clone()).collect(),
                );
                trace!("{}: solution with {} vertices, length {}", self.space, vertices.len(), length);
                self.solution = Some(Solution {
                    vertices,
                    path,
                    length,
                });
                self.solution_dirty = false;
                true
            }
            None => false,
        }
    }

    /// Shortest start-goal path of the roadmap, if the level is solved. With
    /// a sparse graph the path runs through the spanner whenever the spanner
    /// connects both ends.
    pub fn get_solution(&mut self) -> Option<StatePath> {
        if !self.update_solution() {
            return None;
        }
        if let (Some(sparse), Some(start), Some(goal)) = (&self.sparse, self.v_start, self.v_goal) {
            if let Some((path, length)) = sparse.get_solution(&self.graph, start, goal) {
                trace!("{}: sparse solution with {} states, length {}", self.space, path.len(), length);
                return Some(path);
            }
        }
        self.solution.as_ref().map(|s| s.path.clone())
    }

    /// Cached solution path without recomputation
    pub fn solution_path(&self) -> Option<&StatePath> {
        self.solution.as_ref().map(|s| &s.path)
    }

    pub fn solution_vertices(&self) -> Option<&[usize]> {
        self.solution.as_ref().map(|s| s.vertices.as_slice())
    }

    pub fn solution_length(&self) -> Option<f64> {
        self.solution.as_ref().map(|s| s.length)
    }

    pub fn importance(&self) -> f64 {
        self.space.importance(self.graph.num_vertices())
    }

    /// Bundle state without validity check: uniform at the root, otherwise
    /// a fiber sample lifted over a base sample drawn from the parent.
    pub fn sample_bundle(&mut self, ancestors: &mut [BundleLevel]) -> State {
        match ancestors.split_last_mut() {
            None => {
                let space = self.space.bundle().clone();
                space.space().sample_uniform(self.space.rng_mut())
            }
            Some((parent, rest)) => {
                let base = parent.sample_base(rest);
                let mut x = self.space.bundle_space().alloc_state();
                self.space.lift_from_base(&base, &mut x);
                x
            }
        }
    }

    /// Goal state with probability `goal_bias` while unsolved, otherwise
    /// [`sample_bundle`](Self::sample_bundle)
    pub fn sample_bundle_goal_bias(&mut self, ancestors: &mut [BundleLevel]) -> State {
        if !self.has_solution() {
            let goal_bias = self.config.goal_bias;
            if self.space.rng_mut().gen::<f64>() < goal_bias {
                if let Some(p) = &self.problem {
                    return p.goal.state().clone();
                }
            }
        }
        self.sample_bundle(ancestors)
    }

    /// Valid bundle state, or `None` if the draw was infeasible
    pub fn sample(&mut self, ancestors: &mut [BundleLevel]) -> Option<State> {
        let x = self.sample_bundle(ancestors);
        if self.space.is_valid(&x) {
            Some(x)
        } else {
            None
        }
    }

    /// State drawn by the graph sampler from this level's roadmap and path
    pub fn sample_from_datastructure(&mut self) -> State {
        let solution = if self.has_solution() && self.update_solution() {
            self.solution.as_ref().map(|s| &s.path)
        } else {
            None
        };
        let space = self.space.bundle().clone();
        self.sampler
            .sample(self.space.rng_mut(), space.space(), &self.graph, solution)
    }

    /// Copy of a uniformly chosen vertex; uniform sample on an empty graph
    pub fn random_vertex_state(&mut self) -> State {
        let n = self.graph.num_vertices();
        if n == 0 {
            let space = self.space.bundle().clone();
            return space.space().sample_uniform(self.space.rng_mut());
        }
        let v = self.space.rng_mut().gen_range(0..n);
        self.graph.state(v).clone()
    }

    /// Offer the vertices added since the last call to the sparse spanner and
    /// restore its stretch bound around the new edges
    pub fn update_sparse(&mut self) {
        let sparse = match &mut self.sparse {
            Some(s) => s,
            None => return,
        };
        let candidates = std::mem::take(&mut self.pending_sparse);
        let touched = std::mem::take(&mut self.pending_touched);
        if sparse.update(self.space.bundle(), &mut self.graph, &candidates, &touched) {
            trace!(
                "{}: sparse graph has {} vertices, {} edges",
                self.space,
                sparse.num_vertices(),
                sparse.num_edges()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{RealVectorBounds, StateSpace};

    fn square_graph(config: BundleSpaceGraphConfig) -> BundleSpaceGraph {
        let space = StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0));
        let si = Rc::new(SpaceInformation::unconstrained(space.clone()));
        let bundle = BundleSpace::new(0, 0, si, None, 7).unwrap();
        let mut graph = BundleSpaceGraph::new(bundle, config).unwrap();
        graph.set_problem(
            State::from_vec(vec![0.1, 0.1]),
            GoalState::new(space, State::from_vec(vec![0.9, 0.9]), 0.05),
        );
        graph
    }

    #[test]
    fn test_invalid_parameters() {
        let mut graph = square_graph(BundleSpaceGraphConfig::default());
        assert!(graph.set_goal_bias(1.5).is_err());
        assert!(graph.set_range(-1.0).is_err());
        assert!(graph.set_range(0.3).is_ok());
        assert_eq!(graph.max_distance(), 0.3);
        let config = BundleSpaceGraphConfig {
            goal_bias: -0.1,
            ..Default::default()
        };
        let space = StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0));
        let si = Rc::new(SpaceInformation::unconstrained(space));
        let bundle = BundleSpace::new(0, 0, si, None, 7).unwrap();
        assert!(BundleSpaceGraph::new(bundle, config).is_err());
    }

    #[test]
    fn test_default_range_is_fraction_of_extent() {
        let graph = square_graph(BundleSpaceGraphConfig::default());
        assert!((graph.max_distance() - 0.2 * 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_solution_after_connecting_start_and_goal() {
        let mut graph = square_graph(BundleSpaceGraphConfig::default());
        assert!(graph.init());
        let mid = graph.add_configuration(State::from_vec(vec![0.5, 0.5]));
        let goal = graph.add_goal_configuration().unwrap();
        assert!(!graph.has_solution());
        assert!(graph.get_solution().is_none());
        let start = graph.start_vertex().unwrap();
        graph.add_edge(start, mid);
        graph.add_edge(mid, goal);
        assert!(graph.has_solution());
        let path = graph.get_solution().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some(&State::from_vec(vec![0.9, 0.9])));
        assert_eq!(graph.solution_vertices(), Some(&[start, mid, goal][..]));
    }

    #[test]
    fn test_init_without_problem() {
        let space = StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0));
        let si = Rc::new(SpaceInformation::unconstrained(space));
        let bundle = BundleSpace::new(0, 0, si, None, 7).unwrap();
        let mut graph = BundleSpaceGraph::new(bundle, BundleSpaceGraphConfig::default()).unwrap();
        assert!(!graph.init());
        assert!(graph.is_empty());
        assert!(graph.is_first_run());
    }

    #[test]
    fn test_clear_resets_solution() {
        let mut graph = square_graph(BundleSpaceGraphConfig::default());
        graph.init();
        let goal = graph.add_goal_configuration().unwrap();
        graph.add_edge(0, goal);
        assert!(graph.has_solution());
        graph.clear();
        assert!(!graph.has_solution());
        assert!(graph.is_first_run());
        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    fn test_sparse_graph_follows_dense_graph() {
        let config = BundleSpaceGraphConfig {
            sparse: Some(SparseGraphConfig::default()),
            ..Default::default()
        };
        let mut graph = square_graph(config);
        graph.init();
        graph.add_configuration(State::from_vec(vec![0.9, 0.9]));
        graph.update_sparse();
        let sparse = graph.sparse().unwrap();
        assert_eq!(sparse.num_vertices(), 2);
    }

    #[test]
    fn test_solution_through_sparse_graph() {
        let config = BundleSpaceGraphConfig {
            sparse: Some(SparseGraphConfig::default()),
            ..Default::default()
        };
        let mut graph = square_graph(config);
        graph.init();
        let start = graph.start_vertex().unwrap();
        let mid = graph.add_configuration(State::from_vec(vec![0.5, 0.5]));
        let goal = graph.add_goal_configuration().unwrap();
        graph.add_edge(start, mid);
        graph.add_edge(mid, goal);
        graph.update_sparse();

        // all three are too far apart to see each other, the dense edges get copied
        let sparse = graph.sparse().unwrap();
        assert_eq!(sparse.num_vertices(), 3);
        assert_eq!(sparse.num_edges(), 2);
        let path = graph.get_solution().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), Some(&State::from_vec(vec![0.1, 0.1])));
        assert_eq!(path.last(), Some(&State::from_vec(vec![0.9, 0.9])));
    }
}
