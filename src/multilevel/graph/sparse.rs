//! Sparse roadmap spanner maintained alongside the dense roadmap.
//!
//! Every dense vertex is offered to the spanner once, in insertion order.
//! Four admission criteria are tried in order, the first one that fires wins:
//!
//! 1. coverage: no sparse vertex visible within `sparse_delta`
//! 2. connectivity: the visible sparse vertices span several components
//! 3. interface: the two nearest sparse vertices are visible but not adjacent
//! 4. path: the candidate's representative `v` and an interface neighbour
//!    `v'`, or `v'` and a neighbour `v''` of `v` not adjacent to `v'`, are
//!    too far apart in the spanner compared to the dense roadmap; the dense
//!    shortest path is copied in
//!
//! Every dense vertex keeps its nearest visible sparse vertex as
//! representative. After each batch of candidates, [`SparseGraph::update`]
//! restores the stretch bound for all sparse pairs whose dense distance the
//! new dense edges may have shortened.
//!
//! A run of candidates rejected by all four is counted in
//! `consecutive_failures`; callers may stop once it exceeds `max_failures`.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, trace};

use super::disjoint_sets::DisjointSets;
use super::roadmap::{Configuration, Roadmap};
use super::shortest_path::{astar, dijkstra, ShortestPaths};
use crate::common::error::{PlanningError, PlanningResult};
use crate::common::types::{State, StatePath};
use crate::nearest::{NearestNeighbors, NearestNeighborsLinear};
use crate::space::{SpaceInformation, StateSpace};

/// Tolerance when comparing path lengths
const STRETCH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SparseGraphConfig {
    /// Visibility radius as a fraction of the bundle maximum extent
    pub sparse_delta_fraction: f64,
    /// Minimum spacing of interface vertices, same unit
    pub dense_delta_fraction: f64,
    /// Allowed ratio of spanner to dense path length
    pub stretch_factor: f64,
    /// Consecutive rejections after which the spanner counts as converged
    pub max_failures: usize,
}

impl Default for SparseGraphConfig {
    fn default() -> Self {
        Self {
            sparse_delta_fraction: 0.15,
            dense_delta_fraction: 0.001,
            stretch_factor: 3.0,
            max_failures: 1000,
        }
    }
}

impl SparseGraphConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        let fraction_ok = |f: f64| f > 0.0 && f <= 1.0;
        if !fraction_ok(self.sparse_delta_fraction) || !fraction_ok(self.dense_delta_fraction) {
            return Err(PlanningError::InvalidParameter(format!(
                "sparse/dense delta fractions must be in (0, 1], got {} / {}",
                self.sparse_delta_fraction, self.dense_delta_fraction
            )));
        }
        if !(self.stretch_factor > 1.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "stretch factor must be > 1, got {}",
                self.stretch_factor
            )));
        }
        Ok(())
    }
}

/// Which criterion admitted a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Coverage,
    Connectivity,
    Interface,
    Path,
}

#[derive(Debug, Clone)]
pub struct SparseGraph {
    config: SparseGraphConfig,
    space: StateSpace,
    sparse_delta: f64,
    dense_delta: f64,
    graph: Roadmap,
    nn: NearestNeighborsLinear,
    components: DisjointSets,
    dense_to_sparse: HashMap<usize, usize>,
    /// Sparse vertices whose pairs were not yet checked against the stretch bound
    unchecked: Vec<usize>,
    consecutive_failures: usize,
    snapshot: (usize, usize),
}

impl SparseGraph {
    pub fn new(config: SparseGraphConfig, space: &StateSpace) -> PlanningResult<Self> {
        config.validate()?;
        let extent = space.maximum_extent();
        let sparse_delta = config.sparse_delta_fraction * extent;
        let dense_delta = config.dense_delta_fraction * extent;
        debug!(
            "Sparse graph: sparse delta {:.4}, dense delta {:.6}, stretch {}",
            sparse_delta, dense_delta, config.stretch_factor
        );
        Ok(SparseGraph {
            config,
            space: space.clone(),
            sparse_delta,
            dense_delta,
            graph: Roadmap::new(),
            nn: NearestNeighborsLinear::new(space.clone()),
            components: DisjointSets::new(),
            dense_to_sparse: HashMap::new(),
            unchecked: Vec::new(),
            consecutive_failures: 0,
            snapshot: (0, 0),
        })
    }

    pub fn config(&self) -> &SparseGraphConfig {
        &self.config
    }

    pub fn sparse_delta(&self) -> f64 {
        self.sparse_delta
    }

    pub fn dense_delta(&self) -> f64 {
        self.dense_delta
    }

    pub fn graph(&self) -> &Roadmap {
        &self.graph
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    pub fn is_converged(&self) -> bool {
        self.consecutive_failures >= self.config.max_failures
    }

    /// Sparse vertex copying dense vertex `v`, if any
    pub fn sparse_vertex_of(&self, v: usize) -> Option<usize> {
        self.dense_to_sparse.get(&v).copied()
    }

    /// True if vertices or edges were added since the previous call
    pub fn has_sparse_graph_changed(&mut self) -> bool {
        let now = (self.graph.num_vertices(), self.graph.num_edges());
        let changed = now != self.snapshot;
        self.snapshot = now;
        changed
    }

    pub fn same_component(&mut self, a: usize, b: usize) -> bool {
        self.components.same_component(a, b)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.nn.clear();
        self.components.clear();
        self.dense_to_sparse.clear();
        self.unchecked.clear();
        self.consecutive_failures = 0;
        self.snapshot = (0, 0);
    }

    /// Offer `candidates` in order, then restore the stretch bound around the
    /// dense vertices in `touched`, the endpoints of dense edges added since
    /// the previous update. Returns true if the spanner changed.
    pub fn update(
        &mut self,
        si: &SpaceInformation,
        dense: &mut Roadmap,
        candidates: &[usize],
        touched: &[usize],
    ) -> bool {
        let before = (self.graph.num_vertices(), self.graph.num_edges());
        for &v in candidates {
            self.add_candidate(si, dense, v);
        }
        self.restore_stretch(si, dense, touched);
        before != (self.graph.num_vertices(), self.graph.num_edges())
    }

    /// Offer dense vertex `v` to the spanner
    pub fn add_candidate(&mut self, si: &SpaceInformation, dense: &mut Roadmap, v: usize) -> Option<Admission> {
        if self.dense_to_sparse.contains_key(&v) {
            return None;
        }
        let q = dense.state(v).clone();
        let (graph_neighbors, visible) = self.find_graph_neighbors(si, &q);

        let admission = if self.check_add_coverage(si, dense, v, &visible) {
            Some(Admission::Coverage)
        } else if self.check_add_connectivity(si, dense, v, &visible) {
            Some(Admission::Connectivity)
        } else if self.check_add_interface(si, dense, v, &graph_neighbors, &visible) {
            Some(Admission::Interface)
        } else {
            let rep = visible[0];
            dense.vertex_mut(v).representative = Some(rep);
            if self.check_add_path(si, dense, v, rep) {
                Some(Admission::Path)
            } else {
                None
            }
        };

        match admission {
            Some(a) => {
                trace!("Sparse admission {:?} for dense vertex {}", a, v);
                self.consecutive_failures = 0;
            }
            None => self.consecutive_failures += 1,
        }
        admission
    }

    /// Path through the spanner between dense vertices `start` and `goal`.
    /// Each end enters the spanner at its sparse copy or, failing that, at
    /// its representative.
    pub fn get_solution(&self, dense: &Roadmap, start: usize, goal: usize) -> Option<(StatePath, f64)> {
        let s = self.anchor(dense, start)?;
        let g = self.anchor(dense, goal)?;
        let goal_state = self.graph.state(g);
        let (vertices, mut length) = astar(&self.graph, s, g, |x| {
            self.space.distance(self.graph.state(x), goal_state)
        })?;

        let mut states = Vec::with_capacity(vertices.len() + 2);
        if self.graph.vertex(s).dense_vertex != Some(start) {
            states.push(dense.state(start).clone());
            length += self.space.distance(dense.state(start), self.graph.state(s));
        }
        states.extend(vertices.iter().map(|&x| self.graph.state(x).clone()));
        if self.graph.vertex(g).dense_vertex != Some(goal) {
            states.push(dense.state(goal).clone());
            length += self.space.distance(self.graph.state(g), dense.state(goal));
        }
        Some((StatePath::from_states(states), length))
    }

    fn anchor(&self, dense: &Roadmap, v: usize) -> Option<usize> {
        self.sparse_vertex_of(v).or(dense.vertex(v).representative)
    }

    /// Sparse vertices within `sparse_delta` of `q`, and the subset of them
    /// reachable by a valid straight motion. Both ordered by distance.
    fn find_graph_neighbors(&self, si: &SpaceInformation, q: &State) -> (Vec<usize>, Vec<usize>) {
        let graph_neighbors: Vec<usize> = self
            .nn
            .nearest_r(q, self.sparse_delta)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let visible = graph_neighbors
            .iter()
            .copied()
            .filter(|&s| si.check_motion(q, self.graph.state(s)))
            .collect();
        (graph_neighbors, visible)
    }

    fn add_node(&mut self, si: &SpaceInformation, dense: &mut Roadmap, v: usize) -> usize {
        let state = dense.state(v).clone();
        let mut configuration = Configuration::new(state.clone());
        configuration.dense_vertex = Some(v);
        let s = self.graph.add_vertex(configuration);
        self.graph.vertex_mut(s).representative = Some(s);
        self.nn.add(s, state);
        self.components.make_set();
        self.dense_to_sparse.insert(v, s);
        self.unchecked.push(s);
        dense.vertex_mut(v).representative = Some(s);
        self.update_representatives(si, dense, s);
        s
    }

    /// Dense vertices within `sparse_delta` that see the new sparse vertex
    /// `s` and lie closer to it than to their representative move over to `s`
    fn update_representatives(&self, si: &SpaceInformation, dense: &mut Roadmap, s: usize) {
        let xs = self.graph.state(s);
        for u in 0..dense.num_vertices() {
            if self.dense_to_sparse.contains_key(&u) {
                continue;
            }
            let d = self.space.distance(dense.state(u), xs);
            if d > self.sparse_delta {
                continue;
            }
            let closer = match dense.vertex(u).representative {
                Some(r) => d < self.space.distance(dense.state(u), self.graph.state(r)),
                None => true,
            };
            if closer && si.check_motion(dense.state(u), xs) {
                dense.vertex_mut(u).representative = Some(s);
            }
        }
    }

    fn connect(&mut self, a: usize, b: usize) {
        let w = self.space.distance(self.graph.state(a), self.graph.state(b));
        self.connect_weighted(a, b, w);
    }

    fn connect_weighted(&mut self, a: usize, b: usize, weight: f64) {
        if self.graph.add_edge(a, b, weight) {
            self.components.union(a, b);
        }
    }

    fn check_add_coverage(&mut self, si: &SpaceInformation, dense: &mut Roadmap, v: usize, visible: &[usize]) -> bool {
        if !visible.is_empty() {
            return false;
        }
        self.add_node(si, dense, v);
        true
    }

    fn check_add_connectivity(
        &mut self,
        si: &SpaceInformation,
        dense: &mut Roadmap,
        v: usize,
        visible: &[usize],
    ) -> bool {
        let mut disconnected = false;
        'outer: for (i, &a) in visible.iter().enumerate() {
            for &b in &visible[i + 1..] {
                if !self.components.same_component(a, b) {
                    disconnected = true;
                    break 'outer;
                }
            }
        }
        if !disconnected {
            return false;
        }
        let s = self.add_node(si, dense, v);
        for &n in visible {
            if !self.components.same_component(s, n) {
                self.connect(s, n);
            }
        }
        true
    }

    fn check_add_interface(
        &mut self,
        si: &SpaceInformation,
        dense: &mut Roadmap,
        v: usize,
        graph_neighbors: &[usize],
        visible: &[usize],
    ) -> bool {
        if visible.len() < 2 || graph_neighbors.len() < 2 {
            return false;
        }
        let (r0, r1) = (visible[0], visible[1]);
        if graph_neighbors[0] != r0 || graph_neighbors[1] != r1 || self.graph.has_edge(r0, r1) {
            return false;
        }
        if si.check_motion(self.graph.state(r0), self.graph.state(r1)) {
            self.connect(r0, r1);
            dense.vertex_mut(v).representative = Some(r0);
            return true;
        }
        let q = dense.state(v);
        if si.distance(q, self.graph.state(r0)) < self.dense_delta
            || si.distance(q, self.graph.state(r1)) < self.dense_delta
        {
            return false;
        }
        let s = self.add_node(si, dense, v);
        self.connect(s, r0);
        self.connect(s, r1);
        true
    }

    /// Representatives of the dense neighbours of `v` other than `rep`
    fn interface_representatives(&self, dense: &Roadmap, v: usize, rep: usize) -> Vec<usize> {
        dense
            .neighbors(v)
            .iter()
            .filter_map(|e| dense.vertex(e.target).representative)
            .filter(|&r| r != rep)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sparse neighbours of `v` that are neither `vp` nor adjacent to it
    fn compute_vpp(&self, v: usize, vp: usize) -> Vec<usize> {
        self.graph
            .neighbors(v)
            .iter()
            .map(|e| e.target)
            .filter(|&x| x != vp && !self.graph.has_edge(x, vp))
            .collect()
    }

    /// Path criterion for a candidate `v` represented by `rep`
    fn check_add_path(&mut self, si: &SpaceInformation, dense: &mut Roadmap, v: usize, rep: usize) -> bool {
        let mut added = false;
        for vp in self.interface_representatives(dense, v, rep) {
            added |= self.check_add_pair(si, dense, rep, vp);
            for vpp in self.compute_vpp(rep, vp) {
                added |= self.check_add_pair(si, dense, vp, vpp);
            }
        }
        added
    }

    /// Copy the dense shortest path between sparse vertices `a` and `b` if
    /// their spanner distance breaks the stretch bound
    fn check_add_pair(&mut self, si: &SpaceInformation, dense: &mut Roadmap, a: usize, b: usize) -> bool {
        let (da, db) = match (self.graph.vertex(a).dense_vertex, self.graph.vertex(b).dense_vertex) {
            (Some(da), Some(db)) => (da, db),
            _ => return false,
        };
        let t = self.config.stretch_factor;
        let sparse_distance = dijkstra(&self.graph, a, f64::INFINITY).distance[b];
        let dense_paths = dijkstra(dense, da, sparse_distance / t);
        let d = dense_paths.distance[db];
        if d.is_finite() && sparse_distance > t * d + STRETCH_EPSILON {
            self.copy_dense_path(si, dense, &dense_paths, db)
        } else {
            false
        }
    }

    /// Sparse vertex for dense vertex `v`, created if missing
    fn sparse_vertex_for(&mut self, si: &SpaceInformation, dense: &mut Roadmap, v: usize) -> usize {
        match self.dense_to_sparse.get(&v) {
            Some(&s) => s,
            None => self.add_node(si, dense, v),
        }
    }

    fn copy_dense_path(
        &mut self,
        si: &SpaceInformation,
        dense: &mut Roadmap,
        dense_paths: &ShortestPaths,
        target: usize,
    ) -> bool {
        let path = match dense_paths.path_to(target) {
            Some(p) => p,
            None => return false,
        };
        let mut prev = self.sparse_vertex_for(si, dense, path[0]);
        for pair in path.windows(2) {
            let next = self.sparse_vertex_for(si, dense, pair[1]);
            let weight = dense
                .neighbors(pair[0])
                .iter()
                .find(|e| e.target == pair[1])
                .map(|e| e.weight)
                .unwrap_or_else(|| self.space.distance(dense.state(pair[0]), dense.state(pair[1])));
            self.connect_weighted(prev, next, weight);
            prev = next;
        }
        true
    }

    /// Every sparse vertex whose spanner distance from `s` exceeds
    /// `stretch_factor` times the dense distance gets the dense shortest path
    /// copied into the spanner.
    fn restore_stretch_from(&mut self, si: &SpaceInformation, dense: &mut Roadmap, s: usize) -> bool {
        let source = match self.graph.vertex(s).dense_vertex {
            Some(d) => d,
            None => return false,
        };
        let t = self.config.stretch_factor;
        let sparse_paths = dijkstra(&self.graph, s, f64::INFINITY);
        let dense_paths = dijkstra(dense, source, stretch_cutoff(&sparse_paths.distance, t));

        let mut violating = Vec::new();
        for b in 0..self.graph.num_vertices() {
            if b == s {
                continue;
            }
            let target = match self.graph.vertex(b).dense_vertex {
                Some(d) => d,
                None => continue,
            };
            let d_dense = dense_paths.distance[target];
            if d_dense.is_finite() && sparse_paths.distance[b] > t * d_dense + STRETCH_EPSILON {
                violating.push(target);
            }
        }

        let mut added = false;
        for target in violating {
            added |= self.copy_dense_path(si, dense, &dense_paths, target);
        }
        if added {
            trace!("Path criterion tightened spanner around sparse vertex {}", s);
        }
        added
    }

    /// A pair whose dense distance shrank has its new dense shortest path
    /// running through one of the `touched` vertices. Such pairs, and all
    /// pairs of sparse vertices added since the previous call, are checked
    /// until no sparse vertex is left unchecked.
    fn restore_stretch(&mut self, si: &SpaceInformation, dense: &mut Roadmap, touched: &[usize]) -> bool {
        let t = self.config.stretch_factor;
        let n = self.graph.num_vertices();
        let sparse_paths: Vec<ShortestPaths> = (0..n).map(|s| dijkstra(&self.graph, s, f64::INFINITY)).collect();
        let cutoff = sparse_paths
            .iter()
            .map(|p| stretch_cutoff(&p.distance, t))
            .fold(0.0, f64::max);

        let mut worklist: Vec<usize> = std::mem::take(&mut self.unchecked);
        let touched: BTreeSet<usize> = touched.iter().copied().collect();
        for v in touched {
            let through = dijkstra(dense, v, cutoff);
            for a in 0..n {
                let ra = match self.graph.vertex(a).dense_vertex.map(|d| through.distance[d]) {
                    Some(r) if r.is_finite() => r,
                    _ => continue,
                };
                let stretched = (0..n).any(|b| {
                    let rb = match self.graph.vertex(b).dense_vertex {
                        Some(d) => through.distance[d],
                        None => return false,
                    };
                    b != a && rb.is_finite() && sparse_paths[a].distance[b] > t * (ra + rb) + STRETCH_EPSILON
                });
                if stretched {
                    worklist.push(a);
                }
            }
        }

        let mut added = false;
        let mut checked = HashSet::new();
        while let Some(s) = worklist.pop() {
            if !checked.insert(s) {
                continue;
            }
            added |= self.restore_stretch_from(si, dense, s);
            worklist.append(&mut self.unchecked);
        }
        added
    }
}

/// Dense search radius beyond which no pair can break the stretch bound
fn stretch_cutoff(sparse_distances: &[f64], stretch_factor: f64) -> f64 {
    if sparse_distances.iter().all(|d| d.is_finite()) {
        sparse_distances.iter().cloned().fold(0.0, f64::max) / stretch_factor
    } else {
        f64::INFINITY
    }
}
