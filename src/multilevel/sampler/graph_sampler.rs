//! Samplers that draw states from what a level has already learned: its
//! roadmap and its solution path.

use log::{debug, trace};
use rand::Rng;

use super::decay::{ExponentialDecay, LinearDecay};
use crate::common::error::{PlanningError, PlanningResult};
use crate::common::types::{State, StatePath};
use crate::multilevel::graph::Roadmap;
use crate::space::StateSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSamplerKind {
    /// Uniform over the bundle space
    Uniform,
    /// Copy of a uniformly chosen roadmap vertex
    RandomVertex,
    /// Random vertex, perturbed inside a growing share of the sparse
    /// visibility radius. Needs a sparse graph.
    VisibilityRegion,
}

#[derive(Debug, Clone)]
pub struct GraphSamplerConfig {
    pub kind: GraphSamplerKind,
    /// Decay rate shared by the path bias and thickening schedules
    pub exponential_decay_lambda: f64,
    /// Floor of the path bias probability
    pub path_bias_fixed: f64,
    /// Graph thickening radius as a fraction of the maximum extent
    pub epsilon_graph_thickening_fraction: f64,
    /// Calls until the visibility region bias reaches 1
    pub region_bias_counter_target: u64,
}

impl Default for GraphSamplerConfig {
    fn default() -> Self {
        Self {
            kind: GraphSamplerKind::RandomVertex,
            exponential_decay_lambda: 1e-3,
            path_bias_fixed: 0.1,
            epsilon_graph_thickening_fraction: 1e-4,
            region_bias_counter_target: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphSampler {
    config: GraphSamplerConfig,
    epsilon_graph_thickening: f64,
    path_bias_decay: ExponentialDecay,
    path_thickening: ExponentialDecay,
    graph_thickening: ExponentialDecay,
    region_bias: LinearDecay,
    sparse_delta: Option<f64>,
    path_bias_start_segment: f64,
    segment_bias: bool,
}

impl GraphSampler {
    /// `sparse_delta` is the visibility radius of the level's sparse graph,
    /// `None` when the level keeps no sparse graph.
    pub fn new(config: GraphSamplerConfig, space: &StateSpace, sparse_delta: Option<f64>) -> PlanningResult<Self> {
        if !(0.0..=1.0).contains(&config.path_bias_fixed) {
            return Err(PlanningError::InvalidParameter(format!(
                "path bias floor must be in [0, 1], got {}",
                config.path_bias_fixed
            )));
        }
        if config.kind == GraphSamplerKind::VisibilityRegion && sparse_delta.is_none() {
            return Err(PlanningError::InvalidSampler(
                "visibility region sampler is only valid with a sparse graph".to_string(),
            ));
        }
        let epsilon_graph_thickening = match config.kind {
            GraphSamplerKind::VisibilityRegion => 0.0,
            _ => space.maximum_extent() * config.epsilon_graph_thickening_fraction,
        };
        debug!(
            "Epsilon graph thickening constant set to {}",
            epsilon_graph_thickening
        );
        let lambda = config.exponential_decay_lambda;
        Ok(GraphSampler {
            path_bias_decay: ExponentialDecay::new(lambda, 1.0, config.path_bias_fixed),
            path_thickening: ExponentialDecay::new(lambda, epsilon_graph_thickening, 0.0),
            graph_thickening: ExponentialDecay::new(lambda, epsilon_graph_thickening, 0.0),
            region_bias: LinearDecay::new(0.0, 1.0, 0, config.region_bias_counter_target),
            sparse_delta,
            epsilon_graph_thickening,
            path_bias_start_segment: 0.0,
            segment_bias: true,
            config,
        })
    }

    pub fn kind(&self) -> GraphSamplerKind {
        self.config.kind
    }

    pub fn epsilon_graph_thickening(&self) -> f64 {
        self.epsilon_graph_thickening
    }

    pub fn path_bias_start_segment(&self) -> f64 {
        self.path_bias_start_segment
    }

    /// Move the start of the path bias window forward. Never moves it back
    /// while segment bias is on; pins it to 0 when segment bias is off.
    pub fn set_path_bias_start_segment(&mut self, s: f64) {
        if !self.segment_bias {
            self.path_bias_start_segment = 0.0;
        } else if s > self.path_bias_start_segment {
            trace!("Set path bias start segment: {}", s);
            self.path_bias_start_segment = s;
        }
    }

    pub fn disable_segment_bias(&mut self) {
        self.segment_bias = false;
        self.path_bias_start_segment = 0.0;
    }

    pub fn disable_path_bias(&mut self) {
        self.path_bias_decay = ExponentialDecay::new(0.0, 0.0, 0.0);
    }

    pub fn reset(&mut self) {
        self.path_bias_decay.reset();
        self.path_thickening.reset();
        self.graph_thickening.reset();
        self.region_bias.reset();
        self.path_bias_start_segment = 0.0;
    }

    /// Draw one state. With the path bias probability the state is taken
    /// along `solution`, otherwise from the sampler kind. The result is
    /// perturbed within the decaying thickening radius either way.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        space: &StateSpace,
        roadmap: &Roadmap,
        solution: Option<&StatePath>,
    ) -> State {
        let p: f64 = rng.gen();
        let bias = self.path_bias_decay.next_value();

        let mut x = match solution {
            Some(path) if p < bias && path.len() >= 2 => {
                let on_path = self.sample_along_path(rng, space, path);
                let eps = self.path_thickening.next_value();
                if eps > 0.0 {
                    space.sample_uniform_near(rng, &on_path, eps)
                } else {
                    on_path
                }
            }
            _ => self.sample_implementation(rng, space, roadmap),
        };

        if self.epsilon_graph_thickening > 0.0 {
            let eps = self.graph_thickening.next_value();
            x = space.sample_uniform_near(rng, &x, eps);
        }
        x
    }

    fn sample_implementation<R: Rng + ?Sized>(&mut self, rng: &mut R, space: &StateSpace, roadmap: &Roadmap) -> State {
        if self.config.kind == GraphSamplerKind::Uniform || roadmap.is_empty() {
            return space.sample_uniform(rng);
        }
        let v = rng.gen_range(0..roadmap.num_vertices());
        let x = roadmap.state(v).clone();
        match (self.config.kind, self.sparse_delta) {
            (GraphSamplerKind::VisibilityRegion, Some(delta)) => {
                let bias = self.region_bias.next_value();
                if rng.gen::<f64>() < bias {
                    space.sample_uniform_near(rng, &x, bias * delta)
                } else {
                    x
                }
            }
            _ => x,
        }
    }

    /// Uniform position between the start segment and the end of the path,
    /// located by a linear scan over the segments.
    fn sample_along_path<R: Rng + ?Sized>(&self, rng: &mut R, space: &StateSpace, path: &StatePath) -> State {
        let states = &path.states;
        let end_length = path.total_length(space);
        let start = self.path_bias_start_segment.min(end_length);
        let dist_stopping = start + rng.gen::<f64>() * (end_length - start);

        let mut ctr = 0;
        let mut dist_last_segment = 0.0;
        let mut dist_counted = 0.0;
        while dist_counted < dist_stopping && ctr < states.len() - 1 {
            dist_last_segment = space.distance(&states[ctr], &states[ctr + 1]);
            dist_counted += dist_last_segment;
            ctr += 1;
        }
        if ctr == 0 {
            return states[0].clone();
        }
        let step = if dist_last_segment > 0.0 {
            (dist_last_segment - (dist_counted - dist_stopping)) / dist_last_segment
        } else {
            0.0
        };
        space.interpolate(&states[ctr - 1], &states[ctr], step.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multilevel::graph::Configuration;
    use crate::space::RealVectorBounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square() -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0))
    }

    fn straight_path() -> StatePath {
        StatePath::from_states(vec![
            State::from_vec(vec![0.0, 0.5]),
            State::from_vec(vec![0.4, 0.5]),
            State::from_vec(vec![1.0, 0.5]),
        ])
    }

    #[test]
    fn test_segment_bias_is_monotone() {
        let mut sampler = GraphSampler::new(GraphSamplerConfig::default(), &square(), None).unwrap();
        for s in [0.5, 0.7, 0.3, 0.6, 0.1] {
            let before = sampler.path_bias_start_segment();
            sampler.set_path_bias_start_segment(s);
            assert!(sampler.path_bias_start_segment() >= before);
        }
        assert_eq!(sampler.path_bias_start_segment(), 0.7);
        sampler.disable_segment_bias();
        sampler.set_path_bias_start_segment(0.9);
        assert_eq!(sampler.path_bias_start_segment(), 0.0);
    }

    #[test]
    fn test_visibility_region_requires_sparse_graph() {
        let config = GraphSamplerConfig {
            kind: GraphSamplerKind::VisibilityRegion,
            ..Default::default()
        };
        assert!(matches!(
            GraphSampler::new(config.clone(), &square(), None),
            Err(PlanningError::InvalidSampler(_))
        ));
        let sampler = GraphSampler::new(config, &square(), Some(0.2)).unwrap();
        assert_eq!(sampler.epsilon_graph_thickening(), 0.0);
    }

    #[test]
    fn test_path_bias_samples_lie_on_path_window() {
        let config = GraphSamplerConfig {
            path_bias_fixed: 1.0,
            ..Default::default()
        };
        let space = square();
        let mut sampler = GraphSampler::new(config, &space, None).unwrap();
        sampler.set_path_bias_start_segment(0.6);
        let eps = 2.0 * sampler.epsilon_graph_thickening() + 1e-12;
        let mut rng = StdRng::seed_from_u64(1);
        let path = straight_path();
        for _ in 0..200 {
            let x = sampler.sample(&mut rng, &space, &Roadmap::new(), Some(&path));
            assert!((x[1] - 0.5).abs() <= eps);
            assert!(x[0] >= 0.6 - eps);
        }
    }

    #[test]
    fn test_random_vertex_copies_a_vertex() {
        let config = GraphSamplerConfig {
            epsilon_graph_thickening_fraction: 1e-9,
            ..Default::default()
        };
        let space = square();
        let mut sampler = GraphSampler::new(config, &space, None).unwrap();
        let mut roadmap = Roadmap::new();
        roadmap.add_vertex(Configuration::new(State::from_vec(vec![0.2, 0.2])));
        roadmap.add_vertex(Configuration::new(State::from_vec(vec![0.8, 0.8])));
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let x = sampler.sample(&mut rng, &space, &roadmap, None);
            let d = roadmap
                .vertices()
                .iter()
                .map(|c| space.distance(&c.state, &x))
                .fold(f64::INFINITY, f64::min);
            assert!(d < 1e-6);
        }
    }
}
