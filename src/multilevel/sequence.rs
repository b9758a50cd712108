//! Multi-level planner: a sequence of nested bundle spaces grown coarse to
//! fine, scheduled by level importance.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;

use log::{debug, info};
use ordered_float::OrderedFloat;

use crate::common::error::{PlanningError, PlanningResult};
use crate::common::traits::{GoalState, TerminationCondition};
use crate::common::types::{State, StatePath};
use crate::multilevel::algorithms::PlannerKind;
use crate::multilevel::bundle_space::{BundleSpace, Importance};
use crate::multilevel::bundle_space_graph::{BundleSpaceGraph, BundleSpaceGraphConfig};
use crate::multilevel::level::{BundleLevel, LevelStats};
use crate::space::SpaceInformation;

pub struct BundleSpaceSequence {
    levels: Vec<BundleLevel>,
    kind: PlannerKind,
    stop_level: usize,
    current_level: usize,
    has_problem: bool,
    next_id: usize,
}

impl BundleSpaceSequence {
    /// One level per space, coarsest first. Level `i` projects onto level
    /// `i - 1`.
    pub fn new(
        spaces: Vec<SpaceInformation>,
        kind: PlannerKind,
        config: BundleSpaceGraphConfig,
    ) -> PlanningResult<Self> {
        Self::with_first_id(spaces, kind, config, 0)
    }

    /// Like [`new`](Self::new) with level ids counted from `first_id`
    pub fn with_first_id(
        spaces: Vec<SpaceInformation>,
        kind: PlannerKind,
        config: BundleSpaceGraphConfig,
        first_id: usize,
    ) -> PlanningResult<Self> {
        if spaces.is_empty() {
            return Err(PlanningError::InvalidParameter(
                "a bundle space sequence needs at least one space".to_string(),
            ));
        }
        config.validate()?;

        let mut next_id = first_id;
        let mut levels = Vec::with_capacity(spaces.len());
        let mut parent: Option<Rc<SpaceInformation>> = None;
        for (level, si) in spaces.into_iter().enumerate() {
            let bundle = Rc::new(si);
            let seed = config.seed.wrapping_add(level as u64);
            let space = BundleSpace::new(next_id, level, bundle.clone(), parent.take(), seed)?;
            next_id += 1;
            let graph = BundleSpaceGraph::new(
                space,
                BundleSpaceGraphConfig {
                    seed,
                    ..config.clone()
                },
            )?;
            levels.push(BundleLevel::new(graph, kind.build()));
            parent = Some(bundle);
        }

        let stop_level = levels.len() - 1;
        debug!("{} sequence with {} levels", kind, levels.len());
        Ok(BundleSpaceSequence {
            levels,
            kind,
            stop_level,
            current_level: 0,
            has_problem: false,
            next_id,
        })
    }

    pub fn kind(&self) -> PlannerKind {
        self.kind
    }

    /// Id the next level built by this sequence would receive
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[BundleLevel] {
        &self.levels
    }

    pub fn level(&self, i: usize) -> Option<&BundleLevel> {
        self.levels.get(i)
    }

    pub fn level_mut(&mut self, i: usize) -> Option<&mut BundleLevel> {
        self.levels.get_mut(i)
    }

    pub fn stop_level(&self) -> usize {
        self.stop_level
    }

    /// Plan only up to level `k`
    pub fn set_stop_level(&mut self, k: usize) -> PlanningResult<()> {
        if k >= self.levels.len() {
            return Err(PlanningError::InvalidParameter(format!(
                "stop level {} out of range, sequence has {} levels",
                k,
                self.levels.len()
            )));
        }
        self.stop_level = k;
        Ok(())
    }

    pub fn set_importance(&mut self, importance: Importance) {
        for level in &mut self.levels {
            level.graph_mut().space_mut().set_importance(importance);
        }
    }

    /// Start and goal on the finest level. Both are projected down to every
    /// coarser level.
    pub fn set_problem(&mut self, start: State, goal: State, threshold: f64) -> PlanningResult<()> {
        let finest = self.levels.len() - 1;
        let expected = self.levels[finest].graph().space().bundle_space().coordinate_len();
        if start.len() != expected || goal.len() != expected {
            return Err(PlanningError::InvalidParameter(format!(
                "start and goal need {} coordinates, got {} and {}",
                expected,
                start.len(),
                goal.len()
            )));
        }

        let mut start = start;
        let mut goal = goal;
        for i in (0..=finest).rev() {
            let space = self.levels[i].graph().space();
            let goal_state = GoalState::new(space.bundle_space().clone(), goal.clone(), threshold);
            let (start_base, goal_base) = match space.alloc_base_state() {
                Some(mut sb) => {
                    let mut gb = sb.clone();
                    space.project_base(&start, &mut sb);
                    space.project_base(&goal, &mut gb);
                    (Some(sb), Some(gb))
                }
                None => (None, None),
            };
            self.levels[i].set_problem(start, goal_state);
            match (start_base, goal_base) {
                (Some(sb), Some(gb)) => {
                    start = sb;
                    goal = gb;
                }
                _ => break,
            }
        }
        self.has_problem = true;
        Ok(())
    }

    /// Grow the levels until the stop level is solved or `ptc` fires.
    /// Returns whether the stop level has a solution.
    pub fn solve(&mut self, ptc: &mut dyn TerminationCondition) -> PlanningResult<bool> {
        if !self.has_problem {
            return Err(PlanningError::MissingProblem(
                "set_problem must be called before solve".to_string(),
            ));
        }

        while self.current_level <= self.stop_level {
            let k = self.current_level;
            let mut queue: BinaryHeap<(OrderedFloat<f64>, Reverse<usize>)> = (0..=k)
                .map(|j| (OrderedFloat(self.levels[j].importance()), Reverse(j)))
                .collect();

            while !self.levels[k].has_solution() {
                if ptc.should_terminate() {
                    debug!("Terminated before level {} was solved", k);
                    return Ok(false);
                }
                let j = match queue.pop() {
                    Some((_, Reverse(j))) => j,
                    None => break,
                };
                self.grow_level(j);
                queue.push((OrderedFloat(self.levels[j].importance()), Reverse(j)));
            }

            info!(
                "Found solution on level {} ({} vertices)",
                k,
                self.levels[k].graph().num_vertices()
            );
            self.current_level += 1;
        }

        let stats = self.stats();
        for s in &stats {
            info!(
                "Level {}: {} vertices, {} edges",
                s.level, s.vertices, s.edges
            );
        }
        Ok(true)
    }

    fn grow_level(&mut self, j: usize) {
        let (ancestors, rest) = self.levels.split_at_mut(j);
        rest[0].grow(ancestors);
    }

    /// Solution on the stop level
    pub fn get_solution(&mut self) -> Option<StatePath> {
        let k = self.stop_level;
        self.levels[k].get_solution()
    }

    pub fn clear(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.current_level = 0;
    }

    pub fn stats(&mut self) -> Vec<LevelStats> {
        self.levels.iter_mut().map(|l| l.stats()).collect()
    }
}

impl fmt::Debug for BundleSpaceSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleSpaceSequence")
            .field("kind", &self.kind)
            .field("levels", &self.levels)
            .field("stop_level", &self.stop_level)
            .field("current_level", &self.current_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::IterationBudget;
    use crate::space::{
        BoxObstacle, BoxObstacleChecker, RealVectorBounds, SphereObstacle, SphereObstacleChecker,
        StateSpace,
    };

    fn rn(n: usize) -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(n, 0.0, 1.0))
    }

    fn free(space: StateSpace) -> SpaceInformation {
        SpaceInformation::unconstrained(space)
    }

    fn line_square(kind: PlannerKind) -> BundleSpaceSequence {
        let mut seq =
            BundleSpaceSequence::new(vec![free(rn(1)), free(rn(2))], kind, BundleSpaceGraphConfig::default())
                .unwrap();
        seq.set_problem(
            State::from_vec(vec![0.05, 0.3]),
            State::from_vec(vec![0.95, 0.7]),
            0.05,
        )
        .unwrap();
        seq
    }

    #[test]
    fn test_problem_projected_to_coarse_levels() {
        let seq = line_square(PlannerKind::Qrrt);
        let coarse = seq.level(0).unwrap().graph().problem().unwrap();
        assert_eq!(coarse.start, State::from_vec(vec![0.05]));
        assert_eq!(coarse.goal.state(), &State::from_vec(vec![0.95]));
        let fine = seq.level(1).unwrap().graph().problem().unwrap();
        assert_eq!(fine.start, State::from_vec(vec![0.05, 0.3]));
    }

    #[test]
    fn test_solve_needs_problem() {
        let mut seq =
            BundleSpaceSequence::new(vec![free(rn(2))], PlannerKind::Qrrt, BundleSpaceGraphConfig::default())
                .unwrap();
        let err = seq.solve(&mut IterationBudget::new(10)).unwrap_err();
        assert!(matches!(err, PlanningError::MissingProblem(_)));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(BundleSpaceSequence::new(vec![], PlannerKind::Qmp, BundleSpaceGraphConfig::default()).is_err());
        let err = BundleSpaceSequence::new(
            vec![free(rn(3)), free(rn(2))],
            PlannerKind::Qmp,
            BundleSpaceGraphConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanningError::UnsupportedProjection { .. } | PlanningError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_debug_lists_levels() {
        let seq = BundleSpaceSequence::new(
            vec![free(rn(1)), free(rn(2))],
            PlannerKind::Qmp,
            BundleSpaceGraphConfig::default(),
        )
        .unwrap();
        let text = format!("{:?}", seq);
        assert!(text.starts_with("BundleSpaceSequence"));
        assert_eq!(text.matches("BundleLevel").count(), 2);
    }

    #[test]
    fn test_level_ids_are_counted() {
        let seq = BundleSpaceSequence::with_first_id(
            vec![free(rn(1)), free(rn(2))],
            PlannerKind::Qrrt,
            BundleSpaceGraphConfig::default(),
            7,
        )
        .unwrap();
        assert_eq!(seq.level(0).unwrap().graph().space().id(), 7);
        assert_eq!(seq.level(1).unwrap().graph().space().id(), 8);
        assert_eq!(seq.next_id(), 9);
    }

    #[test]
    fn test_two_levels_solved_by_each_planner() {
        for kind in [PlannerKind::Qrrt, PlannerKind::Qmp, PlannerKind::QmpStar] {
            let mut seq = line_square(kind);
            assert!(seq.solve(&mut IterationBudget::new(5000)).unwrap(), "{} failed", kind);
            let path = seq.get_solution().unwrap();
            assert_eq!(path.first(), Some(&State::from_vec(vec![0.05, 0.3])));
            assert_eq!(path.last(), Some(&State::from_vec(vec![0.95, 0.7])));
            let stats = seq.stats();
            assert!(stats.iter().all(|s| s.solved));
        }
    }

    #[test]
    fn test_blocked_square_not_solved() {
        let wall = BoxObstacle::new(vec![0.45, -0.1], vec![0.55, 1.1]);
        let blocked = SpaceInformation::with_checker(rn(2), BoxObstacleChecker::new(vec![wall]));
        let mut seq =
            BundleSpaceSequence::new(vec![blocked], PlannerKind::Qrrt, BundleSpaceGraphConfig::default()).unwrap();
        seq.set_problem(
            State::from_vec(vec![0.05, 0.05]),
            State::from_vec(vec![0.95, 0.95]),
            0.05,
        )
        .unwrap();
        assert!(!seq.solve(&mut IterationBudget::new(1000)).unwrap());
        assert!(seq.get_solution().is_none());
    }

    #[test]
    fn test_solved_state_is_monotone() {
        let mut seq = line_square(PlannerKind::Qmp);
        assert!(seq.solve(&mut IterationBudget::new(5000)).unwrap());
        for _ in 0..200 {
            seq.grow_level(1);
            seq.grow_level(0);
            assert!(seq.level_mut(1).unwrap().has_solution());
            assert!(seq.level_mut(0).unwrap().has_solution());
        }
    }

    #[test]
    fn test_stop_level() {
        let mut seq = line_square(PlannerKind::Qrrt);
        assert!(seq.set_stop_level(2).is_err());
        seq.set_stop_level(0).unwrap();
        assert!(seq.solve(&mut IterationBudget::new(5000)).unwrap());
        assert!(seq.level(1).unwrap().graph().is_empty());
        assert_eq!(seq.get_solution().unwrap().last(), Some(&State::from_vec(vec![0.95])));
    }

    #[test]
    fn test_se2_over_r2_around_obstacle() {
        let _ = env_logger::builder().is_test(true).try_init();
        let bounds = RealVectorBounds::uniform(2, 0.0, 1.0);
        let obstacle = SphereObstacle::new(vec![0.5, 0.5], 0.2);
        let base = SpaceInformation::with_checker(
            StateSpace::real_vector(bounds.clone()),
            SphereObstacleChecker::new(vec![obstacle.clone()], 0.02),
        );
        let bundle = SpaceInformation::with_checker(
            StateSpace::SE2(bounds),
            SphereObstacleChecker::new(vec![obstacle], 0.02),
        );
        let mut seq = BundleSpaceSequence::new(
            vec![base, bundle],
            PlannerKind::Qrrt,
            BundleSpaceGraphConfig {
                seed: 3,
                ..Default::default()
            },
        )
        .unwrap();
        seq.set_importance(Importance::LevelNormalized { base: 2.0 });
        assert_eq!(seq.level(1).unwrap().graph().space().component_name(), "SE2_R2");
        seq.set_problem(
            State::from_vec(vec![0.1, 0.1, 0.0]),
            State::from_vec(vec![0.9, 0.9, 1.0]),
            0.05,
        )
        .unwrap();
        assert!(seq.solve(&mut IterationBudget::new(20000)).unwrap());
        let path = seq.get_solution().unwrap();
        let si = seq.level(1).unwrap().graph().bundle().clone();
        for w in path.states.windows(2) {
            assert!(si.check_motion(&w[0], &w[1]));
        }
    }

    #[test]
    fn test_clear_restarts() {
        let mut seq = line_square(PlannerKind::Qrrt);
        assert!(seq.solve(&mut IterationBudget::new(5000)).unwrap());
        seq.clear();
        assert!(seq.stats().iter().all(|s| s.vertices == 0 && !s.solved));
        assert!(seq.solve(&mut IterationBudget::new(5000)).unwrap());
    }
}
