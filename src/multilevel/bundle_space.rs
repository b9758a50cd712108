//! One level of the hierarchy: a Bundle space, the Base space of the level
//! below it, and the Fiber that makes up the difference.

use std::fmt;
use std::rc::Rc;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::error::{PlanningError, PlanningResult, SpaceRole};
use crate::common::types::State;
use crate::multilevel::components::{make_component, BundleSpaceComponent};
use crate::space::{SpaceInformation, StateSpace};

/// Scheduling score of a level, higher is grown first
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Importance {
    /// `1 / (N + 1)` with N the number of vertices
    InverseVertexCount,
    /// `1 / (N / base^level + 1)`: finer levels tolerate larger graphs
    LevelNormalized { base: f64 },
}

impl Default for Importance {
    fn default() -> Self {
        Importance::InverseVertexCount
    }
}

impl Importance {
    pub fn evaluate(&self, vertices: usize, level: usize) -> f64 {
        let n = vertices as f64;
        match *self {
            Importance::InverseVertexCount => 1.0 / (n + 1.0),
            Importance::LevelNormalized { base } => 1.0 / (n / base.powi(level as i32) + 1.0),
        }
    }
}

fn check_measure(role: SpaceRole, space: &StateSpace) -> PlanningResult<()> {
    let measure = space.measure();
    let dimension = space.dimension();
    if !measure.is_finite() {
        return Err(PlanningError::InfiniteMeasure {
            role,
            dimension,
            measure,
        });
    }
    if measure <= 0.0 {
        return Err(PlanningError::ZeroMeasure {
            role,
            dimension,
            measure,
        });
    }
    Ok(())
}

pub struct BundleSpace {
    id: usize,
    level: usize,
    bundle: Rc<SpaceInformation>,
    base: Option<Rc<SpaceInformation>>,
    component: Option<Box<dyn BundleSpaceComponent>>,
    rng: StdRng,
    importance: Importance,
}

impl BundleSpace {
    /// Build level `level` over `bundle`, projecting onto `base` when the
    /// level has a parent. Fails on unbounded or degenerate spaces and on
    /// (Bundle, Base) pairs no component supports.
    pub fn new(
        id: usize,
        level: usize,
        bundle: Rc<SpaceInformation>,
        base: Option<Rc<SpaceInformation>>,
        seed: u64,
    ) -> PlanningResult<Self> {
        check_measure(SpaceRole::Bundle, bundle.space())?;

        let component = match &base {
            Some(base) => {
                check_measure(SpaceRole::Base, base.space())?;
                let component = make_component(bundle.space(), base.space())?;
                let fiber = component.fiber_space();
                check_measure(SpaceRole::Fiber, fiber)?;
                let (nb, nf, n) = (base.dimension(), fiber.dimension(), bundle.dimension());
                if nb + nf != n {
                    return Err(PlanningError::DimensionMismatch {
                        base: nb,
                        fiber: nf,
                        bundle: n,
                    });
                }
                debug!(
                    "BundleSpace {} (level {}): {} = {} x {} [{}]",
                    id,
                    level,
                    bundle.space(),
                    base.space(),
                    fiber,
                    component.type_name()
                );
                Some(component)
            }
            None => {
                debug!(
                    "BundleSpace {} (level {}): root over {}, measure {}",
                    id,
                    level,
                    bundle.space(),
                    bundle.space().measure()
                );
                None
            }
        };

        Ok(BundleSpace {
            id,
            level,
            bundle,
            base,
            component,
            rng: StdRng::seed_from_u64(seed),
            importance: Importance::default(),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn bundle(&self) -> &Rc<SpaceInformation> {
        &self.bundle
    }

    pub fn bundle_space(&self) -> &StateSpace {
        self.bundle.space()
    }

    pub fn base(&self) -> Option<&Rc<SpaceInformation>> {
        self.base.as_ref()
    }

    pub fn has_parent(&self) -> bool {
        self.base.is_some()
    }

    pub fn fiber_space(&self) -> Option<&StateSpace> {
        self.component.as_ref().map(|c| c.fiber_space())
    }

    pub fn fiber_dimension(&self) -> usize {
        self.fiber_space().map_or(0, |f| f.dimension())
    }

    pub fn bundle_dimension(&self) -> usize {
        self.bundle.dimension()
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn set_importance(&mut self, importance: Importance) {
        self.importance = importance;
    }

    pub fn importance(&self, vertices: usize) -> f64 {
        self.importance.evaluate(vertices, self.level)
    }

    /// Names of the projection components, `|` separated
    pub fn component_name(&self) -> String {
        match &self.component {
            Some(c) => c.type_name(),
            None => self.bundle.space().type_name(),
        }
    }

    pub fn is_valid(&self, state: &State) -> bool {
        self.bundle.is_valid(state)
    }

    /// Base part of a bundle state. No-op at the root level.
    pub fn project_base(&self, bundle: &State, base: &mut State) {
        if let Some(c) = &self.component {
            c.project_base(bundle.as_slice(), base.as_mut_slice());
        }
    }

    pub fn project_fiber(&self, bundle: &State, fiber: &mut State) {
        if let Some(c) = &self.component {
            c.project_fiber(bundle.as_slice(), fiber.as_mut_slice());
        }
    }

    /// Combine base and fiber coordinates into `bundle`
    pub fn lift_state(&self, base: &State, fiber: &State, bundle: &mut State) {
        if let Some(c) = &self.component {
            c.lift_state(base.as_slice(), fiber.as_slice(), bundle.as_mut_slice());
        }
    }

    pub fn alloc_base_state(&self) -> Option<State> {
        self.base.as_ref().map(|b| b.space().alloc_state())
    }

    pub fn alloc_fiber_state(&self) -> Option<State> {
        self.fiber_space().map(|f| f.alloc_state())
    }

    /// Lift `base` with a uniform fiber sample. With an empty fiber the
    /// result is `base` itself, lifted through the identity.
    pub fn lift_from_base(&mut self, base: &State, bundle: &mut State) {
        let fiber = match &self.component {
            Some(c) if c.fiber_space().dimension() > 0 => c.fiber_space().sample_uniform(&mut self.rng),
            Some(c) => c.fiber_space().alloc_state(),
            None => return,
        };
        self.lift_state(base, &fiber, bundle);
    }

    pub fn sample_uniform_fiber(&mut self) -> Option<State> {
        match &self.component {
            Some(c) => Some(c.fiber_space().sample_uniform(&mut self.rng)),
            None => None,
        }
    }
}

impl fmt::Display for BundleSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Level {} | id {}] {} ({})",
            self.level,
            self.id,
            self.bundle.space(),
            self.component_name()
        )
    }
}

impl fmt::Debug for BundleSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::RealVectorBounds;

    fn si(space: StateSpace) -> Rc<SpaceInformation> {
        Rc::new(SpaceInformation::unconstrained(space))
    }

    fn rn(n: usize) -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(n, 0.0, 1.0))
    }

    #[test]
    fn test_root_level() {
        let space = BundleSpace::new(0, 0, si(rn(2)), None, 1).unwrap();
        assert!(!space.has_parent());
        assert_eq!(space.fiber_dimension(), 0);
        assert_eq!(space.component_name(), "R2");
    }

    #[test]
    fn test_infinite_measure_rejected() {
        let unbounded = StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, f64::INFINITY));
        let err = BundleSpace::new(0, 0, si(unbounded), None, 1).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::InfiniteMeasure {
                role: SpaceRole::Bundle,
                dimension: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_measure_rejected() {
        let flat = StateSpace::real_vector(RealVectorBounds::new(vec![0.0, 0.0], vec![1.0, 0.0]));
        let err = BundleSpace::new(1, 1, si(flat), Some(si(rn(1))), 1).unwrap_err();
        assert!(matches!(err, PlanningError::ZeroMeasure { role: SpaceRole::Bundle, .. }));

        let flat_base = StateSpace::real_vector(RealVectorBounds::new(vec![0.5], vec![0.5]));
        let err = BundleSpace::new(1, 1, si(rn(2)), Some(si(flat_base)), 1).unwrap_err();
        assert!(matches!(err, PlanningError::ZeroMeasure { role: SpaceRole::Base, .. }));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = BundleSpace::new(1, 1, si(rn(1)), Some(si(rn(2))), 1).unwrap_err();
        assert!(matches!(err, PlanningError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_project_lift_through_level() {
        let mut space = BundleSpace::new(1, 1, si(rn(3)), Some(si(rn(1))), 4).unwrap();
        assert_eq!(space.fiber_dimension(), 2);
        let base = State::from_vec(vec![0.25]);
        let mut x = rn(3).alloc_state();
        space.lift_from_base(&base, &mut x);
        let mut b = space.alloc_base_state().unwrap();
        space.project_base(&x, &mut b);
        assert_eq!(b, base);
        assert_eq!(space.component_name(), "RN_RM");
    }

    #[test]
    fn test_importance_strategies() {
        assert_eq!(Importance::InverseVertexCount.evaluate(3, 0), 0.25);
        let normalized = Importance::LevelNormalized { base: 2.0 };
        assert_eq!(normalized.evaluate(4, 1), 1.0 / 3.0);
        assert!(normalized.evaluate(4, 2) > normalized.evaluate(4, 1));
    }
}
