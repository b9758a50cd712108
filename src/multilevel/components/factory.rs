//! Picks the projection component for a (Bundle, Base) pair by structural
//! shape. Unknown shapes are rejected.

use log::debug;

use super::{
    BundleSpaceComponent, CompoundComponent, EmptyBaseComponent, IdentityComponent,
    RotationSplitComponent, VectorSplitComponent,
};
use crate::common::error::{PlanningError, PlanningResult};
use crate::space::StateSpace;

fn unsupported(bundle: &StateSpace, base: &StateSpace) -> PlanningError {
    PlanningError::UnsupportedProjection {
        bundle: bundle.type_name(),
        base: base.type_name(),
    }
}

/// Build the component projecting `bundle` onto `base`.
///
/// Patterns, tried in order:
/// 1. same shape: identity
/// 2. `R^n` over `R^m`, `m <= n`
/// 3. `SE2` over `R^2`, `SE3` over `R^3`
/// 4. compound bundle over a base with no more parts: parts are paired in
///    order, trailing bundle parts become pure fiber
pub fn make_component(
    bundle: &StateSpace,
    base: &StateSpace,
) -> PlanningResult<Box<dyn BundleSpaceComponent>> {
    if bundle.same_shape(base) {
        return Ok(Box::new(IdentityComponent::new(bundle.clone(), base.clone())));
    }
    if let (StateSpace::RealVector(nb), StateSpace::RealVector(mb)) = (bundle, base) {
        return Ok(Box::new(VectorSplitComponent::new(nb, mb)?));
    }
    if let Some(c) = RotationSplitComponent::try_new(bundle, base) {
        return Ok(Box::new(c));
    }
    if let StateSpace::Compound(parts) = bundle {
        let base_parts = base.subspaces();
        if base_parts.len() > parts.len() {
            return Err(unsupported(bundle, base));
        }
        let mut children: Vec<Box<dyn BundleSpaceComponent>> = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let child: Box<dyn BundleSpaceComponent> = match base_parts.get(i) {
                Some(base_part) => make_component(part, base_part)?,
                None => Box::new(EmptyBaseComponent::new(part.clone())),
            };
            children.push(child);
        }
        let compound = CompoundComponent::new(bundle.clone(), base.clone(), children);
        debug!(
            "Compound projection {} over {}: {}",
            bundle,
            base,
            compound.type_name()
        );
        return Ok(Box::new(compound));
    }
    Err(unsupported(bundle, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::State;
    use crate::space::RealVectorBounds;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rn(n: usize) -> StateSpace {
        StateSpace::real_vector(RealVectorBounds::uniform(n, -1.0, 1.0))
    }

    fn se2() -> StateSpace {
        StateSpace::SE2(RealVectorBounds::uniform(2, -1.0, 1.0))
    }

    fn se3() -> StateSpace {
        StateSpace::SE3(RealVectorBounds::uniform(3, -1.0, 1.0))
    }

    fn patterns() -> Vec<(StateSpace, StateSpace, &'static str)> {
        vec![
            (rn(2), rn(2), "R2_R2"),
            (se2(), se2(), "SE2_SE2"),
            (rn(5), rn(2), "RN_RM"),
            (se2(), rn(2), "SE2_R2"),
            (se3(), rn(3), "SE3_R3"),
            (
                StateSpace::compound(vec![se2(), rn(3)]),
                se2(),
                "SE2_SE2|R3_EMPTY",
            ),
            (
                StateSpace::compound(vec![se2(), rn(3)]),
                StateSpace::compound(vec![se2(), rn(1)]),
                "SE2_SE2|RN_RM",
            ),
            (
                StateSpace::compound(vec![se2(), rn(2)]),
                rn(2),
                "SE2_R2|R2_EMPTY",
            ),
            (
                StateSpace::compound(vec![se3(), rn(4)]),
                rn(3),
                "SE3_R3|R4_EMPTY",
            ),
            (
                StateSpace::compound(vec![se2(), se3(), rn(4)]),
                StateSpace::compound(vec![rn(2), rn(3), rn(2)]),
                "SE2_R2|SE3_R3|RN_RM",
            ),
        ]
    }

    fn round_trip(bundle: &StateSpace, base: &StateSpace, seed: u64) {
        let c = make_component(bundle, base).unwrap();
        let fiber = c.fiber_space().clone();
        let mut rng = StdRng::seed_from_u64(seed);
        let x = bundle.sample_uniform(&mut rng);
        let mut b = base.alloc_state();
        let mut f = fiber.alloc_state();
        c.project_base(x.as_slice(), b.as_mut_slice());
        c.project_fiber(x.as_slice(), f.as_mut_slice());
        let mut y = bundle.alloc_state();
        c.lift_state(b.as_slice(), f.as_slice(), y.as_mut_slice());
        assert_eq!(x, y);

        // projections of a lifted state give back the inputs exactly
        let b2 = base.sample_uniform(&mut rng);
        let f2 = fiber.sample_uniform(&mut rng);
        let mut z = bundle.alloc_state();
        c.lift_state(b2.as_slice(), f2.as_slice(), z.as_mut_slice());
        let mut b3 = base.alloc_state();
        let mut f3 = fiber.alloc_state();
        c.project_base(z.as_slice(), b3.as_mut_slice());
        c.project_fiber(z.as_slice(), f3.as_mut_slice());
        assert_eq!(b2, b3);
        assert_eq!(f2, f3);
    }

    #[test]
    fn test_pattern_names_and_dimensions() {
        for (bundle, base, name) in patterns() {
            let c = make_component(&bundle, &base).unwrap();
            assert_eq!(c.type_name(), name);
            assert_eq!(
                base.dimension() + c.fiber_space().dimension(),
                bundle.dimension(),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_compound_fiber_space() {
        let bundle = StateSpace::compound(vec![se2(), rn(3)]);
        let c = make_component(&bundle, &rn(2)).unwrap();
        assert_eq!(
            c.fiber_space(),
            &StateSpace::compound(vec![StateSpace::SO2, rn(3)])
        );
        let c = make_component(&bundle, &se2()).unwrap();
        assert_eq!(c.fiber_space(), &rn(3));
    }

    #[test]
    fn test_unsupported_patterns() {
        assert!(matches!(
            make_component(&StateSpace::SO2, &rn(1)),
            Err(PlanningError::UnsupportedProjection { .. })
        ));
        assert!(matches!(
            make_component(&rn(2), &StateSpace::compound(vec![rn(1), rn(1)])),
            Err(PlanningError::UnsupportedProjection { .. })
        ));
        assert!(matches!(
            make_component(&se2(), &rn(3)),
            Err(PlanningError::UnsupportedProjection { .. })
        ));
        assert!(matches!(
            make_component(&rn(1), &rn(2)),
            Err(PlanningError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_identity_lift_is_copy() {
        let c = make_component(&rn(2), &rn(2)).unwrap();
        let base = State::from_vec(vec![0.25, -0.5]);
        let mut out = rn(2).alloc_state();
        c.lift_state(base.as_slice(), &[], out.as_mut_slice());
        assert_eq!(out, base);
    }

    proptest! {
        #[test]
        fn prop_project_lift_round_trip(seed in any::<u64>()) {
            for (bundle, base, _) in patterns() {
                round_trip(&bundle, &base, seed);
            }
        }
    }
}
