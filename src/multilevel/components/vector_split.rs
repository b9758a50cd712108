//! R^n over R^m (m < n): the base keeps the first m coordinates

use super::{lift_prefix, project_prefix, project_suffix, BundleSpaceComponent};
use crate::common::error::{PlanningError, PlanningResult};
use crate::space::{RealVectorBounds, StateSpace};

#[derive(Debug, Clone)]
pub struct VectorSplitComponent {
    bundle: StateSpace,
    base: StateSpace,
    fiber: StateSpace,
}

impl VectorSplitComponent {
    pub fn new(bundle_bounds: &RealVectorBounds, base_bounds: &RealVectorBounds) -> PlanningResult<Self> {
        let n = bundle_bounds.dimension();
        let m = base_bounds.dimension();
        if m > n {
            return Err(PlanningError::DimensionMismatch {
                base: m,
                fiber: 0,
                bundle: n,
            });
        }
        Ok(VectorSplitComponent {
            bundle: StateSpace::RealVector(bundle_bounds.clone()),
            base: StateSpace::RealVector(base_bounds.clone()),
            fiber: StateSpace::RealVector(bundle_bounds.slice(m, n)),
        })
    }
}

impl BundleSpaceComponent for VectorSplitComponent {
    fn bundle_space(&self) -> &StateSpace {
        &self.bundle
    }

    fn base_space(&self) -> &StateSpace {
        &self.base
    }

    fn fiber_space(&self) -> &StateSpace {
        &self.fiber
    }

    fn type_name(&self) -> String {
        "RN_RM".to_string()
    }

    fn project_base(&self, bundle: &[f64], base: &mut [f64]) {
        project_prefix(bundle, base);
    }

    fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]) {
        project_suffix(bundle, fiber);
    }

    fn lift_state(&self, base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
        lift_prefix(base, fiber, bundle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiber_bounds_are_trailing_axes() {
        let bundle = RealVectorBounds::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]);
        let base = RealVectorBounds::uniform(1, 0.0, 1.0);
        let c = VectorSplitComponent::new(&bundle, &base).unwrap();
        assert_eq!(c.fiber_space(), &StateSpace::RealVector(bundle.slice(1, 3)));
    }

    #[test]
    fn test_base_larger_than_bundle() {
        let bundle = RealVectorBounds::uniform(2, 0.0, 1.0);
        let base = RealVectorBounds::uniform(3, 0.0, 1.0);
        assert!(matches!(
            VectorSplitComponent::new(&bundle, &base),
            Err(PlanningError::DimensionMismatch { base: 3, .. })
        ));
    }
}
