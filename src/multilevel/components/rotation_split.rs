//! SE(2) over R^2 and SE(3) over R^3: the fiber is the rotation

use super::{lift_prefix, project_prefix, project_suffix, BundleSpaceComponent};
use crate::space::StateSpace;

#[derive(Debug, Clone)]
pub struct RotationSplitComponent {
    bundle: StateSpace,
    base: StateSpace,
    fiber: StateSpace,
}

impl RotationSplitComponent {
    /// Returns `None` unless the pair is SE(2)/R^2 or SE(3)/R^3
    pub fn try_new(bundle: &StateSpace, base: &StateSpace) -> Option<Self> {
        let fiber = match (bundle, base) {
            (StateSpace::SE2(_), StateSpace::RealVector(b)) if b.dimension() == 2 => StateSpace::SO2,
            (StateSpace::SE3(_), StateSpace::RealVector(b)) if b.dimension() == 3 => StateSpace::SO3,
            _ => return None,
        };
        Some(RotationSplitComponent {
            bundle: bundle.clone(),
            base: base.clone(),
            fiber,
        })
    }
}

impl BundleSpaceComponent for RotationSplitComponent {
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
        format!("{}_{}", self.bundle.type_name(), self.base.type_name())
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
