//! Bundle and Base of the same shape: the fiber is a single point

use super::{lift_prefix, project_prefix, BundleSpaceComponent};
use crate::space::StateSpace;

#[derive(Debug, Clone)]
pub struct IdentityComponent {
    bundle: StateSpace,
    base: StateSpace,
    fiber: StateSpace,
}

impl IdentityComponent {
    pub fn new(bundle: StateSpace, base: StateSpace) -> Self {
        IdentityComponent {
            bundle,
            base,
            fiber: StateSpace::empty(),
        }
    }
}

impl BundleSpaceComponent for IdentityComponent {
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
        let name = self.bundle.type_name();
        format!("{}_{}", name, name)
    }

    fn project_base(&self, bundle: &[f64], base: &mut [f64]) {
        project_prefix(bundle, base);
    }

    fn project_fiber(&self, _bundle: &[f64], _fiber: &mut [f64]) {}

    fn lift_state(&self, base: &[f64], _fiber: &[f64], bundle: &mut [f64]) {
        lift_prefix(base, &[], bundle);
    }
}
