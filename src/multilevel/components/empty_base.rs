//! Part of a compound bundle that has no counterpart in the base: all of it
//! is fiber.

use super::{lift_prefix, project_suffix, BundleSpaceComponent};
use crate::space::StateSpace;

#[derive(Debug, Clone)]
pub struct EmptyBaseComponent {
    bundle: StateSpace,
    base: StateSpace,
}

impl EmptyBaseComponent {
    pub fn new(bundle: StateSpace) -> Self {
        EmptyBaseComponent {
            bundle,
            base: StateSpace::empty(),
        }
    }
}

impl BundleSpaceComponent for EmptyBaseComponent {
    fn bundle_space(&self) -> &StateSpace {
        &self.bundle
    }

    fn base_space(&self) -> &StateSpace {
        &self.base
    }

    fn fiber_space(&self) -> &StateSpace {
        &self.bundle
    }

    fn type_name(&self) -> String {
        format!("{}_EMPTY", self.bundle.type_name())
    }

    fn project_base(&self, _bundle: &[f64], _base: &mut [f64]) {}

    fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]) {
        project_suffix(bundle, fiber);
    }

    fn lift_state(&self, _base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
        lift_prefix(&[], fiber, bundle);
    }
}
