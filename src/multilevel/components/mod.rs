//! Projection and lift strategies between a Bundle space and its Base.
//!
//! Each component knows one structural pattern of (Bundle, Base) pair and
//! how to split a Bundle state into Base and Fiber coordinates and back.
//! Components work on coordinate slices so that a compound component can
//! hand each child its own sub-slice. All operations are plain copies and
//! round trip bit for bit.

use std::fmt;

use crate::space::StateSpace;

pub mod compound;
pub mod empty_base;
pub mod factory;
pub mod identity;
pub mod rotation_split;
pub mod vector_split;

pub use compound::CompoundComponent;
pub use empty_base::EmptyBaseComponent;
pub use factory::make_component;
pub use identity::IdentityComponent;
pub use rotation_split::RotationSplitComponent;
pub use vector_split::VectorSplitComponent;

pub trait BundleSpaceComponent: fmt::Debug {
    fn bundle_space(&self) -> &StateSpace;

    fn base_space(&self) -> &StateSpace;

    /// Complement of the base inside the bundle
    fn fiber_space(&self) -> &StateSpace;

    /// Pattern name, e.g. `SE2_R2`
    fn type_name(&self) -> String;

    fn project_base(&self, bundle: &[f64], base: &mut [f64]);

    fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]);

    fn lift_state(&self, base: &[f64], fiber: &[f64], bundle: &mut [f64]);
}

// Layout shared by the leaf patterns: base coordinates are a prefix of the
// bundle coordinates, fiber coordinates the remaining suffix.

pub(crate) fn project_prefix(bundle: &[f64], base: &mut [f64]) {
    let n = base.len();
    base.copy_from_slice(&bundle[..n]);
}

pub(crate) fn project_suffix(bundle: &[f64], fiber: &mut [f64]) {
    let n = bundle.len() - fiber.len();
    fiber.copy_from_slice(&bundle[n..]);
}

pub(crate) fn lift_prefix(base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
    let n = base.len();
    bundle[..n].copy_from_slice(base);
    bundle[n..].copy_from_slice(fiber);
}
