//! Compound bundle: one child component per bundle sub-space, applied in
//! order on consecutive coordinate ranges.

use std::ops::Range;

use super::BundleSpaceComponent;
use crate::space::StateSpace;

#[derive(Debug)]
struct CompoundPart {
    component: Box<dyn BundleSpaceComponent>,
    bundle: Range<usize>,
    base: Range<usize>,
    fiber: Range<usize>,
}

#[derive(Debug)]
pub struct CompoundComponent {
    bundle: StateSpace,
    base: StateSpace,
    fiber: StateSpace,
    parts: Vec<CompoundPart>,
}

impl CompoundComponent {
    /// `children[i]` splits the i-th bundle sub-space. Children with an empty
    /// base must come after all children that project onto a base part.
    pub fn new(bundle: StateSpace, base: StateSpace, children: Vec<Box<dyn BundleSpaceComponent>>) -> Self {
        let mut parts = Vec::with_capacity(children.len());
        let mut fibers = Vec::new();
        let (mut bundle_at, mut base_at, mut fiber_at) = (0, 0, 0);
        for component in children {
            let bundle_len = component.bundle_space().coordinate_len();
            let base_len = component.base_space().coordinate_len();
            let fiber_len = component.fiber_space().coordinate_len();
            if fiber_len > 0 {
                fibers.push(component.fiber_space().clone());
            }
            parts.push(CompoundPart {
                component,
                bundle: bundle_at..bundle_at + bundle_len,
                base: base_at..base_at + base_len,
                fiber: fiber_at..fiber_at + fiber_len,
            });
            bundle_at += bundle_len;
            base_at += base_len;
            fiber_at += fiber_len;
        }
        let fiber = match fibers.len() {
            0 => StateSpace::empty(),
            1 => fibers.remove(0),
            _ => StateSpace::compound(fibers),
        };
        CompoundComponent {
            bundle,
            base,
            fiber,
            parts,
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl BundleSpaceComponent for CompoundComponent {
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
        self.parts
            .iter()
            .map(|p| p.component.type_name())
            .collect::<Vec<_>>()
            .join("|")
    }

    fn project_base(&self, bundle: &[f64], base: &mut [f64]) {
        for p in &self.parts {
            p.component
                .project_base(&bundle[p.bundle.clone()], &mut base[p.base.clone()]);
        }
    }

    fn project_fiber(&self, bundle: &[f64], fiber: &mut [f64]) {
        for p in &self.parts {
            p.component
                .project_fiber(&bundle[p.bundle.clone()], &mut fiber[p.fiber.clone()]);
        }
    }

    fn lift_state(&self, base: &[f64], fiber: &[f64], bundle: &mut [f64]) {
        for p in &self.parts {
            p.component.lift_state(
                &base[p.base.clone()],
                &fiber[p.fiber.clone()],
                &mut bundle[p.bundle.clone()],
            );
        }
    }
}
