//! Concrete state spaces: real vectors, planar and spatial rotations, rigid
//! body poses, and compound products of these.
//!
//! All spaces store states as flat coordinate vectors (see [`State`]). The
//! private `*_slice` helpers operate on coordinate slices so that SE(n) and
//! compound spaces can delegate to their parts by offset.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use rand::Rng;
use rand_distr::{Distribution, UnitSphere};

use crate::common::types::{alloc_state, State};
use crate::space::bounds::RealVectorBounds;

/// Weight of the heading term in the SE(2) metric
const SE2_ROTATION_WEIGHT: f64 = 0.5;

/// Wrap an angle to `[-pi, pi)`
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// State space collaborator used by every level of the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub enum StateSpace {
    /// Bounded R^n
    RealVector(RealVectorBounds),
    /// Planar rotation, one coordinate (yaw)
    SO2,
    /// Spatial rotation, unit quaternion `[x, y, z, w]`
    SO3,
    /// Planar pose `[x, y, yaw]`, bounds over `x, y`
    SE2(RealVectorBounds),
    /// Spatial pose `[x, y, z, qx, qy, qz, qw]`, bounds over `x, y, z`
    SE3(RealVectorBounds),
    /// Ordered product of sub-spaces
    Compound(Vec<StateSpace>),
}

impl StateSpace {
    pub fn real_vector(bounds: RealVectorBounds) -> Self {
        StateSpace::RealVector(bounds)
    }

    /// Zero dimensional real vector space, the fiber of an identity projection
    pub fn empty() -> Self {
        StateSpace::RealVector(RealVectorBounds::uniform(0, 0.0, 0.0))
    }

    pub fn compound(subspaces: Vec<StateSpace>) -> Self {
        StateSpace::Compound(subspaces)
    }

    /// Number of degrees of freedom
    pub fn dimension(&self) -> usize {
        match self {
            StateSpace::RealVector(b) => b.dimension(),
            StateSpace::SO2 => 1,
            StateSpace::SO3 => 3,
            StateSpace::SE2(_) => 3,
            StateSpace::SE3(_) => 6,
            StateSpace::Compound(subs) => subs.iter().map(|s| s.dimension()).sum(),
        }
    }

    /// Number of stored coordinates (differs from the dimension for SO(3))
    pub fn coordinate_len(&self) -> usize {
        match self {
            StateSpace::RealVector(b) => b.dimension(),
            StateSpace::SO2 => 1,
            StateSpace::SO3 => 4,
            StateSpace::SE2(_) => 3,
            StateSpace::SE3(_) => 7,
            StateSpace::Compound(subs) => subs.iter().map(|s| s.coordinate_len()).sum(),
        }
    }

    pub fn measure(&self) -> f64 {
        match self {
            StateSpace::RealVector(b) => b.volume(),
            StateSpace::SO2 => 2.0 * PI,
            StateSpace::SO3 => PI * PI,
            StateSpace::SE2(b) => b.volume() * 2.0 * PI,
            StateSpace::SE3(b) => b.volume() * PI * PI,
            StateSpace::Compound(subs) => subs.iter().map(|s| s.measure()).product(),
        }
    }

    /// Largest distance between two states of this space
    pub fn maximum_extent(&self) -> f64 {
        match self {
            StateSpace::RealVector(b) => b.maximum_extent(),
            StateSpace::SO2 => PI,
            StateSpace::SO3 => 0.5 * PI,
            StateSpace::SE2(b) => b.maximum_extent() + SE2_ROTATION_WEIGHT * PI,
            StateSpace::SE3(b) => b.maximum_extent() + 0.5 * PI,
            StateSpace::Compound(subs) => subs.iter().map(|s| s.maximum_extent()).sum(),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, StateSpace::Compound(_))
    }

    /// Ordered sub-spaces; a non-compound space is its own single part
    pub fn subspaces(&self) -> &[StateSpace] {
        match self {
            StateSpace::Compound(subs) => subs,
            other => std::slice::from_ref(other),
        }
    }

    /// Real vector bounds of the translational part, if any
    pub fn bounds(&self) -> Option<&RealVectorBounds> {
        match self {
            StateSpace::RealVector(b) | StateSpace::SE2(b) | StateSpace::SE3(b) => Some(b),
            _ => None,
        }
    }

    /// Structural equality: same kind, same dimension, same sub-space layout.
    /// Bounds are not compared.
    pub fn same_shape(&self, other: &StateSpace) -> bool {
        match (self, other) {
            (StateSpace::RealVector(a), StateSpace::RealVector(b)) => {
                a.dimension() == b.dimension()
            }
            (StateSpace::SO2, StateSpace::SO2)
            | (StateSpace::SO3, StateSpace::SO3)
            | (StateSpace::SE2(_), StateSpace::SE2(_))
            | (StateSpace::SE3(_), StateSpace::SE3(_)) => true,
            (StateSpace::Compound(a), StateSpace::Compound(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_shape(y))
            }
            _ => false,
        }
    }

    /// Short type name used to describe projections, e.g. `SE2` or `R3`
    pub fn type_name(&self) -> String {
        match self {
            StateSpace::RealVector(b) => format!("R{}", b.dimension()),
            StateSpace::SO2 => "SO2".to_string(),
            StateSpace::SO3 => "SO3".to_string(),
            StateSpace::SE2(_) => "SE2".to_string(),
            StateSpace::SE3(_) => "SE3".to_string(),
            StateSpace::Compound(subs) => subs
                .iter()
                .map(|s| s.type_name())
                .collect::<Vec<_>>()
                .join("x"),
        }
    }

    pub fn alloc_state(&self) -> State {
        alloc_state(self.coordinate_len())
    }

    /// Zero translation, zero yaw, unit quaternion
    pub fn identity_state(&self) -> State {
        let mut out = self.alloc_state();
        self.identity_slice(out.as_mut_slice());
        out
    }

    pub fn distance(&self, a: &State, b: &State) -> f64 {
        self.distance_slice(a.as_slice(), b.as_slice())
    }

    /// State at fraction `t` along the geodesic from `from` to `to`
    pub fn interpolate(&self, from: &State, to: &State, t: f64) -> State {
        let mut out = self.alloc_state();
        self.interpolate_slice(from.as_slice(), to.as_slice(), t, out.as_mut_slice());
        out
    }

    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> State {
        let mut out = self.alloc_state();
        self.sample_uniform_slice(rng, out.as_mut_slice());
        out
    }

    /// Sample within distance `distance` of `near` (per part), kept in bounds
    pub fn sample_uniform_near<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        near: &State,
        distance: f64,
    ) -> State {
        let mut out = self.alloc_state();
        self.sample_near_slice(rng, near.as_slice(), distance, out.as_mut_slice());
        out
    }

    pub fn enforce_bounds(&self, state: &mut State) {
        self.enforce_slice(state.as_mut_slice());
    }

    pub fn satisfies_bounds(&self, state: &State) -> bool {
        state.len() == self.coordinate_len() && self.satisfies_slice(state.as_slice())
    }

    fn sub_offsets(subs: &[StateSpace]) -> Vec<(usize, usize)> {
        let mut offset = 0;
        subs.iter()
            .map(|s| {
                let range = (offset, offset + s.coordinate_len());
                offset = range.1;
                range
            })
            .collect()
    }

    fn identity_slice(&self, out: &mut [f64]) {
        match self {
            StateSpace::RealVector(_) | StateSpace::SO2 | StateSpace::SE2(_) => {
                out.iter_mut().for_each(|x| *x = 0.0)
            }
            StateSpace::SO3 => out.copy_from_slice(&[0.0, 0.0, 0.0, 1.0]),
            StateSpace::SE3(_) => {
                out[..3].iter_mut().for_each(|x| *x = 0.0);
                out[3..7].copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
            }
            StateSpace::Compound(subs) => {
                for (s, (lo, hi)) in subs.iter().zip(Self::sub_offsets(subs)) {
                    s.identity_slice(&mut out[lo..hi]);
                }
            }
        }
    }

    fn distance_slice(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            StateSpace::RealVector(_) => euclidean(a, b),
            StateSpace::SO2 => wrap_angle(b[0] - a[0]).abs(),
            StateSpace::SO3 => so3_distance(a, b),
            StateSpace::SE2(_) => {
                euclidean(&a[..2], &b[..2]) + SE2_ROTATION_WEIGHT * wrap_angle(b[2] - a[2]).abs()
            }
            StateSpace::SE3(_) => euclidean(&a[..3], &b[..3]) + so3_distance(&a[3..7], &b[3..7]),
            StateSpace::Compound(subs) => subs
                .iter()
                .zip(Self::sub_offsets(subs))
                .map(|(s, (lo, hi))| s.distance_slice(&a[lo..hi], &b[lo..hi]))
                .sum(),
        }
    }

    fn interpolate_slice(&self, from: &[f64], to: &[f64], t: f64, out: &mut [f64]) {
        match self {
            StateSpace::RealVector(_) => lerp(from, to, t, out),
            StateSpace::SO2 => out[0] = so2_interpolate(from[0], to[0], t),
            StateSpace::SO3 => so3_slerp(from, to, t, out),
            StateSpace::SE2(_) => {
                lerp(&from[..2], &to[..2], t, &mut out[..2]);
                out[2] = so2_interpolate(from[2], to[2], t);
            }
            StateSpace::SE3(_) => {
                lerp(&from[..3], &to[..3], t, &mut out[..3]);
                so3_slerp(&from[3..7], &to[3..7], t, &mut out[3..7]);
            }
            StateSpace::Compound(subs) => {
                for (s, (lo, hi)) in subs.iter().zip(Self::sub_offsets(subs)) {
                    s.interpolate_slice(&from[lo..hi], &to[lo..hi], t, &mut out[lo..hi]);
                }
            }
        }
    }

    fn sample_uniform_slice<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        match self {
            StateSpace::RealVector(b) => sample_box(rng, b, out),
            StateSpace::SO2 => out[0] = rng.gen_range(-PI..PI),
            StateSpace::SO3 => so3_sample_uniform(rng, out),
            StateSpace::SE2(b) => {
                sample_box(rng, b, &mut out[..2]);
                out[2] = rng.gen_range(-PI..PI);
            }
            StateSpace::SE3(b) => {
                sample_box(rng, b, &mut out[..3]);
                so3_sample_uniform(rng, &mut out[3..7]);
            }
            StateSpace::Compound(subs) => {
                for (s, (lo, hi)) in subs.iter().zip(Self::sub_offsets(subs)) {
                    s.sample_uniform_slice(rng, &mut out[lo..hi]);
                }
            }
        }
    }

    fn sample_near_slice<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        near: &[f64],
        distance: f64,
        out: &mut [f64],
    ) {
        match self {
            StateSpace::RealVector(b) => sample_box_near(rng, b, near, distance, out),
            StateSpace::SO2 => out[0] = so2_sample_near(rng, near[0], distance),
            StateSpace::SO3 => so3_sample_near(rng, near, distance, out),
            StateSpace::SE2(b) => {
                sample_box_near(rng, b, &near[..2], distance, &mut out[..2]);
                out[2] = so2_sample_near(rng, near[2], distance);
            }
            StateSpace::SE3(b) => {
                sample_box_near(rng, b, &near[..3], distance, &mut out[..3]);
                so3_sample_near(rng, &near[3..7], distance, &mut out[3..7]);
            }
            StateSpace::Compound(subs) => {
                for (s, (lo, hi)) in subs.iter().zip(Self::sub_offsets(subs)) {
                    s.sample_near_slice(rng, &near[lo..hi], distance, &mut out[lo..hi]);
                }
            }
        }
    }

    fn enforce_slice(&self, coords: &mut [f64]) {
        match self {
            StateSpace::RealVector(b) => b.clamp(coords),
            StateSpace::SO2 => coords[0] = wrap_angle(coords[0]),
            StateSpace::SO3 => normalize_quaternion(coords),
            StateSpace::SE2(b) => {
                b.clamp(&mut coords[..2]);
                coords[2] = wrap_angle(coords[2]);
            }
            StateSpace::SE3(b) => {
                b.clamp(&mut coords[..3]);
                normalize_quaternion(&mut coords[3..7]);
            }
            StateSpace::Compound(subs) => {
                for (s, (lo, hi)) in subs.iter().zip(Self::sub_offsets(subs)) {
                    s.enforce_slice(&mut coords[lo..hi]);
                }
            }
        }
    }

    fn satisfies_slice(&self, coords: &[f64]) -> bool {
        match self {
            StateSpace::RealVector(b) => b.contains(coords),
            StateSpace::SO2 => coords[0] >= -PI && coords[0] <= PI,
            StateSpace::SO3 => is_unit(coords),
            StateSpace::SE2(b) => b.contains(&coords[..2]) && coords[2].abs() <= PI,
            StateSpace::SE3(b) => b.contains(&coords[..3]) && is_unit(&coords[3..7]),
            StateSpace::Compound(subs) => subs
                .iter()
                .zip(Self::sub_offsets(subs))
                .all(|(s, (lo, hi))| s.satisfies_slice(&coords[lo..hi])),
        }
    }
}

impl fmt::Display for StateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn lerp(from: &[f64], to: &[f64], t: f64, out: &mut [f64]) {
    for ((o, a), b) in out.iter_mut().zip(from.iter()).zip(to.iter()) {
        *o = a + t * (b - a);
    }
}

fn sample_box<R: Rng + ?Sized>(rng: &mut R, bounds: &RealVectorBounds, out: &mut [f64]) {
    for (x, (lo, hi)) in out.iter_mut().zip(bounds.low.iter().zip(bounds.high.iter())) {
        *x = lo + rng.gen::<f64>() * (hi - lo);
    }
}

fn sample_box_near<R: Rng + ?Sized>(
    rng: &mut R,
    bounds: &RealVectorBounds,
    near: &[f64],
    distance: f64,
    out: &mut [f64],
) {
    for (i, x) in out.iter_mut().enumerate() {
        let lo = (near[i] - distance).max(bounds.low[i]);
        let hi = (near[i] + distance).min(bounds.high[i]);
        *x = lo + rng.gen::<f64>() * (hi - lo).max(0.0);
    }
}

fn so2_interpolate(from: f64, to: f64, t: f64) -> f64 {
    wrap_angle(from + t * wrap_angle(to - from))
}

fn so2_sample_near<R: Rng + ?Sized>(rng: &mut R, near: f64, distance: f64) -> f64 {
    let d = distance.min(PI);
    wrap_angle(near + (2.0 * rng.gen::<f64>() - 1.0) * d)
}

fn to_unit_quaternion(coords: &[f64]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(coords[3], coords[0], coords[1], coords[2]))
}

fn write_quaternion(q: &UnitQuaternion<f64>, out: &mut [f64]) {
    out[0] = q.i;
    out[1] = q.j;
    out[2] = q.k;
    out[3] = q.w;
}

fn dot4(a: &[f64], b: &[f64]) -> f64 {
    a[..4].iter().zip(b[..4].iter()).map(|(x, y)| x * y).sum()
}

fn so3_distance(a: &[f64], b: &[f64]) -> f64 {
    dot4(a, b).abs().min(1.0).acos()
}

/// Spherical interpolation along the shorter arc
fn so3_slerp(from: &[f64], to: &[f64], t: f64, out: &mut [f64]) {
    let mut dot = dot4(from, to);
    let sign = if dot < 0.0 { -1.0 } else { 1.0 };
    dot *= sign;
    if dot > 0.9995 {
        for i in 0..4 {
            out[i] = from[i] + t * (sign * to[i] - from[i]);
        }
        normalize_quaternion(out);
        return;
    }
    let theta = dot.acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    for i in 0..4 {
        out[i] = wa * from[i] + wb * sign * to[i];
    }
}

/// Uniform rotation (Shoemake's subgroup algorithm)
fn so3_sample_uniform<R: Rng + ?Sized>(rng: &mut R, out: &mut [f64]) {
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen();
    let u3: f64 = rng.gen();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    out[0] = a * (2.0 * PI * u2).sin();
    out[1] = a * (2.0 * PI * u2).cos();
    out[2] = b * (2.0 * PI * u3).sin();
    out[3] = b * (2.0 * PI * u3).cos();
}

// The metric is half the rotation angle, so a rotation of up to 2d stays within d.
fn so3_sample_near<R: Rng + ?Sized>(rng: &mut R, near: &[f64], distance: f64, out: &mut [f64]) {
    let axis: [f64; 3] = UnitSphere.sample(rng);
    let angle = rng.gen::<f64>() * (2.0 * distance).min(PI);
    let delta = UnitQuaternion::from_axis_angle(
        &Unit::new_normalize(Vector3::new(axis[0], axis[1], axis[2])),
        angle,
    );
    let q = to_unit_quaternion(near) * delta;
    write_quaternion(&q, out);
}

fn normalize_quaternion(coords: &mut [f64]) {
    let norm = dot4(coords, coords).sqrt();
    if norm < 1e-12 {
        coords[..4].copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
    } else {
        coords[..4].iter_mut().for_each(|x| *x /= norm);
    }
}

fn is_unit(coords: &[f64]) -> bool {
    (dot4(coords, coords).sqrt() - 1.0).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn se2() -> StateSpace {
        StateSpace::SE2(RealVectorBounds::uniform(2, -1.0, 1.0))
    }

    #[test]
    fn test_dimensions_and_coordinates() {
        let se3 = StateSpace::SE3(RealVectorBounds::uniform(3, 0.0, 1.0));
        assert_eq!(se3.dimension(), 6);
        assert_eq!(se3.coordinate_len(), 7);
        let c = StateSpace::compound(vec![
            se2(),
            StateSpace::real_vector(RealVectorBounds::uniform(4, 0.0, 1.0)),
        ]);
        assert_eq!(c.dimension(), 7);
        assert_eq!(c.coordinate_len(), 7);
        assert_eq!(c.type_name(), "SE2xR4");
    }

    #[test]
    fn test_measures() {
        assert_relative_eq!(StateSpace::SO2.measure(), 2.0 * PI);
        assert_relative_eq!(StateSpace::SO3.measure(), PI * PI);
        assert_relative_eq!(se2().measure(), 4.0 * 2.0 * PI);
        let unbounded = StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, f64::INFINITY));
        assert!(unbounded.measure().is_infinite());
        assert_eq!(StateSpace::empty().measure(), 1.0);
    }

    #[test]
    fn test_so2_distance_wraps() {
        let a = State::from_vec(vec![PI - 0.1]);
        let b = State::from_vec(vec![-PI + 0.1]);
        assert_relative_eq!(StateSpace::SO2.distance(&a, &b), 0.2, epsilon = 1e-12);
        let mid = StateSpace::SO2.interpolate(&a, &b, 0.5);
        assert_relative_eq!(mid[0].abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn test_so3_interpolation_endpoints() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = StateSpace::SO3.sample_uniform(&mut rng);
        let b = StateSpace::SO3.sample_uniform(&mut rng);
        let start = StateSpace::SO3.interpolate(&a, &b, 0.0);
        let end = StateSpace::SO3.interpolate(&a, &b, 1.0);
        assert!(StateSpace::SO3.distance(&start, &a) < 1e-6);
        assert!(StateSpace::SO3.distance(&end, &b) < 1e-6);
        let mid = StateSpace::SO3.interpolate(&a, &b, 0.5);
        assert!(StateSpace::SO3.satisfies_bounds(&mid));
        assert_relative_eq!(
            StateSpace::SO3.distance(&a, &mid),
            0.5 * StateSpace::SO3.distance(&a, &b),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_samples_satisfy_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let space = StateSpace::compound(vec![
            StateSpace::SE3(RealVectorBounds::uniform(3, -2.0, 2.0)),
            StateSpace::SO2,
            StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0)),
        ]);
        for _ in 0..100 {
            let s = space.sample_uniform(&mut rng);
            assert!(space.satisfies_bounds(&s));
            let n = space.sample_uniform_near(&mut rng, &s, 0.1);
            assert!(space.satisfies_bounds(&n));
        }
    }

    #[test]
    fn test_sample_near_stays_close() {
        let mut rng = StdRng::seed_from_u64(5);
        let space = StateSpace::SO3;
        let center = space.identity_state();
        for _ in 0..50 {
            let s = space.sample_uniform_near(&mut rng, &center, 0.2);
            assert!(space.distance(&center, &s) <= 0.2 + 1e-9);
        }
    }

    #[test]
    fn test_same_shape_ignores_bounds() {
        let a = StateSpace::real_vector(RealVectorBounds::uniform(2, 0.0, 1.0));
        let b = StateSpace::real_vector(RealVectorBounds::uniform(2, -5.0, 5.0));
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&StateSpace::SO2));
        assert!(!se2().same_shape(&StateSpace::compound(vec![se2()])));
    }

    #[test]
    fn test_identity_state() {
        let space = StateSpace::SE3(RealVectorBounds::uniform(3, -1.0, 1.0));
        let id = space.identity_state();
        assert_eq!(id.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
