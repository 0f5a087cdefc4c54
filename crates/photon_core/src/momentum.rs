//! Linear and angular momentum decomposition in display units.

use crate::directions::is_finite;
use crate::fields::torus_frame;
use crate::params::MIN_RADIUS;
use crate::traits::Vec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Display-scale knob for the lemniscate normalization. Not a physical constant.
pub const LEMNISCATE_MOMENTUM_SCALE: f64 = 10.0;

/// Positions this close to the vertical axis get no lemniscate component.
const AXIS_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumSample {
    pub linear: Vec3,
    /// Toroidal (torus) or lemniscate (S/C curves) angular momentum.
    pub first_angular: Vec3,
    /// Poloidal angular momentum.
    pub second_angular: Vec3,
    /// `first_angular + second_angular`.
    pub total: Vec3,
}

impl MomentumSample {
    pub fn zero() -> Self {
        Self {
            linear: Vec3::zeros(),
            first_angular: Vec3::zeros(),
            second_angular: Vec3::zeros(),
            total: Vec3::zeros(),
        }
    }

    pub fn is_finite(&self) -> bool {
        is_finite(&self.linear)
            && is_finite(&self.first_angular)
            && is_finite(&self.second_angular)
            && is_finite(&self.total)
    }

    fn from_components(position: &Vec3, first: Vec3, second: Vec3) -> Self {
        let first_angular = position.cross(&first);
        let second_angular = position.cross(&second);
        Self {
            linear: first + second,
            first_angular,
            second_angular,
            total: first_angular + second_angular,
        }
    }
}

pub fn torus_normalization(major_radius: f64) -> f64 {
    1.0 / major_radius.max(MIN_RADIUS)
}

pub fn lemniscate_normalization(minor_axis: f64, major_axis: f64) -> f64 {
    LEMNISCATE_MOMENTUM_SCALE / (f64::max(2.0 * minor_axis, major_axis) * 4.0 * PI).max(MIN_RADIUS)
}

/// Splits the scaled velocity along the toroidal and poloidal tangents.
pub fn torus_momentum(position: &Vec3, velocity: &Vec3, major_radius: f64) -> MomentumSample {
    let k = torus_normalization(major_radius);
    let p = velocity * k;
    let r = position * k;
    let (e_u, e_v, _) = torus_frame(position, major_radius);
    let toroidal = e_u * p.dot(&e_u);
    let poloidal = e_v * p.dot(&e_v);
    let mut sample = MomentumSample::from_components(&r, toroidal, poloidal);
    // Linear momentum keeps any residual along the normal.
    sample.linear = p;
    sample
}

/// Splits the scaled velocity into the swirl about the z axis, `(-y, x, 0)`, and the rest.
pub fn lemniscate_momentum(
    position: &Vec3,
    velocity: &Vec3,
    minor_axis: f64,
    major_axis: f64,
) -> MomentumSample {
    let k = lemniscate_normalization(minor_axis, major_axis);
    let p = velocity * k;
    let r = position * k;
    let rho = position.x.hypot(position.y);
    let swirl = if rho < AXIS_EPSILON {
        Vec3::zeros()
    } else {
        let e_phi = Vec3::new(-position.y / rho, position.x / rho, 0.0);
        e_phi * p.dot(&e_phi)
    };
    let poloidal = p - swirl;
    MomentumSample::from_components(&r, swirl, poloidal)
}
