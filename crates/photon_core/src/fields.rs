//! Electric and magnetic field directions along the photon path.
//!
//! Only directions are modeled: every returned vector is unit length. The three rules are
//! a torus surface normal, the inward gradient of a lobe spheroid, and a transverse field
//! rotating with the curve phase.

use crate::directions::{any_perpendicular, first_transverse, is_finite, project_off, unit};
use crate::params::ParticleType;
use crate::traits::Vec3;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    pub electric: Vec3,
    pub magnetic: Vec3,
}

impl FieldSample {
    pub fn zero() -> Self {
        Self {
            electric: Vec3::zeros(),
            magnetic: Vec3::zeros(),
        }
    }

    pub fn is_finite(&self) -> bool {
        is_finite(&self.electric) && is_finite(&self.magnetic)
    }
}

/// Unit direction of travel, falling back to `fallback` for a stationary photon.
fn travel_direction(velocity: &Vec3, fallback: &Vec3) -> Vec3 {
    unit(velocity).unwrap_or(*fallback)
}

/// Magnetic direction for the lemniscate rules: `t × E` for electrons, `E × t` for positrons.
fn lemniscate_magnetic(tangent: &Vec3, electric: &Vec3, particle: ParticleType) -> Vec3 {
    let raw = match particle {
        ParticleType::Electron => tangent.cross(electric),
        ParticleType::Positron => electric.cross(tangent),
    };
    unit(&raw).unwrap_or_else(|| {
        tracing::trace!("tangent parallel to electric field, using a perpendicular");
        any_perpendicular(electric)
    })
}

/// Unit tangents along the toroidal (`∂/∂u`) and poloidal (`∂/∂v`) directions at `position`,
/// plus the outward surface normal `e_u × e_v`.
pub fn torus_frame(position: &Vec3, major_radius: f64) -> (Vec3, Vec3, Vec3) {
    let u = position.y.atan2(position.x);
    let rho = position.x.hypot(position.y);
    let v = position.z.atan2(rho - major_radius);
    let (su, cu) = u.sin_cos();
    let (sv, cv) = v.sin_cos();
    let e_u = Vec3::new(-su, cu, 0.0);
    let e_v = Vec3::new(-sv * cu, -sv * su, cv);
    let normal = e_u.cross(&e_v);
    (e_u, e_v, normal)
}

/// Torus rule: E along the surface normal (inward for electrons), B in the tangent plane
/// perpendicular to the direction of travel.
pub fn torus_fields(
    position: &Vec3,
    velocity: &Vec3,
    major_radius: f64,
    particle: ParticleType,
) -> FieldSample {
    let (e_u, e_v, normal) = torus_frame(position, major_radius);
    let electric = match particle {
        ParticleType::Electron => -normal,
        ParticleType::Positron => normal,
    };
    let tangent = travel_direction(velocity, &e_u);

    let in_plane = project_off(&electric.cross(&tangent), &normal);
    let magnetic = unit(&in_plane)
        .or_else(|| {
            tracing::trace!("velocity parallel to torus normal, projecting surface basis");
            first_transverse(&tangent, &[e_u, e_v])
        })
        .unwrap_or_else(Vec3::z);

    FieldSample { electric, magnetic }
}

/// S-curve rule: E along the inward gradient of `(x-xc)²/a² + y²/c² + z²/a² = 1` for the
/// lobe selected by the sign of x (center `xc = ±a`), outward for positrons.
///
/// The gradient is taken in the lobe body frame: `precession_angle` is the rotation about y
/// that carries the body frame to the world frame, and E is rotated back afterwards.
pub fn spheroid_fields(
    position: &Vec3,
    velocity: &Vec3,
    minor_axis: f64,
    major_axis: f64,
    precession_angle: f64,
    particle: ParticleType,
) -> FieldSample {
    let precession = Rotation3::from_axis_angle(&Vector3::y_axis(), precession_angle);
    let body = precession.inverse_transform_vector(position);
    let center_x = if body.x < 0.0 { -minor_axis } else { minor_axis };
    let a2 = minor_axis * minor_axis;
    let c2 = major_axis * major_axis;
    let gradient = Vec3::new((body.x - center_x) / a2, body.y / c2, body.z / a2);
    let inward_body = unit(&-gradient).unwrap_or_else(|| Vec3::new(-center_x.signum(), 0.0, 0.0));
    let inward = precession * inward_body;
    let electric = match particle {
        ParticleType::Electron => inward,
        ParticleType::Positron => -inward,
    };
    let tangent = travel_direction(velocity, &any_perpendicular(&electric));
    let magnetic = lemniscate_magnetic(&tangent, &electric, particle);
    FieldSample { electric, magnetic }
}

/// Transverse basis `{I, J}` perpendicular to `tangent`, with `I` the inward direction
/// projected off the tangent. Fallbacks when inward is parallel to the tangent: the
/// horizontal radial direction, then +X, then +Y.
pub fn transverse_basis(position: &Vec3, tangent: &Vec3) -> (Vec3, Vec3) {
    let candidates = [
        -position,
        Vec3::new(-position.x, 0.0, -position.z),
        Vec3::x(),
        Vec3::y(),
    ];
    let i = first_transverse(tangent, &candidates).unwrap_or_else(|| any_perpendicular(tangent));
    let j = tangent.cross(&i);
    (i, j)
}

/// C-curve rule: E rotates in the plane transverse to travel by `phase`
/// (`cos φ · I + sin φ · J`), negated for positrons.
pub fn transverse_fields(
    position: &Vec3,
    velocity: &Vec3,
    phase: f64,
    particle: ParticleType,
) -> FieldSample {
    let tangent = travel_direction(velocity, &Vec3::y());
    let (i, j) = transverse_basis(position, &tangent);
    let (s, c) = phase.sin_cos();
    let rotating = unit(&(i * c + j * s)).unwrap_or(i);
    let electric = match particle {
        ParticleType::Electron => rotating,
        ParticleType::Positron => -rotating,
    };
    let magnetic = lemniscate_magnetic(&tangent, &electric, particle);
    FieldSample { electric, magnetic }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_unit(v: &Vec3) {
        assert!((v.norm() - 1.0).abs() < 1e-6, "not unit: {v:?}");
    }

    #[test]
    fn torus_electric_points_inward_for_electrons() {
        // Outer equator of a torus with M = 2, m = 1.
        let position = Vec3::new(3.0, 0.0, 0.0);
        let velocity = Vec3::new(0.0, 1.0, 1.0);
        let electron = torus_fields(&position, &velocity, 2.0, ParticleType::Electron);
        assert!((electron.electric - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        assert_unit(&electron.magnetic);
        assert!(electron.electric.dot(&electron.magnetic).abs() < 1e-9);

        let positron = torus_fields(&position, &velocity, 2.0, ParticleType::Positron);
        assert!((positron.electric + electron.electric).norm() < 1e-12);
        assert!((positron.magnetic + electron.magnetic).norm() < 1e-12);
    }

    #[test]
    fn torus_magnetic_is_perpendicular_to_travel() {
        // u = π/2, v = π/3 on M = 2, m = 1.
        let position = Vec3::new(0.0, 2.5, (PI / 3.0).sin());
        let velocity = Vec3::new(-1.0, 0.2, 0.4);
        let f = torus_fields(&position, &velocity, 2.0, ParticleType::Electron);
        let tangent = velocity.normalize();
        let (_, _, normal) = torus_frame(&position, 2.0);
        let in_plane = project_off(&tangent, &normal).normalize();
        assert!(f.magnetic.dot(&in_plane).abs() < 1e-9);
        assert!(f.magnetic.dot(&normal).abs() < 1e-9);
    }

    #[test]
    fn torus_degenerate_velocity_still_yields_unit_magnetic() {
        let position = Vec3::new(3.0, 0.0, 0.0);
        // Velocity along the normal.
        let f = torus_fields(&position, &Vec3::new(1.0, 0.0, 0.0), 2.0, ParticleType::Electron);
        assert_unit(&f.magnetic);
        assert!(f.is_finite());
        // Stationary photon.
        let f = torus_fields(&position, &Vec3::zeros(), 2.0, ParticleType::Positron);
        assert_unit(&f.magnetic);
    }

    #[test]
    fn spheroid_gradient_uses_lobe_center() {
        let a = 1.0;
        let c = 2.0;
        // Leftmost point of the left lobe spheroid centered at (-1, 0, 0).
        let position = Vec3::new(-2.0, 0.0, 0.0);
        let velocity = Vec3::new(0.0, 1.0, 0.0);
        let f = spheroid_fields(&position, &velocity, a, c, 0.0, ParticleType::Electron);
        assert!((f.electric - Vec3::x()).norm() < 1e-12);
        // t × E with t = +y, E = +x.
        assert!((f.magnetic - Vec3::y().cross(&Vec3::x())).norm() < 1e-12);

        let right = spheroid_fields(&Vec3::new(2.0, 0.0, 0.0), &velocity, a, c, 0.0, ParticleType::Electron);
        assert!((right.electric + Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn spheroid_gradient_follows_the_precessed_lobe() {
        let (a, c) = (1.0, 2.0);
        let angle = PI / 2.0;
        // Body-frame leftmost point (-2, 0, 0) rotated a quarter turn about y lands on +z.
        let position = Vec3::new(0.0, 0.0, 2.0);
        let velocity = Vec3::new(0.0, 1.0, 0.0);
        let f = spheroid_fields(&position, &velocity, a, c, angle, ParticleType::Electron);
        // Inward on the rotated spheroid centered at (0, 0, 1).
        assert!((f.electric + Vec3::z()).norm() < 1e-12, "{:?}", f.electric);
        assert!(f.electric.dot(&velocity).abs() < 1e-12);
        assert!(f.electric.dot(&f.magnetic).abs() < 1e-12);
    }

    #[test]
    fn lemniscate_particle_swap_flips_electric_only() {
        let position = Vec3::new(-0.5, 1.2, 0.3);
        let velocity = Vec3::new(0.3, -0.4, 1.0);
        let e = spheroid_fields(&position, &velocity, 1.0, 1.5, 0.4, ParticleType::Electron);
        let p = spheroid_fields(&position, &velocity, 1.0, 1.5, 0.4, ParticleType::Positron);
        assert!((e.electric + p.electric).norm() < 1e-12);
        // (-E) × t == t × E
        assert!((e.magnetic - p.magnetic).norm() < 1e-12);
    }

    #[test]
    fn transverse_field_rotates_with_phase() {
        let position = Vec3::new(1.0, 0.0, 0.0);
        let velocity = Vec3::new(0.0, 0.0, 2.0);
        let at_zero = transverse_fields(&position, &velocity, 0.0, ParticleType::Electron);
        assert!((at_zero.electric - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);

        let quarter = transverse_fields(&position, &velocity, PI / 2.0, ParticleType::Electron);
        // J = t × I = z × (-x) = -y
        assert!((quarter.electric - Vec3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
        assert!(quarter.electric.dot(&Vec3::z()).abs() < 1e-12);

        let full = transverse_fields(&position, &velocity, 2.0 * PI, ParticleType::Electron);
        assert!((full.electric - at_zero.electric).norm() < 1e-9);
    }

    #[test]
    fn transverse_basis_falls_back_when_inward_is_parallel() {
        // Inward (-x) is parallel to the tangent; the horizontal radial shares it, so +X is
        // tried next and is also parallel, leaving +Y.
        let position = Vec3::new(2.0, 0.0, 0.0);
        let tangent = Vec3::x();
        let (i, j) = transverse_basis(&position, &tangent);
        assert!((i - Vec3::y()).norm() < 1e-12);
        assert!((j - Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn transverse_fields_are_orthonormal() {
        let position = Vec3::new(0.4, 1.1, -0.2);
        let velocity = Vec3::new(1.0, 0.5, 0.25);
        for particle in [ParticleType::Electron, ParticleType::Positron] {
            let f = transverse_fields(&position, &velocity, 1.234, particle);
            assert_unit(&f.electric);
            assert_unit(&f.magnetic);
            assert!(f.electric.dot(&f.magnetic).abs() < 1e-9);
            assert!(f.electric.dot(&velocity.normalize()).abs() < 1e-9);
        }
    }
}
