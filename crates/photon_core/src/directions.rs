//! Unit-direction helpers shared by the field and momentum rules.

use crate::traits::Vec3;

/// Squared-norm threshold below which a direction is treated as degenerate.
pub const DEGENERATE_NORM: f64 = 1e-12;

pub fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Normalized copy of `v`, or `None` when it is too short or not finite.
pub fn unit(v: &Vec3) -> Option<Vec3> {
    let norm_sq = v.norm_squared();
    if !norm_sq.is_finite() || norm_sq < DEGENERATE_NORM {
        return None;
    }
    Some(v / norm_sq.sqrt())
}

/// Component of `v` orthogonal to the unit vector `axis`.
pub fn project_off(v: &Vec3, axis: &Vec3) -> Vec3 {
    v - axis * v.dot(axis)
}

/// First candidate that survives projection off `axis` with usable length, normalized.
pub fn first_transverse<'a, I>(axis: &Vec3, candidates: I) -> Option<Vec3>
where
    I: IntoIterator<Item = &'a Vec3>,
{
    candidates
        .into_iter()
        .find_map(|candidate| unit(&project_off(candidate, axis)))
}

/// Some unit vector perpendicular to the unit vector `axis`.
pub fn any_perpendicular(axis: &Vec3) -> Vec3 {
    let reference = if axis.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    unit(&axis.cross(&reference)).unwrap_or_else(Vec3::z)
}
