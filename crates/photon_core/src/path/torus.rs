use super::{Differentiation, Lobe, PathSample};
use crate::fields::{torus_fields, FieldSample};
use crate::momentum::{torus_momentum, MomentumSample};
use crate::params::{MotionParameters, ParticleType, ShapeParameters, WindingRatio};
use crate::traits::{PathGeometry, Scalar};

/// Torus knot: toroidal angle `u` and poloidal angle `v` both linear in time.
///
/// `u = rate_u · (1 + p) · spin · t`, `v = rate_v · (1 + 2p) · spin · t`, with the base
/// rates set by the winding ratio. The point is evaluated in closed form every frame, so
/// it stays on the surface regardless of how long the animation has run.
#[derive(Debug, Clone, PartialEq)]
pub struct TorusPath {
    pub major_radius: f64,
    pub minor_radius: f64,
    pub winding: WindingRatio,
    pub precession: f64,
    pub spin: f64,
}

impl TorusPath {
    pub fn new(shape: &ShapeParameters, motion: &MotionParameters) -> Self {
        Self {
            major_radius: shape.torus_major_radius(),
            minor_radius: shape.torus_minor_radius(),
            winding: motion.winding,
            precession: motion.precession,
            spin: motion.spin.sign(),
        }
    }

    /// Toroidal angular rate including precession and spin.
    pub fn toroidal_rate(&self) -> f64 {
        self.winding.toroidal_rate() * (1.0 + self.precession) * self.spin
    }

    /// Poloidal angular rate including precession and spin.
    pub fn poloidal_rate(&self) -> f64 {
        self.winding.poloidal_rate() * (1.0 + 2.0 * self.precession) * self.spin
    }

    pub fn lap_duration(&self) -> f64 {
        self.base_unit() / self.winding.toroidal_rate()
    }
}

impl PathGeometry for TorusPath {
    fn position_at<T: Scalar>(&self, t: T) -> [T; 3] {
        let u = T::lit(self.toroidal_rate()) * t;
        let v = T::lit(self.poloidal_rate()) * t;
        let major = T::lit(self.major_radius);
        let minor = T::lit(self.minor_radius);
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        let ring = major + minor * cv;
        [ring * cu, ring * su, minor * sv]
    }

    fn sample(&self, t: f64) -> PathSample {
        let loop_angle = self.toroidal_rate() * t;
        PathSample {
            time: t,
            position: self.position(t),
            velocity: self.velocity(t),
            phase: loop_angle,
            loop_angle,
            trail_angle: self.winding.toroidal_rate() * self.spin * t,
            lobe: Lobe::Single,
        }
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Analytic
    }

    fn fields(&self, sample: &PathSample, particle: ParticleType) -> FieldSample {
        torus_fields(&sample.position, &sample.velocity, self.major_radius, particle)
    }

    fn momentum(&self, sample: &PathSample) -> MomentumSample {
        torus_momentum(&sample.position, &sample.velocity, self.major_radius)
    }

    fn base_unit(&self) -> f64 {
        self.winding.toroidal_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SpinDirection;
    use crate::traits::Vec3;

    fn path(precession: f64, spin: SpinDirection, winding: WindingRatio) -> TorusPath {
        let motion = MotionParameters {
            precession,
            spin,
            winding,
            ..MotionParameters::default()
        };
        TorusPath::new(&ShapeParameters::new(1.0, 3.0), &motion)
    }

    #[test]
    fn starts_on_outer_equator() {
        let p = path(0.0, SpinDirection::Forward, WindingRatio::TwoToOne);
        let start = p.position(0.0);
        assert!((start - Vec3::new(3.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn closes_after_one_lap_without_precession() {
        for winding in [WindingRatio::TwoToOne, WindingRatio::OneToTwo] {
            let p = path(0.0, SpinDirection::Forward, winding);
            let lap = p.lap_duration();
            assert!((lap - 1.0).abs() < 1e-12);
            assert!((p.position(0.3) - p.position(0.3 + lap)).norm() < 1e-9);
        }
    }

    #[test]
    fn analytic_velocity_matches_central_difference() {
        let p = path(0.35, SpinDirection::Forward, WindingRatio::OneToTwo);
        let t = 0.417;
        let analytic = p.velocity(t);
        let numeric = Differentiation::CentralDifference { step: 1e-5 }
            .finite_difference(|s| p.position(s), t)
            .unwrap();
        assert!((analytic - numeric).norm() < 1e-4 * analytic.norm());
    }

    #[test]
    fn analytic_velocity_matches_chain_rule() {
        let p = path(0.2, SpinDirection::Reverse, WindingRatio::TwoToOne);
        let t = 0.1;
        let (du, dv) = (p.toroidal_rate(), p.poloidal_rate());
        let (u, v) = (du * t, dv * t);
        let ring = p.major_radius + p.minor_radius * v.cos();
        let d_ring = -p.minor_radius * v.sin() * dv;
        let expected = Vec3::new(
            d_ring * u.cos() - ring * u.sin() * du,
            d_ring * u.sin() + ring * u.cos() * du,
            p.minor_radius * v.cos() * dv,
        );
        assert!((p.velocity(t) - expected).norm() < 1e-9);
    }

    #[test]
    fn loop_angle_includes_precession_but_trail_angle_does_not() {
        let p = path(0.5, SpinDirection::Forward, WindingRatio::TwoToOne);
        let s = p.sample(1.0);
        assert!((s.loop_angle - 3.0 * std::f64::consts::PI).abs() < 1e-12);
        assert!((s.trail_angle - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn reversed_spin_traces_the_path_backwards() {
        let forward = path(0.3, SpinDirection::Forward, WindingRatio::TwoToOne);
        let reverse = path(0.3, SpinDirection::Reverse, WindingRatio::TwoToOne);
        for i in 0..20 {
            let t = i as f64 * 0.037;
            assert!((reverse.position(t) - forward.position(-t)).norm() < 1e-12);
            assert!((reverse.velocity(t) + forward.velocity(-t)).norm() < 1e-9);
        }
    }
}
