use super::{precess, wrap, Differentiation, Lobe, PathSample};
use crate::fields::{transverse_fields, FieldSample};
use crate::momentum::{lemniscate_momentum, MomentumSample};
use crate::params::{MotionParameters, ParticleType, ShapeParameters};
use crate::traits::{PathGeometry, Scalar};
use std::f64::consts::PI;

/// Parametric angle of one lemniscate lap.
pub const LEMNISCATE_LAP: f64 = 4.0 * PI;

/// Rate of the lemniscate parameter per unit of animation time. Twice the torus base rate
/// so the photon moves at a comparable visual speed.
pub const LEMNISCATE_RATE: f64 = 2.0 * LEMNISCATE_LAP;

/// Viviani curve on the spheroid `x²/a² + y²/c² + z²/a² = 1`, precessing about y.
///
/// Body frame: `x = a(1 + cos u)/2`, `y = c sin(u/2)`, `z = a sin(u)/2`.
#[derive(Debug, Clone, PartialEq)]
pub struct VivianiCPath {
    pub minor_axis: f64,
    pub major_axis: f64,
    pub precession: f64,
    pub spin: f64,
}

impl VivianiCPath {
    pub fn new(shape: &ShapeParameters, motion: &MotionParameters) -> Self {
        Self {
            minor_axis: shape.minor_axis(),
            major_axis: shape.major_axis(),
            precession: motion.precession,
            spin: motion.spin.sign(),
        }
    }

    /// Unbounded curve parameter at time `t`.
    pub fn parameter(&self, t: f64) -> f64 {
        LEMNISCATE_RATE * self.spin * t
    }

    pub fn body_point<T: Scalar>(&self, u: T) -> [T; 3] {
        let s = wrap(u, T::lit(LEMNISCATE_LAP));
        let a = T::lit(self.minor_axis);
        let c = T::lit(self.major_axis);
        let half = T::lit(0.5);
        let (su, cu) = s.sin_cos();
        [a * (T::one() + cu) * half, c * (s * half).sin(), a * su * half]
    }

    pub fn lap_duration(&self) -> f64 {
        LEMNISCATE_LAP / LEMNISCATE_RATE
    }
}

impl PathGeometry for VivianiCPath {
    fn position_at<T: Scalar>(&self, t: T) -> [T; 3] {
        let u = T::lit(LEMNISCATE_RATE * self.spin) * t;
        let body = self.body_point(u);
        if self.precession == 0.0 {
            return body;
        }
        // The unbounded parameter drives precession so it never jumps at a lap boundary.
        let theta = T::lit(self.spin * self.precession / 2.0) * u;
        precess(body, theta)
    }

    fn sample(&self, t: f64) -> PathSample {
        let u = self.parameter(t);
        PathSample {
            time: t,
            position: self.position(t),
            velocity: self.velocity(t),
            // One full polarization turn per lap.
            phase: u / 2.0,
            loop_angle: u,
            trail_angle: u,
            lobe: Lobe::Single,
        }
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Analytic
    }

    fn fields(&self, sample: &PathSample, particle: ParticleType) -> FieldSample {
        transverse_fields(&sample.position, &sample.velocity, sample.phase, particle)
    }

    fn momentum(&self, sample: &PathSample) -> MomentumSample {
        lemniscate_momentum(
            &sample.position,
            &sample.velocity,
            self.minor_axis,
            self.major_axis,
        )
    }

    fn base_unit(&self) -> f64 {
        LEMNISCATE_LAP
    }
}
