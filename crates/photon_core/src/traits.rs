use crate::fields::FieldSample;
use crate::momentum::MomentumSample;
use crate::params::ParticleType;
use crate::path::{Differentiation, PathSample};
use nalgebra::Vector3;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

pub type Vec3 = Vector3<f64>;

/// A trait for types that curve formulas can be evaluated with.
/// Implemented by `f64` and by the forward-mode `Dual` used for analytic velocities.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    fn lit(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// One family of photon path.
///
/// Implementors supply the closed-form position (generic over `Scalar` so it can be
/// differentiated exactly) plus the mode-specific field and momentum rules.
pub trait PathGeometry {
    /// Evaluates the curve at animation time `t`.
    fn position_at<T: Scalar>(&self, t: T) -> [T; 3];

    /// Full kinematic sample at animation time `t`.
    fn sample(&self, t: f64) -> PathSample;

    /// Recorded differentiation strategy for this family.
    fn differentiation(&self) -> Differentiation;

    /// Unit electric and magnetic field directions at a sample.
    fn fields(&self, sample: &PathSample, particle: ParticleType) -> FieldSample;

    /// Linear and angular momentum decomposition at a sample.
    fn momentum(&self, sample: &PathSample) -> MomentumSample;

    /// Parametric angle spanned by one lap, without precession.
    fn base_unit(&self) -> f64;

    fn position(&self, t: f64) -> Vec3 {
        let [x, y, z] = self.position_at(t);
        Vec3::new(x, y, z)
    }

    fn velocity(&self, t: f64) -> Vec3 {
        crate::path::strategy_velocity(self, t)
    }
}
