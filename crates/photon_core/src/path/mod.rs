//! Photon path families and their dispatch.
//!
//! Each family implements [`PathGeometry`]; [`Path`] is the closed set the engine drives.

pub mod lemniscate_c;
pub mod lemniscate_s;
pub mod torus;

use crate::autodiff;
use crate::fields::FieldSample;
use crate::momentum::MomentumSample;
use crate::params::{ParameterSet, ParticleType, PathMode};
use crate::traits::{PathGeometry, Scalar, Vec3};
use serde::{Deserialize, Serialize};

pub use lemniscate_c::VivianiCPath;
pub use lemniscate_s::SpheroidSPath;
pub use torus::TorusPath;

/// Step used by the numerical differentiation strategies.
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-4;

/// Which track a sample belongs to. Only the S-curve splits into two lobes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lobe {
    Single,
    Left,
    Right,
}

/// How a path family obtains its velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Differentiation {
    /// Exact derivative of the closed form, via dual numbers.
    Analytic,
    /// `(p(t + h) - p(t)) / h`.
    ForwardDifference { step: f64 },
    /// `(p(t + h) - p(t - h)) / 2h`; the default for families with no analytic path.
    CentralDifference { step: f64 },
}

impl Differentiation {
    /// Numerical derivative of `position` at `t`. `None` for the analytic strategy,
    /// which needs the generic curve rather than an `f64` closure.
    pub fn finite_difference<F>(self, position: F, t: f64) -> Option<Vec3>
    where
        F: Fn(f64) -> Vec3,
    {
        match self {
            Differentiation::Analytic => None,
            Differentiation::ForwardDifference { step } => {
                Some((position(t + step) - position(t)) / step)
            }
            Differentiation::CentralDifference { step } => {
                Some((position(t + step) - position(t - step)) / (2.0 * step))
            }
        }
    }
}

/// Everything the per-frame pipeline needs to know about the photon at one time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub time: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Polarization angle of the transverse field. On the lemniscates this is `u / 2`, so
    /// the field turns once per `4π` lap of `u`; on the torus it is the driving angle.
    pub phase: f64,
    /// Driving angle including precession; used for cycle averaging.
    pub loop_angle: f64,
    /// Driving angle without the precession multiplier; used for trail length.
    pub trail_angle: f64,
    pub lobe: Lobe,
}

/// Reduces `x` into `[0, period)`.
pub(crate) fn wrap<T: Scalar>(x: T, period: T) -> T {
    let r = x % period;
    if r < T::zero() {
        r + period
    } else {
        r
    }
}

/// Rotation about the vertical (y) axis.
pub(crate) fn precess<T: Scalar>([x, y, z]: [T; 3], theta: T) -> [T; 3] {
    let (s, c) = theta.sin_cos();
    [x * c + z * s, y, -x * s + z * c]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    Torus(TorusPath),
    LemniscateS(SpheroidSPath),
    LemniscateC(VivianiCPath),
}

impl Path {
    pub fn new(params: &ParameterSet) -> Self {
        let shape = &params.shape;
        let motion = &params.motion;
        match motion.mode {
            PathMode::Torus => Path::Torus(TorusPath::new(shape, motion)),
            PathMode::LemniscateS => Path::LemniscateS(SpheroidSPath::new(shape, motion)),
            PathMode::LemniscateC => Path::LemniscateC(VivianiCPath::new(shape, motion)),
        }
    }

    pub fn mode(&self) -> PathMode {
        match self {
            Path::Torus(_) => PathMode::Torus,
            Path::LemniscateS(_) => PathMode::LemniscateS,
            Path::LemniscateC(_) => PathMode::LemniscateC,
        }
    }

    /// Animation time needed for the trail angle to advance one base unit.
    pub fn lap_duration(&self) -> f64 {
        match self {
            Path::Torus(p) => p.lap_duration(),
            Path::LemniscateS(p) => p.lap_duration(),
            Path::LemniscateC(p) => p.lap_duration(),
        }
    }
}

impl PathGeometry for Path {
    fn position_at<T: Scalar>(&self, t: T) -> [T; 3] {
        match self {
            Path::Torus(p) => p.position_at(t),
            Path::LemniscateS(p) => p.position_at(t),
            Path::LemniscateC(p) => p.position_at(t),
        }
    }

    fn sample(&self, t: f64) -> PathSample {
        match self {
            Path::Torus(p) => p.sample(t),
            Path::LemniscateS(p) => p.sample(t),
            Path::LemniscateC(p) => p.sample(t),
        }
    }

    fn differentiation(&self) -> Differentiation {
        match self {
            Path::Torus(p) => p.differentiation(),
            Path::LemniscateS(p) => p.differentiation(),
            Path::LemniscateC(p) => p.differentiation(),
        }
    }

    fn fields(&self, sample: &PathSample, particle: ParticleType) -> FieldSample {
        match self {
            Path::Torus(p) => p.fields(sample, particle),
            Path::LemniscateS(p) => p.fields(sample, particle),
            Path::LemniscateC(p) => p.fields(sample, particle),
        }
    }

    fn momentum(&self, sample: &PathSample) -> MomentumSample {
        match self {
            Path::Torus(p) => p.momentum(sample),
            Path::LemniscateS(p) => p.momentum(sample),
            Path::LemniscateC(p) => p.momentum(sample),
        }
    }

    fn base_unit(&self) -> f64 {
        match self {
            Path::Torus(p) => p.base_unit(),
            Path::LemniscateS(p) => p.base_unit(),
            Path::LemniscateC(p) => p.base_unit(),
        }
    }

    fn velocity(&self, t: f64) -> Vec3 {
        match self {
            Path::Torus(p) => p.velocity(t),
            Path::LemniscateS(p) => p.velocity(t),
            Path::LemniscateC(p) => p.velocity(t),
        }
    }
}

/// Velocity by the family's recorded strategy.
pub(crate) fn strategy_velocity<P: PathGeometry + ?Sized>(path: &P, t: f64) -> Vec3 {
    let strategy = path.differentiation();
    match strategy.finite_difference(|s| path.position(s), t) {
        Some(v) => v,
        None => autodiff::derivative(|d| path.position_at(d), t),
    }
}
