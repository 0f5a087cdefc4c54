use super::lemniscate_c::{LEMNISCATE_LAP, LEMNISCATE_RATE};
use super::{precess, wrap, Differentiation, Lobe, PathSample, FINITE_DIFFERENCE_STEP};
use crate::fields::{spheroid_fields, FieldSample};
use crate::momentum::{lemniscate_momentum, MomentumSample};
use crate::params::{MotionParameters, ParticleType, ShapeParameters};
use crate::traits::{PathGeometry, Scalar, Vec3};

const HALF_LAP: f64 = LEMNISCATE_LAP / 2.0;

/// Two loops side by side, touching at the origin.
///
/// The left loop lives on the spheroid centered at `(-a, 0, 0)` and is traced during the
/// first half of each lap; the right loop is the left one with its parameter reflected
/// (`4π - s`) and mirrored through the origin, traced during the second half.
/// With precession `p > 0` the pattern closes after a super-cycle of `4π / p`, over which
/// the rotation about y advances by exactly `2π`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpheroidSPath {
    pub minor_axis: f64,
    pub major_axis: f64,
    pub precession: f64,
    pub spin: f64,
}

/// Lap phase `s ∈ [0, 4π)` and precession angle for an unbounded parameter.
struct LapPosition<T> {
    phase: T,
    theta: Option<T>,
}

impl SpheroidSPath {
    pub fn new(shape: &ShapeParameters, motion: &MotionParameters) -> Self {
        Self {
            minor_axis: shape.minor_axis(),
            major_axis: shape.major_axis(),
            precession: motion.precession,
            spin: motion.spin.sign(),
        }
    }

    pub fn parameter(&self, t: f64) -> f64 {
        LEMNISCATE_RATE * self.spin * t
    }

    /// Length of the precession super-cycle in parameter units, `None` without precession.
    pub fn super_cycle(&self) -> Option<f64> {
        (self.precession != 0.0).then(|| LEMNISCATE_LAP / self.precession)
    }

    fn lap_position<T: Scalar>(&self, u: T) -> LapPosition<T> {
        let lap = T::lit(LEMNISCATE_LAP);
        match self.super_cycle() {
            None => LapPosition {
                phase: wrap(u, lap),
                theta: None,
            },
            Some(cycle) => {
                let multi_phase = wrap(u, T::lit(cycle));
                LapPosition {
                    phase: wrap(multi_phase, lap),
                    theta: Some(T::lit(self.precession / 2.0) * multi_phase),
                }
            }
        }
    }

    /// Left loop, unprecessed, at lap phase `s`.
    pub fn left_base<T: Scalar>(&self, s: T) -> [T; 3] {
        let a = T::lit(self.minor_axis);
        let c = T::lit(self.major_axis);
        let (sp, cp) = (s * T::lit(0.5)).sin_cos();
        [-a + a * cp * cp, c * sp, a * sp * cp]
    }

    /// Right loop, unprecessed, at lap phase `s`.
    pub fn right_base<T: Scalar>(&self, s: T) -> [T; 3] {
        let [x, y, z] = self.left_base(T::lit(LEMNISCATE_LAP) - s);
        [-x, -y, -z]
    }

    pub fn left_precessed<T: Scalar>(&self, u: T) -> [T; 3] {
        let lap = self.lap_position(u);
        let point = self.left_base(lap.phase);
        match lap.theta {
            Some(theta) => precess(point, theta),
            None => point,
        }
    }

    pub fn right_precessed<T: Scalar>(&self, u: T) -> [T; 3] {
        let lap = self.lap_position(u);
        let point = self.right_base(lap.phase);
        match lap.theta {
            Some(theta) => precess(point, theta),
            None => point,
        }
    }

    /// Rotation about y applied to the body-frame lobes at time `t`; zero without precession.
    pub fn precession_angle(&self, t: f64) -> f64 {
        self.lap_position(self.parameter(t)).theta.unwrap_or(0.0)
    }

    /// Lobe whose half of the lap contains parameter `u`.
    pub fn active_lobe(&self, u: f64) -> Lobe {
        if self.lap_position(u).phase < HALF_LAP {
            Lobe::Left
        } else {
            Lobe::Right
        }
    }

    /// Position on one lobe's formula at time `t`, whether or not that lobe is visible.
    pub fn lobe_position(&self, lobe: Lobe, t: f64) -> Vec3 {
        let u = self.parameter(t);
        let [x, y, z] = match lobe {
            Lobe::Right => self.right_precessed(u),
            _ => self.left_precessed(u),
        };
        Vec3::new(x, y, z)
    }

    pub fn lap_duration(&self) -> f64 {
        LEMNISCATE_LAP / LEMNISCATE_RATE
    }
}

impl PathGeometry for SpheroidSPath {
    fn position_at<T: Scalar>(&self, t: T) -> [T; 3] {
        let u = T::lit(LEMNISCATE_RATE * self.spin) * t;
        let lap = self.lap_position(u);
        let point = if lap.phase < T::lit(HALF_LAP) {
            self.left_base(lap.phase)
        } else {
            self.right_base(lap.phase)
        };
        match lap.theta {
            Some(theta) => precess(point, theta),
            None => point,
        }
    }

    fn sample(&self, t: f64) -> PathSample {
        let u = self.parameter(t);
        PathSample {
            time: t,
            position: self.position(t),
            velocity: self.velocity(t),
            phase: u / 2.0,
            loop_angle: u,
            trail_angle: u,
            lobe: self.active_lobe(u),
        }
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::ForwardDifference {
            step: FINITE_DIFFERENCE_STEP,
        }
    }

    /// Differences within the active lobe's formula so a step never straddles the join.
    fn velocity(&self, t: f64) -> Vec3 {
        let lobe = self.active_lobe(self.parameter(t));
        self.differentiation()
            .finite_difference(|s| self.lobe_position(lobe, s), t)
            .unwrap_or_else(Vec3::zeros)
    }

    fn fields(&self, sample: &PathSample, particle: ParticleType) -> FieldSample {
        spheroid_fields(
            &sample.position,
            &sample.velocity,
            self.minor_axis,
            self.major_axis,
            self.precession_angle(sample.time),
            particle,
        )
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
