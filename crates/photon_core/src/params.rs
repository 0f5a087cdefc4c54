//! Parameter model and the input boundary that validates it.
//!
//! Every setter on [`ParameterSet`] returns a [`ResetScope`] naming the accumulated
//! state that stopped being meaningful under the new value.

use crate::error::{ParameterError, ParameterResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Floor applied independently to each radius/axis before it reaches a curve formula.
pub const MIN_RADIUS: f64 = 0.1;

/// Trail lengths at or above this many rotations disable angular eviction.
pub const UNLIMITED_TRAIL_ROTATIONS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathMode {
    #[serde(rename = "torus")]
    Torus,
    #[serde(rename = "lemniscate-s")]
    LemniscateS,
    #[serde(rename = "lemniscate-c")]
    LemniscateC,
}

impl PathMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PathMode::Torus => "torus",
            PathMode::LemniscateS => "lemniscate-s",
            PathMode::LemniscateC => "lemniscate-c",
        }
    }

    pub fn is_lemniscate(self) -> bool {
        !matches!(self, PathMode::Torus)
    }
}

impl FromStr for PathMode {
    type Err = ParameterError;

    fn from_str(s: &str) -> ParameterResult<Self> {
        match s.trim() {
            "torus" => Ok(PathMode::Torus),
            "lemniscate-s" | "lemniscate" | "s" => Ok(PathMode::LemniscateS),
            "lemniscate-c" | "c" => Ok(PathMode::LemniscateC),
            other => Err(ParameterError::UnknownTag {
                kind: "path mode",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toroidal:poloidal rate ratio of the torus knot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindingRatio {
    #[serde(rename = "2:1")]
    TwoToOne,
    #[serde(rename = "1:2")]
    OneToTwo,
}

impl WindingRatio {
    /// Toroidal angle advanced per unit of animation time, before precession.
    pub fn toroidal_rate(self) -> f64 {
        match self {
            WindingRatio::TwoToOne => 2.0 * PI,
            WindingRatio::OneToTwo => 4.0 * PI,
        }
    }

    /// Poloidal angle advanced per unit of animation time, before precession.
    pub fn poloidal_rate(self) -> f64 {
        match self {
            WindingRatio::TwoToOne => 4.0 * PI,
            WindingRatio::OneToTwo => 2.0 * PI,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindingRatio::TwoToOne => "2:1",
            WindingRatio::OneToTwo => "1:2",
        }
    }
}

impl FromStr for WindingRatio {
    type Err = ParameterError;

    fn from_str(s: &str) -> ParameterResult<Self> {
        match s.trim() {
            "2:1" => Ok(WindingRatio::TwoToOne),
            "1:2" => Ok(WindingRatio::OneToTwo),
            other => Err(ParameterError::UnknownTag {
                kind: "winding ratio",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinDirection {
    Forward,
    Reverse,
}

impl SpinDirection {
    pub fn sign(self) -> f64 {
        match self {
            SpinDirection::Forward => 1.0,
            SpinDirection::Reverse => -1.0,
        }
    }
}

impl FromStr for SpinDirection {
    type Err = ParameterError;

    fn from_str(s: &str) -> ParameterResult<Self> {
        match s.trim() {
            "1" | "+1" | "forward" => Ok(SpinDirection::Forward),
            "-1" | "reverse" => Ok(SpinDirection::Reverse),
            other => Err(ParameterError::UnknownTag {
                kind: "spin direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Sign convention selector for field directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleType {
    Electron,
    Positron,
}

impl ParticleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticleType::Electron => "electron",
            ParticleType::Positron => "positron",
        }
    }
}

impl FromStr for ParticleType {
    type Err = ParameterError;

    fn from_str(s: &str) -> ParameterResult<Self> {
        match s.trim() {
            "electron" => Ok(ParticleType::Electron),
            "positron" => Ok(ParticleType::Positron),
            other => Err(ParameterError::UnknownTag {
                kind: "particle type",
                value: other.to_string(),
            }),
        }
    }
}

/// Inner/outer radius pair. For lemniscates inner is the minor axis and outer the major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeParameters {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Default for ShapeParameters {
    fn default() -> Self {
        Self {
            inner_radius: 1.0,
            outer_radius: 2.0,
        }
    }
}

impl ShapeParameters {
    pub fn new(inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
        }
    }

    pub fn minor_axis(&self) -> f64 {
        self.inner_radius.max(MIN_RADIUS)
    }

    pub fn major_axis(&self) -> f64 {
        self.outer_radius.max(MIN_RADIUS)
    }

    /// Distance from the torus center to the tube center, from the floored radii.
    pub fn torus_major_radius(&self) -> f64 {
        (self.minor_axis() + self.major_axis()) / 2.0
    }

    /// Radius of the torus tube, from the floored radii.
    pub fn torus_minor_radius(&self) -> f64 {
        (self.major_axis() - self.minor_axis()) / 2.0
    }

    /// Floors both radii and, when `keep_inner` is false, moves the inner radius to keep
    /// `outer > inner`; otherwise moves the outer radius.
    fn corrected_for_torus(mut self, keep_inner: bool) -> Self {
        self.inner_radius = self.inner_radius.max(MIN_RADIUS);
        self.outer_radius = self.outer_radius.max(MIN_RADIUS);
        if self.outer_radius > self.inner_radius {
            return self;
        }
        if keep_inner {
            self.outer_radius = self.inner_radius + MIN_RADIUS;
        } else {
            self.inner_radius = self.outer_radius - MIN_RADIUS;
            if self.inner_radius < MIN_RADIUS {
                self.inner_radius = MIN_RADIUS;
                self.outer_radius = 2.0 * MIN_RADIUS;
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParameters {
    pub precession: f64,
    pub spin: SpinDirection,
    pub winding: WindingRatio,
    pub mode: PathMode,
    pub photon_speed: f64,
}

impl Default for MotionParameters {
    fn default() -> Self {
        Self {
            precession: 0.0,
            spin: SpinDirection::Forward,
            winding: WindingRatio::TwoToOne,
            mode: PathMode::Torus,
            photon_speed: 1.0,
        }
    }
}

/// What a parameter change invalidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetScope {
    pub averages: bool,
    pub trail: bool,
}

impl ResetScope {
    pub const NONE: ResetScope = ResetScope {
        averages: false,
        trail: false,
    };
    pub const TRAIL: ResetScope = ResetScope {
        averages: false,
        trail: true,
    };
    pub const AVERAGES: ResetScope = ResetScope {
        averages: true,
        trail: false,
    };
    pub const ALL: ResetScope = ResetScope {
        averages: true,
        trail: true,
    };

    pub fn is_empty(self) -> bool {
        !self.averages && !self.trail
    }

    fn unless(self, unchanged: bool) -> Self {
        if unchanged {
            ResetScope::NONE
        } else {
            self
        }
    }
}

/// Maps a log-scale slider position to a photon speed (`10^position`).
pub fn photon_speed_from_slider(position: f64) -> f64 {
    10f64.powf(position)
}

pub fn slider_from_photon_speed(speed: f64) -> f64 {
    speed.log10()
}

fn require_finite(name: &'static str, value: f64) -> ParameterResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NonFinite { name, value })
    }
}

fn require_positive(name: &'static str, value: f64) -> ParameterResult<f64> {
    let value = require_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::NonPositive { name, value })
    }
}

/// The full set of user tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub shape: ShapeParameters,
    pub motion: MotionParameters,
    pub particle: ParticleType,
    pub transparency: f64,
    pub trail_length_rotations: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            shape: ShapeParameters::default(),
            motion: MotionParameters::default(),
            particle: ParticleType::Electron,
            transparency: 0.5,
            trail_length_rotations: 1.0,
        }
    }
}

impl ParameterSet {
    /// Inner radius (minor axis for lemniscates). Resets: trail.
    pub fn set_inner_radius(&mut self, value: f64) -> ParameterResult<ResetScope> {
        let value = require_finite("inner radius", value)?;
        let before = self.shape;
        self.shape.inner_radius = value.max(MIN_RADIUS);
        if self.motion.mode == PathMode::Torus {
            self.shape = self.shape.corrected_for_torus(true);
        }
        Ok(ResetScope::TRAIL.unless(before == self.shape))
    }

    /// Outer radius (major axis for lemniscates). Resets: trail.
    pub fn set_outer_radius(&mut self, value: f64) -> ParameterResult<ResetScope> {
        let value = require_finite("outer radius", value)?;
        let before = self.shape;
        self.shape.outer_radius = value.max(MIN_RADIUS);
        if self.motion.mode == PathMode::Torus {
            self.shape = self.shape.corrected_for_torus(false);
        }
        Ok(ResetScope::TRAIL.unless(before == self.shape))
    }

    /// Resets: averages and trail.
    pub fn set_precession(&mut self, value: f64) -> ParameterResult<ResetScope> {
        let value = require_finite("precession", value)?.max(0.0);
        let unchanged = self.motion.precession == value;
        self.motion.precession = value;
        Ok(ResetScope::ALL.unless(unchanged))
    }

    /// Resets: averages and trail.
    pub fn set_winding(&mut self, winding: WindingRatio) -> ResetScope {
        let unchanged = self.motion.winding == winding;
        self.motion.winding = winding;
        ResetScope::ALL.unless(unchanged)
    }

    /// Resets: averages and trail.
    pub fn set_spin(&mut self, spin: SpinDirection) -> ResetScope {
        let unchanged = self.motion.spin == spin;
        self.motion.spin = spin;
        ResetScope::ALL.unless(unchanged)
    }

    /// Resets: averages and trail. Entering torus mode re-applies the `outer > inner`
    /// correction; lemniscate modes keep oblate or prolate axes as given.
    pub fn set_mode(&mut self, mode: PathMode) -> ResetScope {
        let unchanged = self.motion.mode == mode;
        self.motion.mode = mode;
        if mode == PathMode::Torus {
            self.shape = self.shape.corrected_for_torus(true);
        }
        ResetScope::ALL.unless(unchanged)
    }

    /// Resets: averages.
    pub fn set_particle(&mut self, particle: ParticleType) -> ResetScope {
        let unchanged = self.particle == particle;
        self.particle = particle;
        ResetScope::AVERAGES.unless(unchanged)
    }

    /// Resets: nothing.
    pub fn set_photon_speed(&mut self, speed: f64) -> ParameterResult<ResetScope> {
        self.motion.photon_speed = require_positive("photon speed", speed)?;
        Ok(ResetScope::NONE)
    }

    /// Resets: nothing. Values at or above [`UNLIMITED_TRAIL_ROTATIONS`] mean unlimited.
    pub fn set_trail_length_rotations(&mut self, rotations: f64) -> ParameterResult<ResetScope> {
        self.trail_length_rotations = require_positive("trail length", rotations)?;
        Ok(ResetScope::NONE)
    }

    /// Resets: nothing.
    pub fn set_transparency(&mut self, value: f64) -> ParameterResult<ResetScope> {
        self.transparency = require_finite("transparency", value)?.clamp(0.0, 1.0);
        Ok(ResetScope::NONE)
    }

    pub fn trail_is_unlimited(&self) -> bool {
        self.trail_length_rotations >= UNLIMITED_TRAIL_ROTATIONS
    }
}
