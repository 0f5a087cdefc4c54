//! Formatted vector summaries pushed to the display layer.

use crate::fields::FieldSample;
use crate::momentum::MomentumSample;
use crate::params::PathMode;
use crate::traits::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock interval between display refreshes.
pub const DISPLAY_INTERVAL_MS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSummary {
    pub magnitude: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<&Vec3> for VectorSummary {
    fn from(v: &Vec3) -> Self {
        Self {
            magnitude: v.norm(),
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl fmt::Display for VectorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "|v| = {:.3} ({:.3}, {:.3}, {:.3})",
            self.magnitude, self.x, self.y, self.z
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub electric: VectorSummary,
    pub magnetic: VectorSummary,
}

impl From<&FieldSample> for FieldSummary {
    fn from(sample: &FieldSample) -> Self {
        Self {
            electric: (&sample.electric).into(),
            magnetic: (&sample.magnetic).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumSummary {
    pub linear: VectorSummary,
    pub first_angular: VectorSummary,
    pub second_angular: VectorSummary,
    pub total: VectorSummary,
}

impl From<&MomentumSample> for MomentumSummary {
    fn from(sample: &MomentumSample) -> Self {
        Self {
            linear: (&sample.linear).into(),
            first_angular: (&sample.first_angular).into(),
            second_angular: (&sample.second_angular).into(),
            total: (&sample.total).into(),
        }
    }
}

/// Name of the first angular-momentum component for a mode.
pub fn first_angular_label(mode: PathMode) -> &'static str {
    if mode.is_lemniscate() {
        "lemniscate"
    } else {
        "toroidal"
    }
}

/// One throttled refresh worth of display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayReport {
    pub animation_time: f64,
    pub mode: PathMode,
    pub first_angular_label: String,
    pub fields: FieldSummary,
    pub momentum: MomentumSummary,
    /// `None` until a cycle completes after the last reset.
    pub average_fields: Option<FieldSummary>,
    pub average_momentum: Option<MomentumSummary>,
}

impl fmt::Display for DisplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn avg(v: Option<VectorSummary>) -> String {
            v.map_or_else(|| "-".to_string(), |v| v.to_string())
        }
        let af = self.average_fields;
        let am = self.average_momentum;
        writeln!(f, "E: {}  avg {}", self.fields.electric, avg(af.map(|a| a.electric)))?;
        writeln!(f, "B: {}  avg {}", self.fields.magnetic, avg(af.map(|a| a.magnetic)))?;
        writeln!(f, "p: {}  avg {}", self.momentum.linear, avg(am.map(|a| a.linear)))?;
        writeln!(
            f,
            "L_{}: {}  avg {}",
            self.first_angular_label,
            self.momentum.first_angular,
            avg(am.map(|a| a.first_angular))
        )?;
        writeln!(
            f,
            "L_poloidal: {}  avg {}",
            self.momentum.second_angular,
            avg(am.map(|a| a.second_angular))
        )?;
        write!(f, "L: {}  avg {}", self.momentum.total, avg(am.map(|a| a.total)))
    }
}

/// Receiver of throttled display refreshes.
pub trait DisplaySink {
    fn publish(&mut self, report: &DisplayReport);
}

impl<F: FnMut(&DisplayReport)> DisplaySink for F {
    fn publish(&mut self, report: &DisplayReport) {
        self(report)
    }
}

/// Decides when the display is due, independent of frame rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayThrottle {
    last_update_ms: Option<f64>,
}

impl DisplayThrottle {
    pub fn due(&mut self, now_ms: f64) -> bool {
        match self.last_update_ms {
            Some(last) if now_ms - last < DISPLAY_INTERVAL_MS => false,
            _ => {
                self.last_update_ms = Some(now_ms);
                true
            }
        }
    }

    /// Makes the next call to [`DisplayThrottle::due`] return true.
    pub fn force(&mut self) {
        self.last_update_ms = None;
    }
}
