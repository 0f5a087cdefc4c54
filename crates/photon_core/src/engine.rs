//! Frame-driven pipeline: position, velocity, fields, momentum, averaging, trails.
//!
//! The host calls [`PhotonEngine::tick`] once per rendered frame. Everything runs
//! synchronously inside that call; pausing stops the clock but leaves visibility and
//! display refreshes running so the view stays live.

use crate::averaging::{CycleAccumulator, CycleAverages, CycleClock, CycleEvent};
use crate::display::{first_angular_label, DisplayReport, DisplaySink, DisplayThrottle};
use crate::error::ParameterResult;
use crate::fields::FieldSample;
use crate::momentum::MomentumSample;
use crate::params::{
    ParameterSet, ParticleType, PathMode, ResetScope, SpinDirection, WindingRatio,
};
use crate::path::{Lobe, Path, PathSample};
use crate::trail::TrailBuffer;
use crate::traits::{PathGeometry, Vec3};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Animation time advanced per frame at unit photon speed.
pub const BASE_STEP: f64 = 0.001;

/// Line-of-sight test supplied by the renderer.
pub trait OcclusionOracle {
    fn is_obstructed(&mut self, position: &Vec3) -> bool;
}

impl<F: FnMut(&Vec3) -> bool> OcclusionOracle for F {
    fn is_obstructed(&mut self, position: &Vec3) -> bool {
        self(position)
    }
}

/// Oracle for hosts without a scene; everything is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverObstructed;

impl OcclusionOracle for NeverObstructed {
    fn is_obstructed(&mut self, _position: &Vec3) -> bool {
        false
    }
}

/// What the renderer needs after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub time: f64,
    pub mode: PathMode,
    pub position: Vec3,
    pub velocity: Vec3,
    pub lobe: Lobe,
    pub obstructed: bool,
    pub fields: FieldSample,
    pub momentum: MomentumSample,
}

#[derive(Debug, Clone)]
pub struct PhotonEngine {
    params: ParameterSet,
    path: Path,
    animation_time: f64,
    paused: bool,
    averages: CycleAverages,
    trail: TrailBuffer,
    left_trail: TrailBuffer,
    right_trail: TrailBuffer,
    throttle: DisplayThrottle,
}

impl Default for PhotonEngine {
    fn default() -> Self {
        Self::new(ParameterSet::default())
    }
}

impl PhotonEngine {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            path: Path::new(&params),
            params,
            animation_time: 0.0,
            paused: false,
            averages: CycleAverages::new(),
            trail: TrailBuffer::new(),
            left_trail: TrailBuffer::new(),
            right_trail: TrailBuffer::new(),
            throttle: DisplayThrottle::default(),
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn animation_time(&self) -> f64 {
        self.animation_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flips the pause state and returns the new one.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn field_average(&self) -> &CycleAccumulator<FieldSample> {
        self.averages.fields()
    }

    pub fn momentum_average(&self) -> &CycleAccumulator<MomentumSample> {
        self.averages.momentum()
    }

    /// Cycle bookkeeping shared by the field and momentum averages.
    pub fn cycle_clock(&self) -> &CycleClock {
        self.averages.clock()
    }

    /// Trail buffer for a track. `Lobe::Single` is the torus/C-curve track.
    pub fn trail(&self, lobe: Lobe) -> &TrailBuffer {
        match lobe {
            Lobe::Single => &self.trail,
            Lobe::Left => &self.left_trail,
            Lobe::Right => &self.right_trail,
        }
    }

    fn trail_mut(&mut self, lobe: Lobe) -> &mut TrailBuffer {
        match lobe {
            Lobe::Single => &mut self.trail,
            Lobe::Left => &mut self.left_trail,
            Lobe::Right => &mut self.right_trail,
        }
    }

    /// Maximum trail angular span, `None` when the trail is unlimited.
    pub fn trail_span(&self) -> Option<f64> {
        if self.params.trail_is_unlimited() {
            None
        } else {
            Some(self.params.trail_length_rotations * self.path.base_unit())
        }
    }

    pub fn reset_fields(&mut self) {
        tracing::debug!("field averages reset");
        self.averages.reset_fields();
    }

    pub fn reset_momentum(&mut self) {
        tracing::debug!("momentum averages reset");
        self.averages.reset_momentum();
    }

    pub fn clear_trails(&mut self) {
        self.trail.clear();
        self.left_trail.clear();
        self.right_trail.clear();
    }

    fn apply(&mut self, scope: ResetScope) {
        self.path = Path::new(&self.params);
        if scope.is_empty() {
            return;
        }
        tracing::debug!(
            averages = scope.averages,
            trail = scope.trail,
            mode = %self.params.motion.mode,
            "parameters changed"
        );
        if scope.averages {
            self.averages.reset();
            self.throttle.force();
        }
        if scope.trail {
            self.clear_trails();
        }
    }

    pub fn set_inner_radius(&mut self, value: f64) -> ParameterResult<()> {
        let scope = self.params.set_inner_radius(value)?;
        self.apply(scope);
        Ok(())
    }

    pub fn set_outer_radius(&mut self, value: f64) -> ParameterResult<()> {
        let scope = self.params.set_outer_radius(value)?;
        self.apply(scope);
        Ok(())
    }

    pub fn set_precession(&mut self, value: f64) -> ParameterResult<()> {
        let scope = self.params.set_precession(value)?;
        self.apply(scope);
        Ok(())
    }

    pub fn set_winding(&mut self, winding: WindingRatio) {
        let scope = self.params.set_winding(winding);
        self.apply(scope);
    }

    pub fn set_spin(&mut self, spin: SpinDirection) {
        let scope = self.params.set_spin(spin);
        self.apply(scope);
    }

    pub fn set_mode(&mut self, mode: PathMode) {
        let scope = self.params.set_mode(mode);
        self.apply(scope);
    }

    pub fn set_particle(&mut self, particle: ParticleType) {
        let scope = self.params.set_particle(particle);
        self.apply(scope);
    }

    pub fn set_photon_speed(&mut self, speed: f64) -> ParameterResult<()> {
        let scope = self.params.set_photon_speed(speed)?;
        self.apply(scope);
        Ok(())
    }

    pub fn set_trail_length_rotations(&mut self, rotations: f64) -> ParameterResult<()> {
        let scope = self.params.set_trail_length_rotations(rotations)?;
        self.apply(scope);
        Ok(())
    }

    pub fn set_transparency(&mut self, value: f64) -> ParameterResult<()> {
        let scope = self.params.set_transparency(value)?;
        self.apply(scope);
        Ok(())
    }

    /// Current sample without advancing time.
    pub fn current_sample(&self) -> PathSample {
        self.path.sample(self.animation_time)
    }

    /// Runs one frame. `now_ms` is the host's wall clock, used only for display throttling.
    pub fn tick<O, D>(&mut self, now_ms: f64, oracle: &mut O, sink: &mut D) -> FrameSnapshot
    where
        O: OcclusionOracle,
        D: DisplaySink,
    {
        if !self.paused {
            self.animation_time += BASE_STEP * self.params.motion.photon_speed;
        }
        let sample = self.current_sample();
        let fields = self.path.fields(&sample, self.params.particle);
        let momentum = self.path.momentum(&sample);
        let obstructed = oracle.is_obstructed(&sample.position);

        if !self.paused {
            self.accumulate(&sample, fields, momentum);
            let span = self.trail_span();
            self.trail_mut(sample.lobe)
                .append(sample.position, obstructed, sample.trail_angle, span);
        }

        for lobe in [Lobe::Single, Lobe::Left, Lobe::Right] {
            self.trail_mut(lobe)
                .refresh_visibility(|p| oracle.is_obstructed(p));
        }

        if self.throttle.due(now_ms) {
            sink.publish(&self.report(&fields, &momentum));
        }

        FrameSnapshot {
            time: sample.time,
            mode: self.path.mode(),
            position: sample.position,
            velocity: sample.velocity,
            lobe: sample.lobe,
            obstructed,
            fields,
            momentum,
        }
    }

    fn accumulate(&mut self, sample: &PathSample, fields: FieldSample, momentum: MomentumSample) {
        let spin = self.params.motion.spin.sign();
        let base = self.path.base_unit();
        let event = self
            .averages
            .record(sample.loop_angle, spin, base, fields, momentum);
        if let CycleEvent::Completed {
            fields_published,
            momentum_published,
        } = event
        {
            tracing::debug!(
                fields_published,
                momentum_published,
                loop_angle = sample.loop_angle,
                "cycle completed"
            );
        }
    }

    pub fn report(&self, fields: &FieldSample, momentum: &MomentumSample) -> DisplayReport {
        let mode = self.params.motion.mode;
        DisplayReport {
            animation_time: self.animation_time,
            mode,
            first_angular_label: first_angular_label(mode).to_string(),
            fields: fields.into(),
            momentum: momentum.into(),
            average_fields: self.averages.fields().last_average().as_ref().map(Into::into),
            average_momentum: self.averages.momentum().last_average().as_ref().map(Into::into),
        }
    }

    /// One lap of the current path starting at the current time, for drawing a guide curve.
    pub fn sample_path(&self, points: usize) -> Result<Vec<Vec3>> {
        if points < 2 {
            bail!("Path preview needs at least 2 points, got {}.", points);
        }
        let lap = self.path.lap_duration();
        let step = lap / (points - 1) as f64;
        Ok((0..points)
            .map(|i| self.path.position(self.animation_time + step * i as f64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayReport;

    fn run(engine: &mut PhotonEngine, frames: usize) -> Vec<DisplayReport> {
        let mut reports = Vec::new();
        let mut sink = |r: &DisplayReport| reports.push(r.clone());
        for i in 0..frames {
            engine.tick(i as f64 * 16.0, &mut NeverObstructed, &mut sink);
        }
        reports
    }

    #[test]
    fn tick_advances_time_by_scaled_step() {
        let mut engine = PhotonEngine::default();
        engine.set_photon_speed(2.5).unwrap();
        run(&mut engine, 4);
        assert!((engine.animation_time() - 4.0 * BASE_STEP * 2.5).abs() < 1e-12);
    }

    #[test]
    fn pause_freezes_pipeline_but_not_display() {
        let mut engine = PhotonEngine::default();
        run(&mut engine, 10);
        let time = engine.animation_time();
        let count = engine.trail(Lobe::Single).len();
        assert!(engine.toggle_pause());
        let reports = run(&mut engine, 40);
        assert_eq!(engine.animation_time(), time);
        assert_eq!(engine.trail(Lobe::Single).len(), count);
        assert!(!reports.is_empty());
    }

    #[test]
    fn display_is_throttled() {
        let mut engine = PhotonEngine::default();
        // 125 frames at 16 ms covers 0..1984 ms.
        let reports = run(&mut engine, 125);
        assert_eq!(reports.len(), 4);
    }

    #[test]
    fn full_lap_publishes_averages() {
        let mut engine = PhotonEngine::default();
        let frames = (engine.path().lap_duration() / BASE_STEP) as usize + 5;
        let reports = run(&mut engine, frames);
        assert!(engine.field_average().last_average().is_some());
        assert!(engine.momentum_average().last_average().is_some());
        assert!(reports.first().unwrap().average_fields.is_none());
        let avg = engine.momentum_average().last_average().unwrap();
        assert!(avg.is_finite());
    }

    #[test]
    fn motion_changes_reset_averages_and_trail() {
        let mut engine = PhotonEngine::default();
        run(&mut engine, 50);
        assert!(engine.trail(Lobe::Single).len() > 0);
        assert!(engine.field_average().sample_count() > 0);

        engine.set_precession(0.5).unwrap();
        assert_eq!(engine.trail(Lobe::Single).len(), 0);
        assert_eq!(engine.field_average().sample_count(), 0);
        assert_eq!(engine.momentum_average().sample_count(), 0);
    }

    #[test]
    fn particle_change_keeps_trail() {
        let mut engine = PhotonEngine::default();
        run(&mut engine, 50);
        engine.set_particle(ParticleType::Positron);
        assert_eq!(engine.trail(Lobe::Single).len(), 50);
        assert_eq!(engine.field_average().sample_count(), 0);
    }

    #[test]
    fn radius_change_keeps_averages() {
        let mut engine = PhotonEngine::default();
        run(&mut engine, 20);
        engine.set_outer_radius(3.0).unwrap();
        assert_eq!(engine.trail(Lobe::Single).len(), 0);
        assert!(engine.field_average().sample_count() > 0);
    }

    #[test]
    fn user_resets_are_independent() {
        let mut engine = PhotonEngine::default();
        run(&mut engine, 20);
        engine.reset_fields();
        assert_eq!(engine.field_average().sample_count(), 0);
        assert!(engine.momentum_average().sample_count() > 0);
        engine.reset_momentum();
        assert_eq!(engine.momentum_average().sample_count(), 0);
    }

    #[test]
    fn field_reset_mid_cycle_keeps_averages_in_phase() {
        let mut engine = PhotonEngine::default();
        run(&mut engine, 300);
        let start = engine.cycle_clock().cycle_start_angle();
        engine.reset_fields();
        run(&mut engine, 1);
        assert_eq!(engine.cycle_clock().cycle_start_angle(), start);

        let lap = (engine.path().lap_duration() / BASE_STEP) as usize;
        let mut completed_at = None;
        for frame in 0..lap {
            run(&mut engine, 1);
            let fields = engine.field_average().last_average().is_some();
            let momentum = engine.momentum_average().last_average().is_some();
            assert_eq!(fields, momentum, "averages published apart at frame {frame}");
            if fields {
                completed_at = Some(frame);
                break;
            }
        }
        assert!(completed_at.is_some());
        assert_eq!(engine.field_average().sample_count(), 0);
        assert_eq!(engine.momentum_average().sample_count(), 0);
    }

    #[test]
    fn s_mode_fills_both_lobe_trails() {
        let mut engine = PhotonEngine::default();
        engine.set_mode(PathMode::LemniscateS);
        let frames = (engine.path().lap_duration() / BASE_STEP) as usize;
        run(&mut engine, frames);
        assert!(engine.trail(Lobe::Left).len() > 0);
        assert!(engine.trail(Lobe::Right).len() > 0);
        assert_eq!(engine.trail(Lobe::Single).len(), 0);
        assert!(engine.trail(Lobe::Left).iter().all(|p| p.position.x <= 1e-9));
        assert!(engine.trail(Lobe::Right).iter().all(|p| p.position.x >= -1e-9));
    }

    #[test]
    fn trail_span_follows_rotations() {
        let mut engine = PhotonEngine::default();
        engine.set_mode(PathMode::LemniscateC);
        engine.set_trail_length_rotations(0.25).unwrap();
        let span = engine.trail_span().unwrap();
        assert!((span - std::f64::consts::PI).abs() < 1e-12);
        run(&mut engine, 600);
        let trail = engine.trail(Lobe::Single);
        let newest = trail.newest().unwrap().loop_angle;
        let oldest = trail.oldest().unwrap().loop_angle;
        assert!(newest - oldest <= span);

        engine.set_trail_length_rotations(100.0).unwrap();
        assert!(engine.trail_span().is_none());
    }

    #[test]
    fn oracle_verdict_colors_photon_and_trail() {
        let mut engine = PhotonEngine::default();
        let mut everything_hidden = |_: &Vec3| true;
        let mut sink = |_: &DisplayReport| {};
        let frame = engine.tick(0.0, &mut everything_hidden, &mut sink);
        assert!(frame.obstructed);
        assert_eq!(engine.trail(Lobe::Single).obstruction_flags(), vec![1]);
        engine.tick(16.0, &mut NeverObstructed, &mut sink);
        assert_eq!(engine.trail(Lobe::Single).obstruction_flags(), vec![0, 0]);
    }

    #[test]
    fn sample_path_covers_one_lap() {
        let engine = PhotonEngine::default();
        let points = engine.sample_path(64).unwrap();
        assert_eq!(points.len(), 64);
        assert!((points[0] - points[63]).norm() < 1e-9);
        assert!(engine.sample_path(1).is_err());
    }
}
