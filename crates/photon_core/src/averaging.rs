//! Per-cycle averaging of field and momentum samples.

use crate::fields::FieldSample;
use crate::momentum::MomentumSample;
use serde::{Deserialize, Serialize};

/// Samples that can be summed and divided by a count.
pub trait Accumulate: Copy {
    fn zero() -> Self;
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, factor: f64) -> Self;
    fn is_finite(&self) -> bool;
}

impl Accumulate for FieldSample {
    fn zero() -> Self {
        FieldSample::zero()
    }

    fn add(&self, other: &Self) -> Self {
        FieldSample {
            electric: self.electric + other.electric,
            magnetic: self.magnetic + other.magnetic,
        }
    }

    fn scale(&self, factor: f64) -> Self {
        FieldSample {
            electric: self.electric * factor,
            magnetic: self.magnetic * factor,
        }
    }

    fn is_finite(&self) -> bool {
        FieldSample::is_finite(self)
    }
}

impl Accumulate for MomentumSample {
    fn zero() -> Self {
        MomentumSample::zero()
    }

    fn add(&self, other: &Self) -> Self {
        MomentumSample {
            linear: self.linear + other.linear,
            first_angular: self.first_angular + other.first_angular,
            second_angular: self.second_angular + other.second_angular,
            total: self.total + other.total,
        }
    }

    fn scale(&self, factor: f64) -> Self {
        MomentumSample {
            linear: self.linear * factor,
            first_angular: self.first_angular * factor,
            second_angular: self.second_angular * factor,
            total: self.total * factor,
        }
    }

    fn is_finite(&self) -> bool {
        MomentumSample::is_finite(self)
    }
}

/// Outcome of advancing the shared cycle clock by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleEvent {
    /// First frame after a full reset; the cycle starts here.
    Started,
    Accumulated,
    /// A full base unit elapsed. Each flag is false when that accumulator held no samples.
    Completed {
        fields_published: bool,
        momentum_published: bool,
    },
}

/// Cycle-start bookkeeping shared by every accumulator driven from the same loop angle.
///
/// A cycle completes once the loop angle has advanced one base unit from the cycle start
/// in the direction of spin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleClock {
    cycle_start_angle: Option<f64>,
    last_loop_angle: f64,
}

/// Where a frame falls relative to the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Started,
    Running,
    Completed,
}

impl CycleClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn cycle_start_angle(&self) -> Option<f64> {
        self.cycle_start_angle
    }

    pub fn last_loop_angle(&self) -> f64 {
        self.last_loop_angle
    }

    pub fn advance(&mut self, loop_angle: f64, spin_sign: f64, base_unit: f64) -> ClockTick {
        self.last_loop_angle = loop_angle;
        let Some(start) = self.cycle_start_angle else {
            self.cycle_start_angle = Some(loop_angle);
            return ClockTick::Started;
        };
        let angle_delta = if spin_sign > 0.0 {
            loop_angle - start
        } else {
            start - loop_angle
        };
        if angle_delta >= base_unit {
            self.cycle_start_angle = Some(loop_angle);
            ClockTick::Completed
        } else {
            ClockTick::Running
        }
    }
}

/// Running sums over the current cycle plus the last completed average.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleAccumulator<S: Accumulate> {
    sum: S,
    sample_count: usize,
    last_average: Option<S>,
}

impl<S: Accumulate> Default for CycleAccumulator<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Accumulate> CycleAccumulator<S> {
    pub fn new() -> Self {
        Self {
            sum: S::zero(),
            sample_count: 0,
            last_average: None,
        }
    }

    /// Discards sums and the published average. Nothing is published.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Average of the last completed cycle, if any cycle has completed since the last reset.
    pub fn last_average(&self) -> Option<S> {
        self.last_average
    }

    /// Mean of the samples in the cycle still in progress.
    pub fn running_average(&self) -> Option<S> {
        (self.sample_count > 0).then(|| self.sum.scale(1.0 / self.sample_count as f64))
    }

    /// Adds a sample; non-finite samples are left out and return false.
    pub fn push(&mut self, sample: S) -> bool {
        if !sample.is_finite() {
            tracing::trace!("non-finite sample excluded from cycle average");
            return false;
        }
        self.sum = self.sum.add(&sample);
        self.sample_count += 1;
        true
    }

    /// Closes the cycle: publishes the mean when there were samples, then zeroes the sums.
    pub fn complete(&mut self) -> bool {
        let published = self.sample_count > 0;
        if published {
            self.last_average = self.running_average();
        }
        self.sum = S::zero();
        self.sample_count = 0;
        published
    }
}

/// Field and momentum averages kept in phase by one [`CycleClock`].
///
/// The sample of the completing frame opens the next cycle rather than closing this one,
/// so it is added to neither sum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleAverages {
    clock: CycleClock,
    fields: CycleAccumulator<FieldSample>,
    momentum: CycleAccumulator<MomentumSample>,
}

impl CycleAverages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    pub fn fields(&self) -> &CycleAccumulator<FieldSample> {
        &self.fields
    }

    pub fn momentum(&self) -> &CycleAccumulator<MomentumSample> {
        &self.momentum
    }

    /// Restarts the clock and discards both accumulators.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.fields.reset();
        self.momentum.reset();
    }

    /// Discards the field sums and average; the shared cycle start is kept.
    pub fn reset_fields(&mut self) {
        self.fields.reset();
    }

    /// Discards the momentum sums and average; the shared cycle start is kept.
    pub fn reset_momentum(&mut self) {
        self.momentum.reset();
    }

    pub fn record(
        &mut self,
        loop_angle: f64,
        spin_sign: f64,
        base_unit: f64,
        fields: FieldSample,
        momentum: MomentumSample,
    ) -> CycleEvent {
        match self.clock.advance(loop_angle, spin_sign, base_unit) {
            ClockTick::Completed => CycleEvent::Completed {
                fields_published: self.fields.complete(),
                momentum_published: self.momentum.complete(),
            },
            tick => {
                self.fields.push(fields);
                self.momentum.push(momentum);
                if tick == ClockTick::Started {
                    CycleEvent::Started
                } else {
                    CycleEvent::Accumulated
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Vec3;
    use std::f64::consts::PI;

    fn field(x: f64) -> FieldSample {
        FieldSample {
            electric: Vec3::new(x, 0.0, 0.0),
            magnetic: Vec3::new(0.0, 1.0, 0.0),
        }
    }

    fn momentum(x: f64) -> MomentumSample {
        MomentumSample {
            linear: Vec3::new(x, 0.0, 0.0),
            ..MomentumSample::zero()
        }
    }

    #[test]
    fn constant_input_publishes_its_mean_after_one_cycle() {
        let mut averages = CycleAverages::new();
        let base = 2.0 * PI;
        let steps = 100;
        let step = base / steps as f64;
        let mut events = Vec::new();
        for i in 0..steps {
            events.push(averages.record(i as f64 * step, 1.0, base, field(0.5), momentum(2.0)));
        }
        assert_eq!(averages.fields().sample_count(), steps);
        events.push(averages.record(base + 0.5 * step, 1.0, base, field(0.5), momentum(2.0)));
        assert_eq!(events[0], CycleEvent::Started);
        assert_eq!(
            events.last().copied(),
            Some(CycleEvent::Completed {
                fields_published: true,
                momentum_published: true
            })
        );
        let avg = averages.fields().last_average().expect("published average");
        assert!((avg.electric - Vec3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
        let avg = averages.momentum().last_average().expect("published average");
        assert!((avg.linear.x - 2.0).abs() < 1e-12);
        assert_eq!(averages.fields().sample_count(), 0);
        assert!(averages.fields().running_average().is_none());
    }

    #[test]
    fn published_average_is_arithmetic_mean() {
        let mut averages = CycleAverages::new();
        let base = 4.0 * PI;
        let values = [1.0, 2.0, 3.0, 6.0];
        for (i, v) in values.iter().enumerate() {
            averages.record(i as f64, 1.0, base, field(*v), momentum(*v));
        }
        averages.record(base + 0.5, 1.0, base, field(100.0), momentum(100.0));
        let avg = averages.fields().last_average().unwrap();
        assert!((avg.electric.x - 3.0).abs() < 1e-12);
        assert_eq!(averages.clock().cycle_start_angle(), Some(base + 0.5));
    }

    #[test]
    fn reverse_spin_measures_decreasing_angle() {
        let mut clock = CycleClock::new();
        let base = 2.0 * PI;
        assert_eq!(clock.advance(0.0, -1.0, base), ClockTick::Started);
        assert_eq!(clock.advance(-3.0, -1.0, base), ClockTick::Running);
        // Increasing angle never completes a reverse cycle.
        assert_eq!(clock.advance(10.0, -1.0, base), ClockTick::Running);
        assert_eq!(clock.advance(-7.0, -1.0, base), ClockTick::Completed);
        assert_eq!(clock.last_loop_angle(), -7.0);
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let mut averages = CycleAverages::new();
        averages.record(0.0, 1.0, 1.0, field(2.0), momentum(1.0));
        averages.record(0.1, 1.0, 1.0, field(f64::NAN), momentum(3.0));
        assert_eq!(averages.fields().sample_count(), 1);
        assert_eq!(averages.momentum().sample_count(), 2);
        averages.record(1.5, 1.0, 1.0, field(0.0), momentum(0.0));
        assert!((averages.fields().last_average().unwrap().electric.x - 2.0).abs() < 1e-12);
        assert!((averages.momentum().last_average().unwrap().linear.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn full_reset_discards_everything_without_publishing() {
        let mut averages = CycleAverages::new();
        averages.record(0.0, 1.0, 1.0, field(1.0), momentum(1.0));
        averages.record(2.0, 1.0, 1.0, field(1.0), momentum(1.0));
        assert!(averages.momentum().last_average().is_some());
        averages.record(2.5, 1.0, 1.0, field(1.0), momentum(1.0));
        averages.reset();
        assert!(averages.momentum().last_average().is_none());
        assert_eq!(averages.fields().sample_count(), 0);
        assert_eq!(averages.clock().cycle_start_angle(), None);
    }

    #[test]
    fn single_reset_keeps_both_averages_in_phase() {
        let mut averages = CycleAverages::new();
        let base = 2.0 * PI;
        let step = base / 50.0 + 1e-9;
        for i in 0..30 {
            averages.record(i as f64 * step, 1.0, base, field(1.0), momentum(1.0));
        }
        averages.reset_fields();
        assert_eq!(averages.clock().cycle_start_angle(), Some(0.0));
        assert_eq!(averages.fields().sample_count(), 0);
        assert_eq!(averages.momentum().sample_count(), 30);

        let completed: Vec<usize> = (30..120)
            .filter(|&i| {
                let event =
                    averages.record(i as f64 * step, 1.0, base, field(1.0), momentum(1.0));
                matches!(event, CycleEvent::Completed { .. })
            })
            .collect();
        assert_eq!(completed.first().copied(), Some(50));
        assert_eq!(completed.len(), 2);
        assert!(averages.fields().last_average().is_some());
        assert!(averages.momentum().last_average().is_some());
    }

    #[test]
    fn empty_cycle_does_not_publish() {
        let mut averages = CycleAverages::new();
        averages.record(0.0, 1.0, 1.0, field(f64::INFINITY), momentum(1.0));
        assert_eq!(
            averages.record(5.0, 1.0, 1.0, field(1.0), momentum(1.0)),
            CycleEvent::Completed {
                fields_published: false,
                momentum_published: true
            }
        );
        assert!(averages.fields().last_average().is_none());
    }
}
