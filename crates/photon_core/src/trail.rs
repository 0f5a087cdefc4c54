//! Bounded trail of recent photon positions.

use crate::traits::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Hard cap on stored points, independent of angular span.
pub const MAX_TRAIL_POINTS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Obstructed,
}

impl Visibility {
    pub fn from_obstructed(obstructed: bool) -> Self {
        if obstructed {
            Visibility::Obstructed
        } else {
            Visibility::Visible
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub position: Vec3,
    pub visibility: Visibility,
    /// Strictly increasing over the buffer's lifetime, including across evictions.
    pub sequential_index: u64,
    pub loop_angle: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailBuffer {
    points: VecDeque<TrailPoint>,
    next_index: u64,
}

impl TrailBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a point, then evicts from the front: first while the angular span exceeds
    /// `max_span` (skipped when `None`), then down to [`MAX_TRAIL_POINTS`].
    pub fn append(&mut self, position: Vec3, obstructed: bool, loop_angle: f64, max_span: Option<f64>) {
        self.points.push_back(TrailPoint {
            position,
            visibility: Visibility::from_obstructed(obstructed),
            sequential_index: self.next_index,
            loop_angle,
        });
        self.next_index += 1;

        if let Some(span) = max_span {
            while self.points.len() > 1 {
                let oldest = match self.points.front() {
                    Some(point) => point.loop_angle,
                    None => break,
                };
                if (loop_angle - oldest).abs() > span {
                    self.points.pop_front();
                } else {
                    break;
                }
            }
        }

        while self.points.len() > MAX_TRAIL_POINTS {
            self.points.pop_front();
        }
    }

    /// Empties the buffer. Sequential indices keep counting up.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn newest(&self) -> Option<&TrailPoint> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&TrailPoint> {
        self.points.front()
    }

    /// Re-asks the occlusion oracle for every stored point.
    pub fn refresh_visibility<F>(&mut self, mut is_obstructed: F)
    where
        F: FnMut(&Vec3) -> bool,
    {
        for point in self.points.iter_mut() {
            point.visibility = Visibility::from_obstructed(is_obstructed(&point.position));
        }
    }

    /// Positions as `[x0, y0, z0, x1, ...]` for upload to a line geometry.
    pub fn flat_positions(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.position.x, p.position.y, p.position.z])
            .collect()
    }

    /// One flag per point, 1 when obstructed.
    pub fn obstruction_flags(&self) -> Vec<u8> {
        self.points
            .iter()
            .map(|p| u8::from(p.visibility == Visibility::Obstructed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn point(i: usize) -> Vec3 {
        Vec3::new(i as f64, 0.0, 0.0)
    }

    #[test]
    fn angular_span_keeps_only_recent_suffix() {
        let mut trail = TrailBuffer::new();
        let span = 4.0 * PI;
        let step = 0.1;
        for i in 0..1000 {
            trail.append(point(i), false, i as f64 * step, Some(span));
        }
        let newest = trail.newest().unwrap().loop_angle;
        let oldest = trail.oldest().unwrap().loop_angle;
        assert!(newest - oldest <= span);
        // One more point back would exceed the span.
        assert!(newest - (oldest - step) > span);
        let indices: Vec<u64> = trail.iter().map(|p| p.sequential_index).collect();
        assert!(indices.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(*indices.last().unwrap(), 999);
    }

    #[test]
    fn hard_cap_applies_without_span_limit() {
        let mut trail = TrailBuffer::new();
        for i in 0..MAX_TRAIL_POINTS + 250 {
            trail.append(point(i), false, 0.0, None);
        }
        assert_eq!(trail.len(), MAX_TRAIL_POINTS);
        assert_eq!(trail.oldest().unwrap().sequential_index, 250);
    }

    #[test]
    fn hard_cap_applies_with_wide_span() {
        let mut trail = TrailBuffer::new();
        for i in 0..MAX_TRAIL_POINTS + 10 {
            trail.append(point(i), false, i as f64 * 1e-6, Some(1e9));
        }
        assert_eq!(trail.len(), MAX_TRAIL_POINTS);
    }

    #[test]
    fn single_point_survives_any_span() {
        let mut trail = TrailBuffer::new();
        trail.append(point(0), false, 0.0, Some(1.0));
        trail.append(point(1), true, 50.0, Some(1.0));
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.newest().unwrap().visibility, Visibility::Obstructed);
    }

    #[test]
    fn span_uses_absolute_angle_for_reverse_spin() {
        let mut trail = TrailBuffer::new();
        for i in 0..10 {
            trail.append(point(i), false, -(i as f64), Some(3.0));
        }
        let angles: Vec<f64> = trail.iter().map(|p| p.loop_angle).collect();
        assert_eq!(angles, vec![-6.0, -7.0, -8.0, -9.0]);
    }

    #[test]
    fn clear_keeps_indices_increasing() {
        let mut trail = TrailBuffer::new();
        trail.append(point(0), false, 0.0, None);
        trail.append(point(1), false, 0.1, None);
        trail.clear();
        assert!(trail.is_empty());
        trail.append(point(2), false, 0.2, None);
        assert_eq!(trail.newest().unwrap().sequential_index, 2);
    }

    #[test]
    fn visibility_refresh_and_flat_export() {
        let mut trail = TrailBuffer::new();
        for i in 0..4 {
            trail.append(point(i), false, i as f64, None);
        }
        trail.refresh_visibility(|p| p.x >= 2.0);
        assert_eq!(trail.obstruction_flags(), vec![0, 0, 1, 1]);
        assert_eq!(trail.flat_positions().len(), 12);
        assert_eq!(trail.flat_positions()[3], 1.0);
    }
}
