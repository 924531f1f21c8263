//! Motion history for the hook and the pointer
//!
//! A ring of recent samples bounded by age, not by count, so the same span of
//! motion is kept at 30 Hz or 240 Hz. The classifier reads it oldest-first,
//! only looking at the trailing time window it cares about.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::timer::Timestamp;
use crate::consts::{HISTORY_CAPACITY, HISTORY_MIN_INTERVAL, HISTORY_SPAN};

/// One recorded position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub pos: Vec2,
    /// Speed between the previous sample and this one
    pub speed: f32,
    pub t: Timestamp,
}

/// Age-bounded sample ring (oldest at the front)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionHistory {
    samples: VecDeque<MotionSample>,
    /// Hard cap on stored samples
    capacity: usize,
    /// Seconds kept behind the newest sample
    span: f32,
}

impl Default for MotionHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl MotionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            span: HISTORY_SPAN,
        }
    }

    /// Append a sample, deriving its speed from the previous one
    ///
    /// Samples arriving within `HISTORY_MIN_INTERVAL` of the previous one are
    /// dropped, which bounds the count for very small host steps.
    pub fn record(&mut self, pos: Vec2, t: Timestamp) {
        let speed = match self.samples.back() {
            Some(prev) if t - prev.t < HISTORY_MIN_INTERVAL => return,
            Some(prev) => pos.distance(prev.pos) / (t - prev.t) as f32,
            None => 0.0,
        };
        self.push(MotionSample { pos, speed, t });
    }

    /// Append a sample as-is, evicting anything older than the span
    pub fn push(&mut self, sample: MotionSample) {
        let oldest = sample.t - self.span as f64;
        while self
            .samples
            .front()
            .is_some_and(|s| s.t < oldest || self.samples.len() >= self.capacity)
        {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&MotionSample> {
        self.samples.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &MotionSample> {
        self.samples.iter()
    }

    /// Samples no older than `window` seconds before `now`, oldest first
    pub fn window(&self, now: Timestamp, window: f32) -> impl Iterator<Item = &MotionSample> {
        let since = now - window as f64;
        self.samples.iter().filter(move |s| s.t >= since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_enforced() {
        let mut history = MotionHistory::new(4);
        for i in 0..10 {
            history.record(Vec2::new(i as f32, 0.0), i as f64);
        }
        assert_eq!(history.len(), 4);
        let xs: Vec<f32> = history.iter().map(|s| s.pos.x).collect();
        assert_eq!(xs, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_speed_derived_from_previous_sample() {
        let mut history = MotionHistory::default();
        history.record(Vec2::ZERO, 0.0);
        history.record(Vec2::new(3.0, 4.0), 0.5);
        assert_eq!(history.latest().unwrap().speed, 10.0);
    }

    #[test]
    fn test_first_sample_has_zero_speed() {
        let mut history = MotionHistory::default();
        history.record(Vec2::ONE, 1.0);
        assert_eq!(history.latest().unwrap().speed, 0.0);
    }

    #[test]
    fn test_samples_too_close_together_are_coalesced() {
        let mut history = MotionHistory::default();
        history.record(Vec2::ONE, 1.0);
        history.record(Vec2::new(50.0, 50.0), 1.0);
        history.record(Vec2::new(60.0, 60.0), 1.001);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().pos, Vec2::ONE);
    }

    #[test]
    fn test_window_filters_old_samples() {
        let mut history = MotionHistory::default();
        for i in 0..4 {
            history.record(Vec2::ZERO, i as f64);
        }
        assert_eq!(history.window(3.0, 1.5).count(), 2);
        assert_eq!(history.window(3.0, 100.0).count(), 4);
    }

    #[test]
    fn test_span_is_independent_of_frame_rate() {
        for hz in [30.0, 60.0, 144.0, 240.0] {
            let mut history = MotionHistory::default();
            let dt = 1.0 / hz;
            let mut t = 0.0;
            while t < 10.0 {
                history.record(Vec2::ZERO, t);
                t += dt;
            }
            let oldest = history.iter().next().unwrap().t;
            let newest = history.latest().unwrap().t;
            let kept = (newest - oldest) as f32;
            assert!(kept <= HISTORY_SPAN + 1e-3, "{hz} Hz kept {kept}");
            assert!(kept >= HISTORY_SPAN - 2.0 * dt as f32, "{hz} Hz kept {kept}");
        }
    }

    #[test]
    fn test_tiny_steps_stay_under_capacity() {
        let mut history = MotionHistory::default();
        let mut t = 0.0;
        for _ in 0..20_000 {
            history.record(Vec2::ZERO, t);
            t += 0.001;
        }
        assert!(history.len() < HISTORY_CAPACITY);
        let oldest = history.iter().next().unwrap().t;
        assert!(t - 0.001 - oldest > 3.9);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(MotionHistory::default().capacity(), HISTORY_CAPACITY);
    }
}
