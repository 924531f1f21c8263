//! Line tension and break risk
//!
//! Tension is a smoothed scalar in [0, 1] chasing a target derived from the
//! fish's pull and the player's reel. It may fall quickly but never spikes.
//! Sustained tension above the break threshold fills the break accumulator;
//! reaching 1 snaps the line.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fish::Fish;
use super::hook::{ForceRegime, ReelInput};
use super::timer::Timestamp;
use crate::tuning::{FishTuning, LineTuning};

/// The single fishing line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineState {
    pub origin: Vec2,
    /// Current rod-tip to hook distance
    pub length: f32,
    pub tension: f32,
    /// Break risk accumulator, snaps at 1
    pub break_risk: f32,
    /// The last fight ended with the line snapping
    pub snapped: bool,
}

impl LineState {
    pub fn new(origin: Vec2) -> Self {
        Self {
            origin,
            length: 0.0,
            tension: 0.0,
            break_risk: 0.0,
            snapped: false,
        }
    }

    /// Fresh line for a new cast
    pub fn reset(&mut self) {
        self.length = 0.0;
        self.tension = 0.0;
        self.break_risk = 0.0;
        self.snapped = false;
    }

    /// Slack line after a catch or an aborted fight
    pub fn relax(&mut self) {
        self.tension = 0.0;
        self.break_risk = 0.0;
    }

    /// Line just broke: zero everything, remember the snap
    pub fn snap(&mut self) {
        self.relax();
        self.snapped = true;
    }

    /// Advance tension and break risk by `dt`; returns true when the line breaks
    pub fn update(&mut self, hook: Vec2, input: &TensionInput, tuning: &LineTuning, dt: f32) -> bool {
        self.length = hook.distance(self.origin);

        let (target, fall_rate) = if input.hook_in_water {
            (target_tension(input.fish, input.reel), tuning.tension_fall_rate)
        } else {
            (0.0, tuning.surface_decay_rate.max(tuning.tension_fall_rate))
        };
        self.tension = smooth_tension(
            self.tension,
            target,
            tuning.tension_rise_rate * dt,
            fall_rate * dt,
        );

        let threshold = tuning.break_threshold;
        let fighting = input.fish.is_some_and(|f| f.stamina > 0.0);
        if self.tension > threshold && input.since_cast > tuning.cast_grace && fighting {
            let excess = (self.tension - threshold) / (1.0 - threshold);
            self.break_risk += excess * excess * dt / tuning.break_time;
        } else {
            self.break_risk = (self.break_risk - tuning.break_decay_rate * dt).max(0.0);
        }

        self.break_risk >= 1.0
    }
}

/// The hooked fish as the tension model sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FishPull {
    pub pulling: bool,
    pub size_mult: f32,
    pub stamina: f32,
    pub stamina_frac: f32,
}

impl FishPull {
    pub fn of(fish: &Fish, now: Timestamp, tuning: &FishTuning) -> Self {
        Self {
            pulling: fish.is_pulling(now),
            size_mult: fish.size_multiplier(tuning),
            stamina: fish.stamina,
            stamina_frac: fish.stamina_fraction(),
        }
    }
}

/// Everything the line needs from the rest of the tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensionInput {
    pub fish: Option<FishPull>,
    pub reel: ReelInput,
    pub hook_in_water: bool,
    /// Seconds since the current cast was released
    pub since_cast: f32,
}

/// Target tension for the current pull/reel regime, in [0, 1]
pub fn target_tension(fish: Option<FishPull>, reel: ReelInput) -> f32 {
    let Some(fish) = fish else {
        return 0.0;
    };
    let m = fish.size_mult.sqrt();
    let pull = (0.4 + 0.6 * fish.stamina_frac) * fish.size_mult;
    let reel_force = reel.intensity.clamp(0.0, 1.0);

    let target = match ForceRegime::new(fish.pulling, reel.held) {
        ForceRegime::Tug => 0.6 * (pull + reel_force) * m,
        ForceRegime::Run => 0.35 * pull * m,
        ForceRegime::Haul => 0.35 * reel_force * m,
        ForceRegime::Slack => 0.15 * pull * m,
    };
    target.clamp(0.0, 1.0)
}

/// Move `current` toward `target` by at most `max_rise` up or `max_fall` down
pub fn smooth_tension(current: f32, target: f32, max_rise: f32, max_fall: f32) -> f32 {
    let delta = target - current;
    let step = if delta > 0.0 {
        delta.min(max_rise)
    } else {
        delta.max(-max_fall)
    };
    (current + step).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn reeling(intensity: f32) -> ReelInput {
        ReelInput {
            held: true,
            intensity,
        }
    }

    fn fresh_fish(pulling: bool) -> FishPull {
        FishPull {
            pulling,
            size_mult: 1.0,
            stamina: 5.0,
            stamina_frac: 1.0,
        }
    }

    fn fight(fish: FishPull, reel: ReelInput) -> TensionInput {
        TensionInput {
            fish: Some(fish),
            reel,
            hook_in_water: true,
            since_cast: 10.0,
        }
    }

    #[test]
    fn test_target_regimes() {
        let fish = fresh_fish(true);
        assert_eq!(target_tension(Some(fish), reeling(1.0)), 1.0);
        assert!((target_tension(Some(fish), ReelInput::default()) - 0.35).abs() < 1e-6);

        let resting = fresh_fish(false);
        assert!((target_tension(Some(resting), reeling(0.5)) - 0.175).abs() < 1e-6);
        assert!((target_tension(Some(resting), ReelInput::default()) - 0.15).abs() < 1e-6);
        assert_eq!(target_tension(None, reeling(1.0)), 0.0);
    }

    #[test]
    fn test_target_scales_with_size() {
        let mut big = fresh_fish(true);
        big.size_mult = 2.5;
        let small = fresh_fish(true);
        let reel = ReelInput::default();
        assert!(target_tension(Some(big), reel) > target_tension(Some(small), reel));
    }

    #[test]
    fn test_rise_is_rate_limited() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::ZERO);
        let input = fight(fresh_fish(true), reeling(1.0));
        let cap = tuning.tension_rise_rate * DT;

        let mut prev = line.tension;
        for _ in 0..20 {
            line.update(Vec2::new(0.0, 300.0), &input, &tuning, DT);
            assert!(line.tension - prev <= cap + 1e-6);
            assert!(line.tension > prev);
            prev = line.tension;
        }
    }

    #[test]
    fn test_surfacing_drops_fast() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::ZERO);
        line.tension = 0.1;
        let mut input = fight(fresh_fish(true), reeling(1.0));
        input.hook_in_water = false;
        line.update(Vec2::new(0.0, 50.0), &input, &tuning, DT);
        assert_eq!(line.tension, 0.0);

        line.tension = 0.9;
        line.update(Vec2::new(0.0, 50.0), &input, &tuning, DT);
        let dropped = 0.9 - line.tension;
        assert!((dropped - tuning.surface_decay_rate * DT).abs() < 1e-5);
        assert!(dropped > tuning.tension_rise_rate * DT);
    }

    #[test]
    fn test_accumulates_only_above_threshold() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::ZERO);
        line.tension = 0.95;
        let input = fight(fresh_fish(true), reeling(1.0));
        line.update(Vec2::new(0.0, 300.0), &input, &tuning, DT);
        assert!(line.break_risk > 0.0);

        let mut quiet = LineState::new(Vec2::ZERO);
        quiet.tension = 0.5;
        quiet.break_risk = 0.4;
        let calm = fight(fresh_fish(false), ReelInput::default());
        quiet.update(Vec2::new(0.0, 300.0), &calm, &tuning, DT);
        assert!((quiet.break_risk - (0.4 - tuning.break_decay_rate * DT)).abs() < 1e-6);
    }

    #[test]
    fn test_no_risk_during_cast_grace() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::ZERO);
        line.tension = 1.0;
        let mut input = fight(fresh_fish(true), reeling(1.0));
        input.since_cast = 0.5;
        line.update(Vec2::new(0.0, 300.0), &input, &tuning, DT);
        assert_eq!(line.break_risk, 0.0);
    }

    #[test]
    fn test_no_risk_from_exhausted_fish() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::ZERO);
        line.tension = 1.0;
        let mut fish = fresh_fish(true);
        fish.stamina = 0.0;
        line.update(Vec2::new(0.0, 300.0), &fight(fish, reeling(1.0)), &tuning, DT);
        assert_eq!(line.break_risk, 0.0);
    }

    #[test]
    fn test_sustained_max_tension_breaks_in_break_time() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::ZERO);
        line.tension = 1.0;
        let input = fight(fresh_fish(true), reeling(1.0));
        let mut ticks = 0;
        while !line.update(Vec2::new(0.0, 300.0), &input, &tuning, DT) {
            ticks += 1;
            assert!(ticks < 1000);
        }
        let elapsed = (ticks + 1) as f32 * DT;
        assert!((elapsed - tuning.break_time).abs() < 2.0 * DT);
    }

    #[test]
    fn test_snap_zeroes_and_flags() {
        let mut line = LineState::new(Vec2::ZERO);
        line.tension = 0.9;
        line.break_risk = 1.0;
        line.snap();
        assert_eq!(line.tension, 0.0);
        assert_eq!(line.break_risk, 0.0);
        assert!(line.snapped);
        line.reset();
        assert!(!line.snapped);
    }

    #[test]
    fn test_length_tracks_hook() {
        let tuning = LineTuning::default();
        let mut line = LineState::new(Vec2::new(10.0, 10.0));
        let input = TensionInput {
            fish: None,
            reel: ReelInput::default(),
            hook_in_water: true,
            since_cast: 0.0,
        };
        line.update(Vec2::new(10.0, 60.0), &input, &tuning, DT);
        assert!((line.length - 50.0).abs() < 1e-5);
    }
}
