//! Bait pattern classifier
//!
//! Reads the hook's recent motion around one fish and decides which lure
//! technique the player is presenting. Only stretches of motion the player
//! was guiding with the pointer near the fish count. Pure: no state is kept
//! between calls; the pattern-boost grace window lives on the fish.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::history::{MotionHistory, MotionSample};
use super::timer::Timestamp;
use crate::tuning::{PatternTuning, WorldTuning};

/// Lure technique a fish may prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaitPattern {
    /// No recognizable technique (or no preference)
    #[default]
    Unknown,
    /// Held motionless right at the fish
    Still,
    /// Worked in front of the fish's face
    Front,
    /// Worked behind the fish
    Back,
    Above,
    Below,
    /// Circled through all four quadrants
    Complete,
    /// Jigged around with constant movement
    Active,
    /// Held near the fish close to the bottom
    Deep,
}

impl BaitPattern {
    pub const ALL: [BaitPattern; 8] = [
        BaitPattern::Still,
        BaitPattern::Front,
        BaitPattern::Back,
        BaitPattern::Above,
        BaitPattern::Below,
        BaitPattern::Complete,
        BaitPattern::Active,
        BaitPattern::Deep,
    ];

    pub fn is_known(&self) -> bool {
        *self != BaitPattern::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaitPattern::Unknown => "unknown",
            BaitPattern::Still => "still",
            BaitPattern::Front => "front",
            BaitPattern::Back => "back",
            BaitPattern::Above => "above",
            BaitPattern::Below => "below",
            BaitPattern::Complete => "complete",
            BaitPattern::Active => "active",
            BaitPattern::Deep => "deep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unknown" | "none" => Some(BaitPattern::Unknown),
            "still" => Some(BaitPattern::Still),
            "front" => Some(BaitPattern::Front),
            "back" | "behind" => Some(BaitPattern::Back),
            "above" => Some(BaitPattern::Above),
            "below" => Some(BaitPattern::Below),
            "complete" | "circle" => Some(BaitPattern::Complete),
            "active" => Some(BaitPattern::Active),
            "deep" => Some(BaitPattern::Deep),
            _ => None,
        }
    }
}

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub pattern: BaitPattern,
    /// 1.0 for a recognized pattern, otherwise best partial progress in [0, 1)
    pub score: f32,
}

impl Classification {
    pub const UNKNOWN: Self = Self {
        pattern: BaitPattern::Unknown,
        score: 0.0,
    };

    /// True when this verdict satisfies a fish preferring `preferred`
    pub fn matches(&self, preferred: BaitPattern) -> bool {
        preferred.is_known() && self.pattern == preferred
    }
}

/// What the player is currently showing: the lure and the pointer guiding it
#[derive(Debug, Clone, Copy)]
pub struct Presentation<'a> {
    pub hook: Vec2,
    pub pointer: Option<Vec2>,
    pub hook_history: &'a MotionHistory,
    pub pointer_history: &'a MotionHistory,
}

/// The fish a presentation is judged against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternTarget {
    pub pos: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Front = 0,
    Back = 1,
    Above = 2,
    Below = 3,
}

const ZONE_PATTERNS: [BaitPattern; 4] = [
    BaitPattern::Front,
    BaitPattern::Back,
    BaitPattern::Above,
    BaitPattern::Below,
];

/// Dwell and movement totals gathered over the classification window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PatternMetrics {
    /// Dwell per directional zone: front, back, above, below
    pub zone_dwell: [f32; 4],
    /// Dwell per quadrant: front-above, front-below, back-above, back-below
    pub quadrant_dwell: [f32; 4],
    /// Time within the near radius
    pub near_time: f32,
    /// Idle time within the near radius
    pub near_idle: f32,
    /// Time near the fish while deep in the water column
    pub deep_time: f32,
    /// Path length while within the eligibility radius
    pub path_length: f32,
    /// Time within the eligibility radius
    pub window_time: f32,
    /// Idle time within the eligibility radius
    pub window_idle: f32,
}

impl PatternMetrics {
    /// Gather totals for `target` from the hook history
    ///
    /// A segment is credited only if the pointer was sampled near the fish
    /// at most `max_sample_gap` before the segment ends.
    pub fn measure(
        presentation: &Presentation,
        target: PatternTarget,
        world: &WorldTuning,
        tuning: &PatternTuning,
        now: Timestamp,
    ) -> Self {
        let mut metrics = Self::default();
        let mut prev: Option<&MotionSample> = None;
        let mut pointer = presentation
            .pointer_history
            .window(now, tuning.window + tuning.max_sample_gap)
            .peekable();
        let mut guide: Option<&MotionSample> = None;

        for sample in presentation.hook_history.window(now, tuning.window) {
            while let Some(p) = pointer.next_if(|p| p.t <= sample.t) {
                guide = Some(p);
            }
            if let Some(p) = prev {
                let real_dt = (sample.t - p.t) as f32;
                let guided = guide.is_some_and(|g| {
                    sample.t - g.t <= tuning.max_sample_gap as f64
                        && g.pos.distance(target.pos) <= tuning.eligibility_radius
                });
                if real_dt > 0.0 && guided {
                    metrics.add_segment(p, sample, real_dt, target, world, tuning);
                }
            }
            prev = Some(sample);
        }

        metrics
    }

    fn add_segment(
        &mut self,
        from: &MotionSample,
        to: &MotionSample,
        real_dt: f32,
        target: PatternTarget,
        world: &WorldTuning,
        tuning: &PatternTuning,
    ) {
        let credit = real_dt.min(tuning.max_sample_gap);
        let step = from.pos.distance(to.pos);
        let idle = step / real_dt < tuning.idle_speed;

        let rel = to.pos - target.pos;
        let dist = rel.length();
        if dist > tuning.eligibility_radius {
            return;
        }

        self.window_time += credit;
        self.path_length += step;
        if idle {
            self.window_idle += credit;
        }

        if dist > tuning.near_radius {
            return;
        }

        self.near_time += credit;
        if idle {
            self.near_idle += credit;
        }
        if world.depth_ratio(to.pos.y) >= tuning.deep_ratio {
            self.deep_time += credit;
        }

        if dist <= tuning.center_radius {
            return;
        }

        // Local frame: +x is ahead of the fish, -y is above it
        let facing = if target.facing < 0.0 { -1.0 } else { 1.0 };
        let ahead = rel.x * facing;
        let zone = if ahead.abs() >= rel.y.abs() {
            if ahead >= 0.0 { Zone::Front } else { Zone::Back }
        } else if rel.y < 0.0 {
            Zone::Above
        } else {
            Zone::Below
        };
        self.zone_dwell[zone as usize] += credit;

        let quadrant = match (ahead >= 0.0, rel.y < 0.0) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };
        self.quadrant_dwell[quadrant] += credit;
    }

    /// Best and runner-up directional zone dwell
    fn dominant_zone(&self) -> (usize, f32, f32) {
        let mut best = 0;
        for i in 1..4 {
            if self.zone_dwell[i] > self.zone_dwell[best] {
                best = i;
            }
        }
        let runner_up = (0..4)
            .filter(|&i| i != best)
            .map(|i| self.zone_dwell[i])
            .fold(0.0_f32, f32::max);
        (best, self.zone_dwell[best], runner_up)
    }

    fn weakest_quadrant(&self) -> f32 {
        self.quadrant_dwell.iter().copied().fold(f32::INFINITY, f32::min)
    }

    fn near_idle_ratio(&self) -> f32 {
        if self.near_time > 0.0 {
            self.near_idle / self.near_time
        } else {
            0.0
        }
    }

    fn window_idle_ratio(&self) -> f32 {
        if self.window_time > 0.0 {
            self.window_idle / self.window_time
        } else {
            1.0
        }
    }

    /// Decide the presented pattern, in priority order
    pub fn classify(&self, tuning: &PatternTuning) -> Classification {
        if self.weakest_quadrant() >= tuning.quadrant_dwell {
            return matched(BaitPattern::Complete);
        }
        if self.deep_time >= tuning.deep_dwell {
            return matched(BaitPattern::Deep);
        }

        let (best, best_dwell, runner_up) = self.dominant_zone();
        let dominant = best_dwell >= tuning.dominant_dwell;
        if dominant && best_dwell - runner_up >= tuning.dominant_margin {
            return matched(ZONE_PATTERNS[best]);
        }

        if !dominant
            && self.near_time >= tuning.still_dwell
            && self.near_idle_ratio() >= tuning.still_idle_ratio
        {
            return matched(BaitPattern::Still);
        }

        if self.path_length >= tuning.active_path
            && self.window_idle_ratio() <= tuning.active_max_idle_ratio
        {
            return matched(BaitPattern::Active);
        }

        let best_progress = BaitPattern::ALL
            .iter()
            .map(|&p| self.progress(p, tuning))
            .fold(0.0_f32, f32::max);
        Classification {
            pattern: BaitPattern::Unknown,
            score: best_progress.min(0.99),
        }
    }

    /// Partial progress in [0, 1] toward presenting `pattern`
    pub fn progress(&self, pattern: BaitPattern, tuning: &PatternTuning) -> f32 {
        let ratio = |value: f32, goal: f32| (value / goal.max(f32::EPSILON)).clamp(0.0, 1.0);
        match pattern {
            BaitPattern::Unknown => 0.0,
            BaitPattern::Still => {
                ratio(self.near_time, tuning.still_dwell)
                    * ratio(self.near_idle_ratio(), tuning.still_idle_ratio)
            }
            BaitPattern::Front | BaitPattern::Back | BaitPattern::Above | BaitPattern::Below => {
                let idx = match pattern {
                    BaitPattern::Front => Zone::Front,
                    BaitPattern::Back => Zone::Back,
                    BaitPattern::Above => Zone::Above,
                    _ => Zone::Below,
                } as usize;
                ratio(self.zone_dwell[idx], tuning.dominant_dwell)
            }
            BaitPattern::Complete => {
                let sum: f32 = self
                    .quadrant_dwell
                    .iter()
                    .map(|&d| ratio(d, tuning.quadrant_dwell))
                    .sum();
                sum / 4.0
            }
            BaitPattern::Active => {
                let idle_ok = if self.window_idle_ratio() <= tuning.active_max_idle_ratio {
                    1.0
                } else {
                    0.5
                };
                ratio(self.path_length, tuning.active_path) * idle_ok
            }
            BaitPattern::Deep => ratio(self.deep_time, tuning.deep_dwell),
        }
    }
}

fn matched(pattern: BaitPattern) -> Classification {
    Classification {
        pattern,
        score: 1.0,
    }
}

/// Whether both the lure and the pointer are close enough to judge at all
pub fn is_eligible(
    target: PatternTarget,
    hook: Vec2,
    pointer: Option<Vec2>,
    tuning: &PatternTuning,
) -> bool {
    match pointer {
        Some(pointer) => {
            hook.distance(target.pos) <= tuning.eligibility_radius
                && pointer.distance(target.pos) <= tuning.eligibility_radius
        }
        None => false,
    }
}

/// Classify the current presentation to `target`
///
/// Returns `Unknown` whenever the hook or the pointer is outside the
/// eligibility radius, regardless of history contents.
pub fn classify(
    presentation: &Presentation,
    target: PatternTarget,
    world: &WorldTuning,
    tuning: &PatternTuning,
    now: Timestamp,
) -> Classification {
    if !is_eligible(target, presentation.hook, presentation.pointer, tuning) {
        return Classification::UNKNOWN;
    }
    PatternMetrics::measure(presentation, target, world, tuning, now).classify(tuning)
}
