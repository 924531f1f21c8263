//! Data-driven game balance
//!
//! Every numeric constant the simulation formulas reference lives here so a
//! host can load a JSON override without recompiling. Missing fields fall
//! back to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a tuning file cannot be used
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{low_field} ({low}) must not exceed {high_field} ({high})")]
    Inverted {
        low_field: &'static str,
        low: f32,
        high_field: &'static str,
        high: f32,
    },
}

/// Scene geometry. y grows downward; the rod sits above the waterline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub width: f32,
    pub water_level: f32,
    pub seabed_y: f32,
    pub rod_origin: Vec2,
    /// Distance past the side edges at which escaping fish despawn
    pub despawn_margin: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: 960.0,
            water_level: 180.0,
            seabed_y: 620.0,
            rod_origin: Vec2::new(120.0, 120.0),
            despawn_margin: 80.0,
        }
    }
}

impl WorldTuning {
    /// Depth of the water column
    pub fn water_depth(&self) -> f32 {
        (self.seabed_y - self.water_level).max(1.0)
    }

    /// Fraction of the water column below the surface, 0 at the surface
    pub fn depth_ratio(&self, y: f32) -> f32 {
        ((y - self.water_level) / self.water_depth()).clamp(0.0, 1.0)
    }
}

/// Hook integration constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookTuning {
    pub gravity: f32,
    /// Linear drag coefficient in air (1/s)
    pub air_drag: f32,
    /// Linear drag coefficient in water (1/s)
    pub water_drag: f32,
    /// Fraction of gravity that still applies underwater
    pub water_gravity_scale: f32,
    pub buoyancy: f32,
    /// Fraction of horizontal velocity kept on entering the water
    pub water_entry_keep: f32,
    /// Per-frame multiplicative damping of underwater vertical velocity
    pub water_vertical_damping: f32,
    pub max_sink_speed: f32,
    pub max_line_length: f32,
    /// Velocity multiplier applied when the line clamp engages
    pub line_clamp_damping: f32,
    /// Per-frame horizontal friction on the seabed
    pub seabed_friction: f32,
    pub default_weight: f32,
}

impl Default for HookTuning {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            air_drag: 0.8,
            water_drag: 3.2,
            water_gravity_scale: 0.35,
            buoyancy: 180.0,
            water_entry_keep: 0.2,
            water_vertical_damping: 0.92,
            max_sink_speed: 140.0,
            max_line_length: 560.0,
            line_clamp_damping: 0.6,
            seabed_friction: 0.85,
            default_weight: 1.0,
        }
    }
}

/// Reel and cast constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CastTuning {
    /// Cast power gained per second of charge
    pub charge_rate: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Launch elevation above horizontal, degrees
    pub angle_deg: f32,
    pub reel_speed: f32,
    /// Reel intensity ramp while held (per second)
    pub reel_ramp_up: f32,
    /// Reel intensity decay while released (per second)
    pub reel_ramp_down: f32,
    /// Reel speed multiplier while the hooked fish is pulling
    pub reel_pull_penalty: f32,
    pub capture_radius: f32,
    /// Minimum flight time before an empty hook can be retrieved
    pub retrieve_delay: f32,
}

impl Default for CastTuning {
    fn default() -> Self {
        Self {
            charge_rate: 0.9,
            min_speed: 250.0,
            max_speed: 900.0,
            angle_deg: 35.0,
            reel_speed: 160.0,
            reel_ramp_up: 2.5,
            reel_ramp_down: 4.0,
            reel_pull_penalty: 0.35,
            capture_radius: 36.0,
            retrieve_delay: 0.25,
        }
    }
}

/// Tension and break constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineTuning {
    /// Maximum tension increase per second
    pub tension_rise_rate: f32,
    /// Maximum tension decrease per second
    pub tension_fall_rate: f32,
    /// Decrease cap while the hook is above the waterline
    pub surface_decay_rate: f32,
    pub break_threshold: f32,
    /// Seconds at full tension before the line snaps
    pub break_time: f32,
    pub break_decay_rate: f32,
    /// Seconds after a cast during which break risk cannot accumulate
    pub cast_grace: f32,
}

impl Default for LineTuning {
    fn default() -> Self {
        Self {
            tension_rise_rate: 1.2,
            tension_fall_rate: 4.0,
            surface_decay_rate: 8.0,
            break_threshold: 0.85,
            break_time: 1.5,
            break_decay_rate: 0.5,
            cast_grace: 2.0,
        }
    }
}

/// Fish behavior constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FishTuning {
    /// Global scale of the force a hooked fish exerts
    pub fish_strength: f32,
    /// Size at which size-derived multipliers equal 1
    pub reference_size: f32,
    /// Stamina lost per second while the fish pulls against the reel
    pub stamina_drain_rate: f32,
    /// Stamina regained per second otherwise
    pub stamina_regen_rate: f32,
    pub attraction_radius: f32,
    pub attraction_strength: f32,
    pub refusal_min: f32,
    pub refusal_max: f32,
    pub mood_min: f32,
    pub mood_max: f32,
    pub edge_margin: f32,
    /// Leftward drift per unit of size multiplier
    pub left_bias: f32,
    pub bob_amplitude: f32,
    /// Steering responsiveness (1/s)
    pub steering_response: f32,
    pub rush_duration: f32,
    pub rush_speed_multiplier: f32,
    pub escape_timeout: f32,
    pub escape_min_speed: f32,
    pub escape_max_speed: f32,
    /// Fraction of fish size used as its bite collision radius
    pub bite_collision_scale: f32,
    /// Seconds a fish with a preference lingers at the lure before striking on chance
    pub inspect_duration: f32,
    /// Approach rate (1/s) of a fish settling onto the lure while inspecting
    pub inspect_settle_rate: f32,
    pub pending_window_scale: f32,
    pub mismatch_pattern_factor: f32,
    pub unknown_pattern_factor: f32,
    pub pull_burst_min: f32,
    pub pull_burst_max: f32,
    pub rest_min: f32,
    pub rest_max: f32,
}

impl Default for FishTuning {
    fn default() -> Self {
        Self {
            fish_strength: 420.0,
            reference_size: 40.0,
            stamina_drain_rate: 1.0,
            stamina_regen_rate: 0.15,
            attraction_radius: 220.0,
            attraction_strength: 90.0,
            refusal_min: 1.0,
            refusal_max: 3.0,
            mood_min: 1.5,
            mood_max: 5.0,
            edge_margin: 120.0,
            left_bias: 12.0,
            bob_amplitude: 10.0,
            steering_response: 3.0,
            rush_duration: 1.2,
            rush_speed_multiplier: 2.0,
            escape_timeout: 3.0,
            escape_min_speed: 180.0,
            escape_max_speed: 320.0,
            bite_collision_scale: 0.5,
            inspect_duration: 2.0,
            inspect_settle_rate: 5.0,
            pending_window_scale: 1.0,
            mismatch_pattern_factor: 0.35,
            unknown_pattern_factor: 0.6,
            pull_burst_min: 0.6,
            pull_burst_max: 1.8,
            rest_min: 0.4,
            rest_max: 1.2,
        }
    }
}

/// Bait pattern classifier constants (seconds and world units)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTuning {
    pub eligibility_radius: f32,
    pub near_radius: f32,
    /// Samples this close to the fish count toward no directional zone
    pub center_radius: f32,
    pub window: f32,
    pub dominant_dwell: f32,
    pub dominant_margin: f32,
    pub quadrant_dwell: f32,
    pub still_dwell: f32,
    /// Minimum idle share of near dwell for a still presentation
    pub still_idle_ratio: f32,
    pub active_path: f32,
    /// Maximum idle share of the window for an active presentation
    pub active_max_idle_ratio: f32,
    /// Speed under which the lure counts as idle
    pub idle_speed: f32,
    pub deep_ratio: f32,
    pub deep_dwell: f32,
    /// How long a matched preference keeps the fish primed
    pub boost_grace: f32,
    /// Gaps between samples longer than this are not credited as dwell
    pub max_sample_gap: f32,
}

impl Default for PatternTuning {
    fn default() -> Self {
        Self {
            eligibility_radius: 150.0,
            near_radius: 28.0,
            center_radius: 6.0,
            window: 3.5,
            dominant_dwell: 1.0,
            dominant_margin: 0.2,
            quadrant_dwell: 0.25,
            still_dwell: 1.0,
            still_idle_ratio: 0.8,
            active_path: 240.0,
            active_max_idle_ratio: 0.25,
            idle_speed: 12.0,
            deep_ratio: 0.8,
            deep_dwell: 0.8,
            boost_grace: 1.5,
            max_sample_gap: 0.1,
        }
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub hook: HookTuning,
    pub cast: CastTuning,
    pub line: LineTuning,
    pub fish: FishTuning,
    pub pattern: PatternTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the ranges the formulas rely on
    pub fn validate(&self) -> Result<(), TuningError> {
        use crate::consts::{HISTORY_SPAN, MAX_HOOK_WEIGHT, MIN_HOOK_WEIGHT};

        in_range("line.break_threshold", self.line.break_threshold, 0.0, 0.999)?;
        in_range(
            "hook.default_weight",
            self.hook.default_weight,
            MIN_HOOK_WEIGHT,
            MAX_HOOK_WEIGHT,
        )?;
        in_range("hook.water_entry_keep", self.hook.water_entry_keep, 0.0, 1.0)?;
        in_range("hook.line_clamp_damping", self.hook.line_clamp_damping, 0.0, 1.0)?;
        in_range("hook.water_vertical_damping", self.hook.water_vertical_damping, 0.0, 1.0)?;
        in_range("hook.seabed_friction", self.hook.seabed_friction, 0.0, 1.0)?;
        in_range("hook.air_drag", self.hook.air_drag, 0.0, f32::MAX)?;
        in_range("hook.water_drag", self.hook.water_drag, 0.0, f32::MAX)?;
        in_range("hook.max_line_length", self.hook.max_line_length, 1.0, f32::MAX)?;
        in_range("line.break_time", self.line.break_time, 0.001, f32::MAX)?;
        in_range("line.tension_rise_rate", self.line.tension_rise_rate, 0.0, f32::MAX)?;
        in_range("fish.reference_size", self.fish.reference_size, 0.001, f32::MAX)?;
        in_range("fish.inspect_duration", self.fish.inspect_duration, 0.0, f32::MAX)?;
        in_range("pattern.deep_ratio", self.pattern.deep_ratio, 0.0, 1.0)?;
        in_range("pattern.window", self.pattern.window, 0.1, HISTORY_SPAN)?;

        ordered(
            "world.water_level",
            self.world.water_level,
            "world.seabed_y",
            self.world.seabed_y,
        )?;
        ordered("cast.min_speed", self.cast.min_speed, "cast.max_speed", self.cast.max_speed)?;
        ordered("fish.refusal_min", self.fish.refusal_min, "fish.refusal_max", self.fish.refusal_max)?;
        ordered("fish.mood_min", self.fish.mood_min, "fish.mood_max", self.fish.mood_max)?;
        ordered(
            "fish.escape_min_speed",
            self.fish.escape_min_speed,
            "fish.escape_max_speed",
            self.fish.escape_max_speed,
        )?;
        ordered(
            "fish.pull_burst_min",
            self.fish.pull_burst_min,
            "fish.pull_burst_max",
            self.fish.pull_burst_max,
        )?;
        ordered("fish.rest_min", self.fish.rest_min, "fish.rest_max", self.fish.rest_max)?;
        ordered(
            "pattern.near_radius",
            self.pattern.near_radius,
            "pattern.eligibility_radius",
            self.pattern.eligibility_radius,
        )?;
        ordered(
            "line.tension_rise_rate",
            self.line.tension_rise_rate,
            "line.tension_fall_rate",
            self.line.tension_fall_rate,
        )?;
        Ok(())
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn ordered(
    low_field: &'static str,
    low: f32,
    high_field: &'static str,
    high: f32,
) -> Result<(), TuningError> {
    if low <= high {
        Ok(())
    } else {
        Err(TuningError::Inverted {
            low_field,
            low,
            high_field,
            high,
        })
    }
}
