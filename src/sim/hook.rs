//! Hook physics integrator
//!
//! Advances the hook under gravity, linear drag, buoyancy and the pull of a
//! hooked fish, then applies the line-length and seabed constraints.
//! Drag is integrated in closed form so the result does not depend on the
//! frame rate.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fish::Fish;
use super::history::MotionHistory;
use super::timer::Timestamp;
use crate::consts::{MAX_HOOK_WEIGHT, MIN_HOOK_WEIGHT};
use crate::tuning::{Tuning, WorldTuning};
use crate::{direction_to, dist_or_one, frame_damping};

/// The single hook of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Weight factor (0.5 - 3.0): heavier sinks faster and drifts less
    pub weight: f32,
    #[serde(skip)]
    pub history: MotionHistory,
}

impl Hook {
    pub fn new(origin: Vec2, weight: f32) -> Self {
        Self {
            pos: origin,
            vel: Vec2::ZERO,
            weight: weight.clamp(MIN_HOOK_WEIGHT, MAX_HOOK_WEIGHT),
            history: MotionHistory::default(),
        }
    }

    /// Back to the rod tip, at rest, with no motion history
    pub fn reset_to(&mut self, origin: Vec2) {
        self.pos = origin;
        self.vel = Vec2::ZERO;
        self.history.clear();
    }

    pub fn is_underwater(&self, world: &WorldTuning) -> bool {
        self.pos.y >= world.water_level
    }

    /// `1 + (w - 1) * 0.35`: how strongly weight scales sinking
    pub fn weight_scale(&self) -> f32 {
        1.0 + (self.weight - 1.0) * 0.35
    }

    /// Move straight toward `origin` by up to `distance`
    pub fn reel_toward(&mut self, origin: Vec2, distance: f32) {
        let offset = origin - self.pos;
        let d = offset.length();
        if d <= distance {
            self.pos = origin;
        } else {
            self.pos += offset / dist_or_one(d) * distance;
        }
    }
}

/// Opposing-force regime between a hooked fish and the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceRegime {
    /// Fish pulling while the player reels
    Tug,
    /// Fish pulling, player not reeling
    Run,
    /// Player reeling a resting fish
    Haul,
    /// Neither side pulling
    Slack,
}

impl ForceRegime {
    pub fn new(pulling: bool, reeling: bool) -> Self {
        match (pulling, reeling) {
            (true, true) => ForceRegime::Tug,
            (true, false) => ForceRegime::Run,
            (false, true) => ForceRegime::Haul,
            (false, false) => ForceRegime::Slack,
        }
    }

    /// Share of the fish force directed away from the rod
    pub fn radial(&self) -> f32 {
        match self {
            ForceRegime::Tug => 1.0,
            ForceRegime::Run => 0.6,
            ForceRegime::Haul => 0.15,
            ForceRegime::Slack => 0.0,
        }
    }

    /// Share of the fish force directed sideways
    pub fn tangential(&self) -> f32 {
        match self {
            ForceRegime::Tug => 0.35,
            ForceRegime::Run => 0.6,
            ForceRegime::Haul => 0.15,
            ForceRegime::Slack => 0.15,
        }
    }

    /// Both sides pulling against each other
    pub fn opposed(&self) -> bool {
        *self == ForceRegime::Tug
    }
}

/// Reel input as seen by the integrator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReelInput {
    pub held: bool,
    /// Smoothed intensity in [0, 1]
    pub intensity: f32,
}

/// What happened during one integration step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HookStep {
    pub entered_water: bool,
    pub line_clamped: bool,
    pub on_seabed: bool,
}

/// Velocity after `dt` under constant acceleration `accel` and linear drag `k`
///
/// Exact solution of `dv/dt = a - k v`.
pub fn integrate_drag(vel: Vec2, accel: Vec2, k: f32, dt: f32) -> Vec2 {
    if k <= 1e-6 {
        return vel + accel * dt;
    }
    let decay = (-k * dt).exp();
    vel * decay + accel / k * (1.0 - decay)
}

/// Advance the hook by `dt`, applying the hooked fish's pull if any
pub fn step(
    hook: &mut Hook,
    fish: Option<&mut Fish>,
    reel: ReelInput,
    origin: Vec2,
    tuning: &Tuning,
    now: Timestamp,
    dt: f32,
) -> HookStep {
    let h = &tuning.hook;
    let world = &tuning.world;
    let mut result = HookStep::default();

    let weight = hook.weight.clamp(MIN_HOOK_WEIGHT, MAX_HOOK_WEIGHT);
    let weight_scale = hook.weight_scale();
    let was_underwater = hook.is_underwater(world);

    let (mut accel, drag) = if was_underwater {
        let sink = h.gravity * h.water_gravity_scale * weight_scale - h.buoyancy / weight;
        (Vec2::new(0.0, sink), h.water_drag / weight.sqrt())
    } else {
        (Vec2::new(0.0, h.gravity), h.air_drag / weight.sqrt())
    };

    if let Some(fish) = fish {
        accel += fish_force(hook.pos, fish, reel, origin, tuning, now, dt);
    }

    hook.vel = integrate_drag(hook.vel, accel, drag, dt);

    if was_underwater {
        let max_vertical = h.max_sink_speed * weight_scale;
        hook.vel.y = (hook.vel.y * frame_damping(h.water_vertical_damping, dt))
            .clamp(-max_vertical, max_vertical);
    }

    hook.pos += hook.vel * dt;

    if !was_underwater && hook.is_underwater(world) {
        hook.vel.x *= h.water_entry_keep;
        result.entered_water = true;
    }

    let offset = hook.pos - origin;
    let d = offset.length();
    if d > h.max_line_length {
        hook.pos = origin + offset / dist_or_one(d) * h.max_line_length;
        hook.vel *= h.line_clamp_damping;
        result.line_clamped = true;
    }

    if hook.pos.y >= world.seabed_y {
        hook.pos.y = world.seabed_y;
        hook.vel.y = hook.vel.y.min(0.0);
        hook.vel.x *= frame_damping(h.seabed_friction, dt);
        result.on_seabed = true;
    }

    hook.history.record(hook.pos, now);
    result
}

/// Force a hooked fish exerts on the hook; drains or regenerates its stamina
fn fish_force(
    hook_pos: Vec2,
    fish: &mut Fish,
    reel: ReelInput,
    origin: Vec2,
    tuning: &Tuning,
    now: Timestamp,
    dt: f32,
) -> Vec2 {
    let f = &tuning.fish;
    let regime = ForceRegime::new(fish.is_pulling(now), reel.held);
    let strength =
        f.fish_strength * fish.size_multiplier(f) * (0.15 + 0.85 * fish.stamina_fraction());

    let radial = direction_to(origin, hook_pos);
    let tangent = radial.perp() * fish.facing;

    if regime.opposed() {
        let drain = f.stamina_drain_rate * (0.5 + 0.5 * reel.intensity) * dt;
        fish.stamina = (fish.stamina - drain).max(0.0);
    } else {
        fish.stamina = (fish.stamina + f.stamina_regen_rate * dt).min(fish.max_stamina);
    }

    radial * regime.radial() * strength + tangent * regime.tangential() * strength
}
