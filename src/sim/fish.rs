//! Fish entities and the per-fish behavior controller
//!
//! Each tick a fish is in exactly one role: free (swimming, reacting to the
//! hook, judging the presentation), pending (struck, waiting to be set),
//! attached (fighting on the line) or escaping (fleeing after a break).

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::classifier::{BaitPattern, Classification, PatternTarget, Presentation, classify};
use super::history::MotionHistory;
use super::modifiers::BiteModifiers;
use super::timer::{TemporalFlag, Timestamp};
use crate::consts::HOOK_RADIUS;
use crate::tuning::{FishTuning, Tuning};
use crate::{direction_to, dist_or_one, frame_damping};

/// Stats resolved by the spawner for one fish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishStats {
    pub species: String,
    pub size: f32,
    pub weight_kg: f32,
    /// Maximum swim speed
    pub speed: f32,
    pub stamina: f32,
    pub points: u32,
    pub bite_affinity: f32,
    pub aggression: f32,
    pub preferred_pattern: BaitPattern,
    /// Preferred band as fractions of the water column
    pub depth_min: f32,
    pub depth_max: f32,
    /// Seconds the player has to set the hook after a strike
    pub flash_duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    /// Drawn toward the hook
    Curious,
    /// Shies away from the hook
    Wary,
}

/// Post-break flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Escape {
    pub vel: Vec2,
    pub despawn_at: Timestamp,
}

/// What the controller should do with a fish this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FishRole {
    Free,
    /// Struck and waiting for the hook set
    Pending,
    /// On the line, held at `offset` from the hook
    Attached { offset: Vec2 },
}

/// Read-only view of the world a fish reacts to
#[derive(Debug, Clone, Copy)]
pub struct SwimEnv<'a> {
    pub now: Timestamp,
    pub dt: f32,
    pub hook: Vec2,
    pub hook_in_water: bool,
    /// No bite pending and nothing attached
    pub hook_free: bool,
    pub pointer: Option<Vec2>,
    pub history: &'a MotionHistory,
    pub pointer_history: &'a MotionHistory,
    pub origin: Vec2,
    pub tuning: &'a Tuning,
}

/// Result of updating one fish
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FishUpdate {
    pub despawn: bool,
    /// The presentation newly matched this fish's preference
    pub pattern_matched: bool,
}

/// Outcome of the bite roll inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiteChance {
    pub probability: f32,
    /// Preference matched: strike is certain and sets itself
    pub guaranteed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fish {
    pub id: u32,
    pub species: String,
    pub pos: Vec2,
    pub vel: Vec2,
    /// +1 swimming right, -1 swimming left
    pub facing: f32,
    /// Render heading in radians
    pub angle: f32,
    pub size: f32,
    pub weight_kg: f32,
    pub max_speed: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub bite_affinity: f32,
    pub aggression: f32,
    pub preferred_pattern: BaitPattern,
    pub points: u32,
    pub depth_min: f32,
    pub depth_max: f32,
    pub flash_duration: f32,
    pub mood: Mood,
    pub mood_strength: f32,
    /// Next mood re-roll
    pub mood_timer: TemporalFlag,
    pub refusal: TemporalFlag,
    /// Lingering at the lure while a presentation forms
    pub inspect: TemporalFlag,
    pub rush: TemporalFlag,
    pub pattern_boost: TemporalFlag,
    pub pull_burst: TemporalFlag,
    pub rest: TemporalFlag,
    pub swim_phase: f32,
    pub caught: bool,
    pub escape: Option<Escape>,
    /// Latest verdict for this fish (progress indicator)
    pub classification: Classification,
}

impl Fish {
    pub fn new(id: u32, stats: FishStats, pos: Vec2, facing: f32) -> Self {
        let stamina = stats.stamina.max(0.0);
        Self {
            id,
            species: stats.species,
            pos,
            vel: Vec2::ZERO,
            facing: if facing < 0.0 { -1.0 } else { 1.0 },
            angle: 0.0,
            size: stats.size,
            weight_kg: stats.weight_kg,
            max_speed: stats.speed,
            stamina,
            max_stamina: stamina,
            bite_affinity: stats.bite_affinity,
            aggression: stats.aggression,
            preferred_pattern: stats.preferred_pattern,
            points: stats.points,
            depth_min: stats.depth_min.min(stats.depth_max),
            depth_max: stats.depth_max.max(stats.depth_min),
            flash_duration: stats.flash_duration,
            mood: Mood::Curious,
            mood_strength: 0.5,
            mood_timer: TemporalFlag::INACTIVE,
            refusal: TemporalFlag::INACTIVE,
            inspect: TemporalFlag::INACTIVE,
            rush: TemporalFlag::INACTIVE,
            pattern_boost: TemporalFlag::INACTIVE,
            pull_burst: TemporalFlag::INACTIVE,
            rest: TemporalFlag::INACTIVE,
            swim_phase: (id as f32 * 1.7) % std::f32::consts::TAU,
            caught: false,
            escape: None,
            classification: Classification::UNKNOWN,
        }
    }

    pub fn stamina_fraction(&self) -> f32 {
        if self.max_stamina > 0.0 {
            (self.stamina / self.max_stamina).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Size relative to the reference fish, clamped
    pub fn size_multiplier(&self, tuning: &FishTuning) -> f32 {
        (self.size / tuning.reference_size).clamp(0.5, 2.5)
    }

    pub fn is_escaping(&self) -> bool {
        self.escape.is_some()
    }

    /// Actively fighting (only meaningful while attached)
    pub fn is_pulling(&self, now: Timestamp) -> bool {
        self.stamina > 0.0 && self.pull_burst.is_active(now)
    }

    /// Eligible to strike at all
    pub fn can_bite(&self, now: Timestamp) -> bool {
        !self.caught && self.escape.is_none() && !self.refusal.is_active(now)
    }

    pub fn pattern_target(&self) -> PatternTarget {
        PatternTarget {
            pos: self.pos,
            facing: self.facing,
        }
    }

    /// Proximity/size collision test against the hook
    pub fn touches_hook(&self, hook: Vec2, tuning: &FishTuning) -> bool {
        self.pos.distance(hook) <= self.size * tuning.bite_collision_scale + HOOK_RADIUS
    }

    /// Start lingering at the lure instead of rolling for a strike
    ///
    /// Returns false once the fish has already spent its inspection, or when
    /// it has no preference a presentation could satisfy.
    pub fn begin_inspect(&mut self, now: Timestamp, tuning: &FishTuning) -> bool {
        if !self.preferred_pattern.is_known() || self.inspect.active {
            return false;
        }
        self.inspect.arm(now, tuning.inspect_duration);
        log::debug!("Fish {} ({}) inspecting the lure", self.id, self.species);
        true
    }

    pub fn is_inspecting(&self, now: Timestamp) -> bool {
        self.inspect.is_active(now)
    }

    /// Enter the refusal cooldown
    pub fn refuse(&mut self, now: Timestamp, rng: &mut Pcg32, tuning: &FishTuning) {
        let cooldown = rng.random_range(tuning.refusal_min..=tuning.refusal_max);
        self.refusal.arm(now, cooldown);
        self.inspect.clear();
        self.rush.clear();
        self.pattern_boost.clear();
    }

    /// Fix the fish to the hook
    pub fn hook_on(&mut self) {
        self.caught = true;
        self.inspect.clear();
        self.rush.clear();
        self.pattern_boost.clear();
        self.pull_burst.clear();
        self.rest.clear();
        self.classification = Classification::UNKNOWN;
    }

    /// Break away from the line, fleeing away from the player
    pub fn start_escape(
        &mut self,
        origin: Vec2,
        now: Timestamp,
        rng: &mut Pcg32,
        tuning: &FishTuning,
    ) {
        let away = if self.pos.x < origin.x { -1.0 } else { 1.0 };
        let heading = Vec2::new(away, 0.25).normalize();
        let speed = rng
            .random_range(tuning.escape_min_speed..=tuning.escape_max_speed)
            .max(1.0);

        self.caught = false;
        self.facing = away;
        self.inspect.clear();
        self.rush.clear();
        self.pattern_boost.clear();
        self.pull_burst.clear();
        self.rest.clear();
        self.vel = heading * speed;
        self.escape = Some(Escape {
            vel: self.vel,
            despawn_at: now + tuning.escape_timeout as f64,
        });
    }

    /// Advance one tick in the given role
    pub fn update(&mut self, role: FishRole, env: &SwimEnv, rng: &mut Pcg32) -> FishUpdate {
        if let Some(escape) = self.escape {
            return FishUpdate {
                despawn: self.flee(escape, env),
                pattern_matched: false,
            };
        }

        match role {
            FishRole::Attached { offset } => {
                self.fight(offset, env, rng);
                FishUpdate::default()
            }
            FishRole::Pending => {
                self.nibble(env);
                FishUpdate::default()
            }
            FishRole::Free => self.swim(env, rng),
        }
    }

    fn flee(&mut self, escape: Escape, env: &SwimEnv) -> bool {
        let world = &env.tuning.world;
        self.vel = escape.vel;
        self.pos += self.vel * env.dt;
        self.angle = self.vel.y.atan2(self.vel.x);

        let margin = world.despawn_margin;
        let outside = self.pos.x < -margin
            || self.pos.x > world.width + margin
            || self.pos.y > world.seabed_y + margin;
        env.now >= escape.despawn_at || outside
    }

    fn fight(&mut self, offset: Vec2, env: &SwimEnv, rng: &mut Pcg32) {
        let prev = self.pos;
        self.pos = env.hook + offset;
        if env.dt > 0.0 {
            self.vel = (self.pos - prev) / env.dt;
        }
        self.facing = if self.pos.x < env.origin.x { -1.0 } else { 1.0 };
        self.angle = if self.vel.length_squared() > 1.0 {
            self.vel.y.atan2(self.vel.x)
        } else {
            0.0
        };
        self.update_pull_cycle(env.now, rng, &env.tuning.fish);
    }

    /// Alternate pulling bursts and rests while stamina lasts
    fn update_pull_cycle(&mut self, now: Timestamp, rng: &mut Pcg32, tuning: &FishTuning) {
        if self.stamina <= 0.0 {
            self.pull_burst.clear();
            self.rest.clear();
            return;
        }
        if self.pull_burst.is_active(now) || self.rest.is_active(now) {
            return;
        }

        let vigor = 0.5 + self.aggression;
        if self.pull_burst.active {
            // burst just ran out
            self.pull_burst.clear();
            let rest = rng.random_range(tuning.rest_min..=tuning.rest_max) / vigor;
            self.rest.arm(now, rest);
        } else {
            self.rest.clear();
            let burst = rng.random_range(tuning.pull_burst_min..=tuning.pull_burst_max) * vigor;
            self.pull_burst.arm(now, burst);
        }
    }

    fn nibble(&mut self, env: &SwimEnv) {
        let to_hook = env.hook - self.pos;
        self.vel = self.vel * frame_damping(0.85, env.dt) + to_hook * 2.0 * env.dt;
        self.pos += self.vel * env.dt;
        if to_hook.x.abs() > 1.0 {
            self.facing = to_hook.x.signum();
        }
        self.angle = self.vel.y.atan2(self.vel.x.abs().max(1.0) * self.facing) * 0.3;
    }

    fn swim(&mut self, env: &SwimEnv, rng: &mut Pcg32) -> FishUpdate {
        let tuning = &env.tuning.fish;
        let world = &env.tuning.world;
        let now = env.now;
        let dt = env.dt;
        let mut update = FishUpdate::default();

        if !self.mood_timer.is_active(now) {
            self.reroll_mood(now, rng, tuning);
        }

        // Judge the presentation while the hook is available
        self.classification = if env.hook_free && env.hook_in_water {
            let presentation = Presentation {
                hook: env.hook,
                pointer: env.pointer,
                hook_history: env.history,
                pointer_history: env.pointer_history,
            };
            classify(
                &presentation,
                self.pattern_target(),
                world,
                &env.tuning.pattern,
                now,
            )
        } else {
            Classification::UNKNOWN
        };
        if self.classification.matches(self.preferred_pattern) && !self.refusal.is_active(now) {
            if !self.pattern_boost.is_active(now) {
                update.pattern_matched = true;
                self.rush.arm(now, tuning.rush_duration);
                log::debug!(
                    "Fish {} ({}) matched pattern {}",
                    self.id,
                    self.species,
                    self.preferred_pattern.as_str()
                );
            }
            self.pattern_boost.extend(now, env.tuning.pattern.boost_grace);
        }

        if self.rush.is_active(now) && env.hook_in_water {
            self.rush_hook(env);
            return update;
        }

        if self.inspect.active {
            let lure_gone = !env.hook_in_water
                || !env.hook_free
                || self.pos.distance(env.hook) > env.tuning.pattern.eligibility_radius;
            if lure_gone {
                self.inspect.clear();
            } else if self.inspect.is_active(now) {
                self.linger(env);
                return update;
            }
        }

        self.swim_phase = (self.swim_phase + dt * (1.2 + self.max_speed / 60.0)) % 1000.0;
        let cruise = self.max_speed * 0.6;
        let size_mult = self.size_multiplier(tuning);

        // Edge avoidance: slow down approaching a wall, then turn back
        let gap = if self.facing < 0.0 {
            self.pos.x
        } else {
            world.width - self.pos.x
        };
        let urgency = (1.0 - gap / tuning.edge_margin.max(1.0)).clamp(0.0, 1.0);
        if urgency >= 0.9 || rng.random::<f32>() < urgency * urgency * dt * 3.0 {
            self.facing = -self.facing;
        }
        let speed_scale = 1.0 - urgency * 0.8;

        let stroke = 0.75 + 0.25 * self.swim_phase.sin();
        let bias = (tuning.left_bias * (size_mult - 1.0).max(0.0)).min(cruise * 0.5);
        let mut desired = Vec2::new(
            self.facing * cruise * stroke * speed_scale - bias,
            (self.swim_phase * 0.7).cos() * tuning.bob_amplitude,
        );

        // Drift back into the preferred depth band
        let band_top = world.water_level + self.depth_min * world.water_depth();
        let band_bottom = world.water_level + self.depth_max * world.water_depth();
        let correction = if self.pos.y < band_top {
            band_top - self.pos.y
        } else if self.pos.y > band_bottom {
            band_bottom - self.pos.y
        } else {
            0.0
        };
        desired.y += (correction * 0.8).clamp(-cruise * 0.5, cruise * 0.5);

        if env.hook_in_water {
            desired += self.hook_reaction(env);
        }

        let blend = (tuning.steering_response * dt).min(1.0);
        self.vel = self.vel.lerp(desired, blend).clamp_length_max(self.max_speed);
        self.pos += self.vel * dt;
        self.keep_in_water(env);
        if self.vel.length_squared() > 1.0 {
            self.angle = self.vel.y.atan2(self.vel.x.abs()) * self.facing;
        }

        update
    }

    /// Attraction or repulsion toward the hook within the attraction radius
    fn hook_reaction(&self, env: &SwimEnv) -> Vec2 {
        let tuning = &env.tuning.fish;
        let to_hook = env.hook - self.pos;
        let d = to_hook.length();
        if d >= tuning.attraction_radius {
            return Vec2::ZERO;
        }

        let falloff = (1.0 - d / tuning.attraction_radius).powi(2);
        let force = to_hook / dist_or_one(d) * tuning.attraction_strength * self.mood_strength * falloff;

        if self.refusal.is_active(env.now) {
            -force
        } else if env.hook_free {
            force
        } else {
            match self.mood {
                Mood::Curious => force,
                Mood::Wary => -force,
            }
        }
    }

    /// Hold position at the lure so the player can work a presentation
    ///
    /// A fish wanting the lure at its nose (still, deep) settles onto it;
    /// the others stop and keep their heading so zones stay meaningful.
    fn linger(&mut self, env: &SwimEnv) {
        let dt = env.dt;
        let settle = matches!(self.preferred_pattern, BaitPattern::Still | BaitPattern::Deep);
        if settle && dt > 0.0 {
            // Exponential approach, exact for any step size
            let pull = 1.0 - (-env.tuning.fish.inspect_settle_rate * dt).exp();
            let step = ((env.hook - self.pos) * pull).clamp_length_max(self.max_speed.max(1.0) * dt);
            self.vel = step / dt;
        } else {
            self.vel *= frame_damping(0.85, dt);
        }
        self.pos += self.vel * dt;
        self.keep_in_water(env);
        self.angle *= frame_damping(0.9, env.dt);
    }

    /// Direct pursuit, overriding every other steering input
    fn rush_hook(&mut self, env: &SwimEnv) {
        let dir = direction_to(self.pos, env.hook);
        let d = self.pos.distance(env.hook);
        let top_speed = self.max_speed * env.tuning.fish.rush_speed_multiplier;
        let speed = if env.dt > 0.0 {
            top_speed.min(d / env.dt)
        } else {
            top_speed
        };
        self.vel = dir * speed;
        self.pos += self.vel * env.dt;
        if dir.x.abs() > f32::EPSILON {
            self.facing = dir.x.signum();
        }
        self.angle = self.vel.y.atan2(self.vel.x.abs()) * self.facing;
    }

    fn reroll_mood(&mut self, now: Timestamp, rng: &mut Pcg32, tuning: &FishTuning) {
        let curious_chance = (0.35 + self.aggression * 0.5).clamp(0.0, 1.0);
        self.mood = if rng.random::<f32>() < curious_chance {
            Mood::Curious
        } else {
            Mood::Wary
        };
        self.mood_strength = rng.random_range(0.3..=1.0);
        let duration = rng.random_range(tuning.mood_min..=tuning.mood_max);
        self.mood_timer.arm(now, duration);
    }

    fn keep_in_water(&mut self, env: &SwimEnv) {
        let world = &env.tuning.world;
        let margin = (self.size * 0.3).min(world.water_depth() * 0.25);
        let top = world.water_level + margin;
        let bottom = world.seabed_y - margin;
        if self.pos.y < top {
            self.pos.y = top;
            self.vel.y = self.vel.y.max(0.0);
        } else if self.pos.y > bottom {
            self.pos.y = bottom;
            self.vel.y = self.vel.y.min(0.0);
        }
        self.pos.x = self.pos.x.clamp(0.0, world.width);
    }
}

/// Bite probability for `fish` given the current presentation
///
/// A presentation matching the fish's preference (or a live boost from an
/// earlier match) makes the strike certain; anything else scales the
/// environmental probability down.
pub fn bite_chance(
    fish: &Fish,
    classification: Classification,
    modifiers: &BiteModifiers,
    tuning: &FishTuning,
    now: Timestamp,
) -> BiteChance {
    let boosted = fish.preferred_pattern.is_known() && fish.pattern_boost.is_active(now);
    if classification.matches(fish.preferred_pattern) || boosted {
        return BiteChance {
            probability: 1.0,
            guaranteed: true,
        };
    }

    let pattern_scale = if classification.pattern.is_known() {
        tuning.mismatch_pattern_factor
    } else {
        tuning.unknown_pattern_factor
    };
    BiteChance {
        probability: (fish.bite_affinity * modifiers.factor() * pattern_scale).clamp(0.0, 1.0),
        guaranteed: false,
    }
}
