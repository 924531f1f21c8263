//! Immutable per-frame view for renderers and UI

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::classifier::{BaitPattern, Classification, PatternMetrics, Presentation};
use super::state::{CastPhase, SessionCounters, SimulationContext};
use super::timer::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HookView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub weight: f32,
    pub underwater: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineView {
    pub origin: Vec2,
    pub length: f32,
    pub tension: f32,
    pub break_risk: f32,
    pub snapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FishStatus {
    Swimming,
    Biting,
    Hooked,
    Escaping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishView {
    pub id: u32,
    pub species: String,
    pub pos: Vec2,
    pub angle: f32,
    pub facing: f32,
    pub size: f32,
    pub stamina: f32,
    pub stamina_fraction: f32,
    pub status: FishStatus,
}

/// Presentation progress toward the focus fish's preferred pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternView {
    pub fish_id: u32,
    pub preferred: BaitPattern,
    pub classification: Classification,
    /// Progress toward `preferred` in [0, 1]
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub now: Timestamp,
    pub phase: CastPhase,
    pub paused: bool,
    pub charge_power: f32,
    pub reeling: bool,
    pub reel_intensity: f32,
    pub hook: HookView,
    pub line: LineView,
    pub fish: Vec<FishView>,
    pub pattern: Option<PatternView>,
    /// Set while a bite is waiting for the hook set
    pub bite_expires_at: Option<Timestamp>,
    pub counters: SessionCounters,
}

impl Snapshot {
    pub fn capture(ctx: &SimulationContext) -> Self {
        let fish = ctx
            .fish
            .iter()
            .map(|f| {
                let status = if f.is_escaping() {
                    FishStatus::Escaping
                } else if ctx.attached.is_some_and(|l| l.fish_id == f.id) {
                    FishStatus::Hooked
                } else if ctx.pending.is_some_and(|b| b.fish_id == f.id) {
                    FishStatus::Biting
                } else {
                    FishStatus::Swimming
                };
                FishView {
                    id: f.id,
                    species: f.species.clone(),
                    pos: f.pos,
                    angle: f.angle,
                    facing: f.facing,
                    size: f.size,
                    stamina: f.stamina,
                    stamina_fraction: f.stamina_fraction(),
                    status,
                }
            })
            .collect();

        Self {
            now: ctx.now,
            phase: ctx.cast.phase,
            paused: ctx.paused,
            charge_power: ctx.cast.power,
            reeling: ctx.cast.reeling,
            reel_intensity: ctx.cast.reel_intensity,
            hook: HookView {
                pos: ctx.hook.pos,
                vel: ctx.hook.vel,
                weight: ctx.hook.weight,
                underwater: ctx.hook.is_underwater(&ctx.tuning.world),
            },
            line: LineView {
                origin: ctx.line.origin,
                length: ctx.line.length,
                tension: ctx.line.tension,
                break_risk: ctx.line.break_risk,
                snapped: ctx.line.snapped,
            },
            fish,
            pattern: focus_pattern(ctx),
            bite_expires_at: ctx.pending.map(|b| b.expires_at()),
            counters: ctx.counters.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Progress indicator for the free fish nearest the hook, if one is judging it
fn focus_pattern(ctx: &SimulationContext) -> Option<PatternView> {
    if !ctx.hook_in_water() || !ctx.hook_free() {
        return None;
    }
    let radius = ctx.tuning.pattern.eligibility_radius;
    let hook = ctx.hook.pos;
    let fish = ctx
        .fish
        .iter()
        .filter(|f| !f.caught && !f.is_escaping() && f.preferred_pattern.is_known())
        .map(|f| (f.pos.distance(hook), f))
        .filter(|(d, _)| *d <= radius)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, f)| f)?;

    let presentation = Presentation {
        hook,
        pointer: ctx.pointer,
        hook_history: &ctx.hook.history,
        pointer_history: &ctx.pointer_history,
    };
    let metrics = PatternMetrics::measure(
        &presentation,
        fish.pattern_target(),
        &ctx.tuning.world,
        &ctx.tuning.pattern,
        ctx.now,
    );
    let progress = if fish.classification.matches(fish.preferred_pattern) {
        1.0
    } else {
        metrics.progress(fish.preferred_pattern, &ctx.tuning.pattern)
    };

    Some(PatternView {
        fish_id: fish.id,
        preferred: fish.preferred_pattern,
        classification: fish.classification,
        progress,
    })
}
