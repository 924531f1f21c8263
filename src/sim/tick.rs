//! Per-frame simulation tick
//!
//! Advances a session in a fixed order: cast input, pointer sample, hook
//! physics, fish behavior, bite resolution, tension, reel resolution and
//! the despawn sweep.

use glam::Vec2;
use rand::Rng;

use super::fish::{Fish, FishRole, FishStats, SwimEnv, bite_chance};
use super::hook;
use super::line::{FishPull, TensionInput};
use super::modifiers::BiteModifiers;
use super::snapshot::Snapshot;
use super::state::{
    AttachSource, AttachedLink, CastPhase, CastState, PendingBite, SessionCounters, SimEvent,
    SimulationContext,
};
use super::timer::TemporalFlag;
use crate::consts::{MAX_HOOK_WEIGHT, MIN_HOOK_WEIGHT};
use crate::direction_to;
use crate::tuning::Tuning;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position in world space, if over the scene
    pub pointer: Option<Vec2>,
    /// Reel button held
    pub reel_held: bool,
    /// Cast button pressed this tick
    pub charge_start: bool,
    /// Cast button released this tick
    pub charge_release: bool,
    /// Pause toggle
    pub pause: bool,
}

/// A fishing session driven by the host one frame at a time
#[derive(Debug, Clone)]
pub struct Simulation {
    ctx: SimulationContext,
}

impl Simulation {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            ctx: SimulationContext::new(seed, tuning),
        }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Direct access for hosts and tests that stage a scene
    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    /// Advance by `dt` seconds
    pub fn tick(&mut self, dt: f32, input: &TickInput) {
        tick(&mut self.ctx, input, dt);
    }

    /// Events emitted by the last tick (or disruption)
    pub fn events(&self) -> &[SimEvent] {
        &self.ctx.events
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.ctx.counters
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.ctx)
    }

    pub fn is_paused(&self) -> bool {
        self.ctx.paused
    }

    /// Add a fish produced by the spawner; returns its id
    ///
    /// The fish starts out facing the middle of the scene.
    pub fn spawn_fish(&mut self, stats: FishStats, pos: Vec2) -> u32 {
        let id = self.ctx.next_entity_id();
        let facing = if pos.x < self.ctx.tuning.world.width * 0.5 {
            1.0
        } else {
            -1.0
        };
        log::debug!("Spawned fish {} ({}) at {:?}", id, stats.species, pos);
        self.ctx.fish.push(Fish::new(id, stats, pos, facing));
        id
    }

    pub fn set_bite_modifiers(&mut self, modifiers: BiteModifiers) {
        self.ctx.modifiers = modifiers;
    }

    pub fn set_hook_weight(&mut self, weight: f32) {
        self.ctx.hook.weight = weight.clamp(MIN_HOOK_WEIGHT, MAX_HOOK_WEIGHT);
    }

    /// Host view changed under an active cast (resize, focus loss)
    ///
    /// Resets to Idle. A hooked fish swims off without counting as a break.
    pub fn host_disrupted(&mut self) {
        let ctx = &mut self.ctx;
        ctx.events.clear();
        let was_active = ctx.cast.phase != CastPhase::Idle;
        let fish_id = ctx.attached.take().map(|link| link.fish_id);
        ctx.pending = None;

        if let Some(id) = fish_id {
            let origin = ctx.origin();
            let now = ctx.now;
            if let Some(fish) = ctx.fish.iter_mut().find(|f| f.id == id) {
                fish.start_escape(origin, now, &mut ctx.rng, &ctx.tuning.fish);
            }
        }
        if was_active || fish_id.is_some() {
            log::info!("Cast aborted by host disruption (fish {:?})", fish_id);
            reset_cast(ctx);
            ctx.line.relax();
            ctx.emit(SimEvent::CastAborted { fish_id });
        }
    }

    /// End the session: all fish, timers, links and history go in one assignment
    pub fn close(&mut self) {
        let mut fresh = SimulationContext::new(self.ctx.seed, self.ctx.tuning.clone());
        fresh.rng = self.ctx.rng.clone();
        fresh.modifiers = self.ctx.modifiers;
        fresh.hook.weight = self.ctx.hook.weight;
        self.ctx = fresh;
        log::info!("Session closed");
    }
}

/// Advance the session by `dt` seconds
pub fn tick(ctx: &mut SimulationContext, input: &TickInput, dt: f32) {
    ctx.events.clear();

    if input.pause {
        ctx.paused = !ctx.paused;
        log::debug!("Paused: {}", ctx.paused);
    }
    if ctx.paused || !dt.is_finite() || dt <= 0.0 {
        return;
    }

    ctx.now += dt as f64;

    handle_cast_input(ctx, input, dt);
    update_reel(ctx, input, dt);

    ctx.pointer = input.pointer;
    if let Some(pointer) = input.pointer {
        ctx.pointer_history.record(pointer, ctx.now);
    }

    step_hook(ctx, dt);
    let despawned = update_fish(ctx, dt);
    resolve_bites(ctx);
    update_line(ctx, dt);
    resolve_reel(ctx, dt);
    despawn(ctx, &despawned);

    ctx.cast.reel_was_held = input.reel_held;
}

fn handle_cast_input(ctx: &mut SimulationContext, input: &TickInput, dt: f32) {
    let cast = &ctx.tuning.cast;

    if ctx.cast.phase == CastPhase::Idle && input.charge_start {
        ctx.cast.phase = CastPhase::Charging;
        ctx.cast.power = 0.0;
        let origin = ctx.origin();
        ctx.hook.reset_to(origin);
    }

    if ctx.cast.phase != CastPhase::Charging {
        return;
    }

    ctx.cast.power = (ctx.cast.power + cast.charge_rate * dt).min(1.0);
    if !input.charge_release {
        return;
    }

    let origin = ctx.origin();
    let side = match input.pointer {
        Some(p) if p.x < origin.x => -1.0,
        _ => 1.0,
    };
    let speed = cast.min_speed + (cast.max_speed - cast.min_speed) * ctx.cast.power;
    let angle = cast.angle_deg.to_radians();
    let power = ctx.cast.power;

    ctx.hook.reset_to(origin);
    ctx.hook.vel = Vec2::new(side * angle.cos(), -angle.sin()) * speed;
    ctx.line.reset();
    ctx.cast.phase = CastPhase::Flying;
    ctx.cast.released_at = ctx.now;
    ctx.counters.casts += 1;

    log::info!("Cast released: power {:.2}, speed {:.0}", power, speed);
    ctx.emit(SimEvent::CastStarted { power });
}

/// Ramp reel intensity toward held/released
fn update_reel(ctx: &mut SimulationContext, input: &TickInput, dt: f32) {
    let cast = &ctx.tuning.cast;
    let reeling = input.reel_held && ctx.cast.phase.is_out();
    let intensity = if reeling {
        ctx.cast.reel_intensity + cast.reel_ramp_up * dt
    } else {
        ctx.cast.reel_intensity - cast.reel_ramp_down * dt
    };
    ctx.cast.reeling = reeling;
    ctx.cast.reel_intensity = intensity.clamp(0.0, 1.0);
}

fn step_hook(ctx: &mut SimulationContext, dt: f32) {
    if !ctx.cast.phase.is_out() {
        return;
    }

    let origin = ctx.origin();
    let reel = ctx.cast.reel();
    let now = ctx.now;
    let attached_id = ctx.attached.map(|link| link.fish_id);
    let fish = attached_id.and_then(|id| ctx.fish.iter_mut().find(|f| f.id == id));

    let step = hook::step(&mut ctx.hook, fish, reel, origin, &ctx.tuning, now, dt);

    if step.entered_water && ctx.cast.phase == CastPhase::Flying {
        ctx.cast.phase = CastPhase::Submerged;
        let pos = ctx.hook.pos;
        log::debug!("Hook splashed down at ({:.0}, {:.0})", pos.x, pos.y);
        ctx.emit(SimEvent::HookSplashed { pos });
    }
}

/// Run every fish's controller; returns ids that should despawn
fn update_fish(ctx: &mut SimulationContext, dt: f32) -> Vec<u32> {
    let env = SwimEnv {
        now: ctx.now,
        dt,
        hook: ctx.hook.pos,
        hook_in_water: ctx.hook_in_water(),
        hook_free: ctx.hook_free(),
        pointer: ctx.pointer,
        history: &ctx.hook.history,
        pointer_history: &ctx.pointer_history,
        origin: ctx.tuning.world.rod_origin,
        tuning: &ctx.tuning,
    };
    let attached = ctx.attached;
    let pending = ctx.pending;

    let mut despawned = Vec::new();
    for fish in ctx.fish.iter_mut() {
        let role = match (attached, pending) {
            (Some(link), _) if link.fish_id == fish.id => FishRole::Attached {
                offset: link.offset,
            },
            (_, Some(bite)) if bite.fish_id == fish.id => FishRole::Pending,
            _ => FishRole::Free,
        };

        let update = fish.update(role, &env, &mut ctx.rng);
        if update.pattern_matched {
            ctx.events.push(SimEvent::PatternMatched {
                fish_id: fish.id,
                pattern: fish.preferred_pattern,
            });
        }
        if update.despawn {
            despawned.push(fish.id);
        }
    }
    despawned
}

/// Pending bite expiry/hook set, then at most one new strike
fn resolve_bites(ctx: &mut SimulationContext) {
    if !ctx.cast.phase.is_out() {
        return;
    }
    let now = ctx.now;

    if let Some(bite) = ctx.pending {
        let pressed = ctx.cast.reeling && !ctx.cast.reel_was_held;
        if !bite.window.is_active(now) {
            ctx.pending = None;
            ctx.counters.misses += 1;
            if let Some(fish) = ctx.fish.iter_mut().find(|f| f.id == bite.fish_id) {
                fish.refuse(now, &mut ctx.rng, &ctx.tuning.fish);
            }
            log::info!("Fish {} spat the hook", bite.fish_id);
            ctx.emit(SimEvent::BiteMissed {
                fish_id: bite.fish_id,
            });
        } else if pressed {
            ctx.pending = None;
            attach(ctx, bite.fish_id, AttachSource::Collision);
        }
        return;
    }

    if ctx.attached.is_some() || !ctx.hook_in_water() {
        return;
    }

    // First touching fish (by id) whose contact resolves this tick. A fish
    // with a preference lingers through its inspection before any roll.
    let hook_pos = ctx.hook.pos;
    let mut contact = None;
    for idx in 0..ctx.fish.len() {
        let fish = &ctx.fish[idx];
        if !fish.can_bite(now) || !fish.touches_hook(hook_pos, &ctx.tuning.fish) {
            continue;
        }
        let chance = bite_chance(fish, fish.classification, &ctx.modifiers, &ctx.tuning.fish, now);
        if chance.guaranteed {
            contact = Some((idx, chance));
            break;
        }
        let fish = &mut ctx.fish[idx];
        if fish.is_inspecting(now) || fish.begin_inspect(now, &ctx.tuning.fish) {
            continue;
        }
        contact = Some((idx, chance));
        break;
    }
    let Some((idx, chance)) = contact else {
        return;
    };

    let fish = &ctx.fish[idx];
    let fish_id = fish.id;

    if chance.guaranteed {
        ctx.counters.bites += 1;
        attach(ctx, fish_id, AttachSource::PatternStrike);
    } else if ctx.rng.random::<f32>() < chance.probability {
        let window = fish.flash_duration * ctx.tuning.fish.pending_window_scale;
        let bite = PendingBite {
            fish_id,
            window: TemporalFlag::started(now, window),
        };
        ctx.pending = Some(bite);
        ctx.counters.bites += 1;
        log::info!(
            "Fish {} ({}) is biting, {:.2}s to set the hook",
            fish_id,
            fish.species,
            window
        );
        ctx.emit(SimEvent::BitePending {
            fish_id,
            expires_at: bite.expires_at(),
        });
    } else {
        ctx.counters.refusals += 1;
        ctx.fish[idx].refuse(now, &mut ctx.rng, &ctx.tuning.fish);
        log::debug!("Fish {} refused (p = {:.2})", fish_id, chance.probability);
        ctx.emit(SimEvent::BiteRefused { fish_id });
    }
}

fn attach(ctx: &mut SimulationContext, fish_id: u32, via: AttachSource) {
    if ctx.attached.is_some() {
        return;
    }
    let hook_pos = ctx.hook.pos;
    let Some(fish) = ctx.fish.iter_mut().find(|f| f.id == fish_id) else {
        return;
    };
    fish.hook_on();
    let offset = (fish.pos - hook_pos).clamp_length_max(fish.size * 0.5);
    log::info!("Hook set on fish {} ({}) via {:?}", fish_id, fish.species, via);

    ctx.attached = Some(AttachedLink {
        fish_id,
        offset,
        via,
    });
    ctx.counters.hook_sets += 1;
    ctx.emit(SimEvent::HookSet { fish_id, via });
}

fn update_line(ctx: &mut SimulationContext, dt: f32) {
    if !ctx.cast.phase.is_out() {
        ctx.line.length = 0.0;
        ctx.line.relax();
        return;
    }

    let now = ctx.now;
    let input = TensionInput {
        fish: ctx
            .attached_fish()
            .map(|f| FishPull::of(f, now, &ctx.tuning.fish)),
        reel: ctx.cast.reel(),
        hook_in_water: ctx.hook_in_water(),
        since_cast: ctx.cast.since_release(now),
    };

    let broke = ctx.line.update(ctx.hook.pos, &input, &ctx.tuning.line, dt);
    if broke && ctx.attached.is_some() {
        break_line(ctx);
    }
}

fn break_line(ctx: &mut SimulationContext) {
    let Some(link) = ctx.attached.take() else {
        return;
    };
    let origin = ctx.origin();
    let now = ctx.now;

    let mut species = String::new();
    if let Some(fish) = ctx.fish.iter_mut().find(|f| f.id == link.fish_id) {
        fish.start_escape(origin, now, &mut ctx.rng, &ctx.tuning.fish);
        species = fish.species.clone();
    }

    ctx.line.snap();
    reset_cast(ctx);
    ctx.counters.breaks += 1;
    log::info!("Line broke! Fish {} ({}) escaped", link.fish_id, species);
    ctx.emit(SimEvent::LineBroken {
        fish_id: link.fish_id,
        species,
    });
}

/// Reel the hook in, then land a fish or retrieve an empty hook
fn resolve_reel(ctx: &mut SimulationContext, dt: f32) {
    if !ctx.cast.phase.is_out() {
        return;
    }
    let now = ctx.now;
    let origin = ctx.origin();
    let cast = &ctx.tuning.cast;

    if ctx.cast.reeling {
        let resisting = ctx.attached_fish().is_some_and(|f| f.is_pulling(now));
        let penalty = if resisting { cast.reel_pull_penalty } else { 1.0 };
        let distance = cast.reel_speed * ctx.cast.reel_intensity * penalty * dt;
        ctx.hook.reel_toward(origin, distance);

        // A reeled line is taut: no drifting away from the rod
        let toward = direction_to(ctx.hook.pos, origin);
        let away = -ctx.hook.vel.dot(toward);
        if away > 0.0 {
            ctx.hook.vel += toward * away;
        }
    }

    let near_rod = ctx.hook.pos.distance(origin) <= cast.capture_radius;
    if !near_rod {
        return;
    }

    if ctx.attached.is_some() {
        land_fish(ctx);
    } else if ctx.cast.reeling
        && ctx.pending.is_none()
        && ctx.cast.since_release(now) > cast.retrieve_delay
    {
        reset_cast(ctx);
        ctx.line.relax();
        log::debug!("Empty hook retrieved");
        ctx.emit(SimEvent::Retrieved);
    }
}

fn land_fish(ctx: &mut SimulationContext) {
    let Some(link) = ctx.attached.take() else {
        return;
    };
    ctx.line.relax();
    reset_cast(ctx);

    let Some(idx) = ctx.fish.iter().position(|f| f.id == link.fish_id) else {
        return;
    };
    let fish = ctx.fish.remove(idx);

    ctx.counters.catches += 1;
    ctx.counters.score += fish.points as u64;
    ctx.counters.total_weight_kg += fish.weight_kg;
    log::info!(
        "Caught {} ({:.1} kg, {} pts)",
        fish.species,
        fish.weight_kg,
        fish.points
    );
    ctx.emit(SimEvent::Caught {
        fish_id: fish.id,
        species: fish.species,
        size: fish.size,
        weight_kg: fish.weight_kg,
        points: fish.points,
    });
}

/// Back to Idle with the hook at the rod tip
fn reset_cast(ctx: &mut SimulationContext) {
    let origin = ctx.origin();
    let reel_was_held = ctx.cast.reel_was_held;
    ctx.cast = CastState {
        reel_was_held,
        ..CastState::default()
    };
    ctx.pending = None;
    ctx.hook.reset_to(origin);
}

fn despawn(ctx: &mut SimulationContext, ids: &[u32]) {
    if !ids.is_empty() {
        ctx.fish.retain(|f| !ids.contains(&f.id));
        log::debug!("Despawned {} fish", ids.len());
    }

    // Links never outlive their fish
    if ctx.attached.is_some_and(|link| ctx.fish_by_id(link.fish_id).is_none()) {
        ctx.attached = None;
    }
    if ctx.pending.is_some_and(|bite| ctx.fish_by_id(bite.fish_id).is_none()) {
        ctx.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::classifier::BaitPattern;

    fn stats(preferred: BaitPattern) -> FishStats {
        FishStats {
            species: "bass".into(),
            size: 40.0,
            weight_kg: 2.0,
            speed: 0.5,
            stamina: 4.0,
            points: 25,
            bite_affinity: 0.4,
            aggression: 0.5,
            preferred_pattern: preferred,
            depth_min: 0.0,
            depth_max: 1.0,
            flash_duration: 0.6,
        }
    }

    /// A still pond where a submerged hook stays put
    fn still_water() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.hook.buoyancy = tuning.hook.gravity * tuning.hook.water_gravity_scale;
        tuning
    }

    /// Put the hook underwater at `pos`, as if it had splashed down long ago
    fn submerge(sim: &mut Simulation, pos: Vec2) {
        let ctx = sim.context_mut();
        ctx.cast.phase = CastPhase::Submerged;
        ctx.cast.released_at = -10.0;
        ctx.hook.pos = pos;
        ctx.hook.vel = Vec2::ZERO;
    }

    fn run(sim: &mut Simulation, input: &TickInput, ticks: usize) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            sim.tick(SIM_DT, input);
            events.extend(sim.events().iter().cloned());
        }
        events
    }

    #[test]
    fn test_charge_and_release_launches_cast() {
        let mut sim = Simulation::new(1, Tuning::default());
        let start = TickInput {
            charge_start: true,
            pointer: Some(Vec2::new(600.0, 300.0)),
            ..Default::default()
        };
        sim.tick(SIM_DT, &start);
        assert_eq!(sim.context().cast.phase, CastPhase::Charging);

        let hold = TickInput::default();
        run(&mut sim, &hold, 30);
        let power = sim.context().cast.power;
        assert!(power > 0.4 && power < 0.5);

        let release = TickInput {
            charge_release: true,
            pointer: Some(Vec2::new(600.0, 300.0)),
            ..Default::default()
        };
        sim.tick(SIM_DT, &release);
        let ctx = sim.context();
        assert_eq!(ctx.cast.phase, CastPhase::Flying);
        assert!(ctx.hook.vel.x > 0.0);
        assert!(ctx.hook.vel.y < 0.0);
        assert_eq!(ctx.counters.casts, 1);
        assert!(matches!(sim.events()[0], SimEvent::CastStarted { .. }));
    }

    #[test]
    fn test_cast_toward_pointer_side() {
        let mut sim = Simulation::new(1, Tuning::default());
        let origin = sim.context().origin();
        let input = TickInput {
            charge_start: true,
            charge_release: true,
            pointer: Some(origin - Vec2::new(50.0, 0.0)),
            ..Default::default()
        };
        sim.tick(SIM_DT, &input);
        assert!(sim.context().hook.vel.x < 0.0);
    }

    #[test]
    fn test_cast_splashes_down() {
        let mut sim = Simulation::new(2, Tuning::default());
        let input = TickInput {
            charge_start: true,
            charge_release: true,
            ..Default::default()
        };
        sim.tick(SIM_DT, &input);
        let events = run(&mut sim, &TickInput::default(), 240);
        assert_eq!(sim.context().cast.phase, CastPhase::Submerged);
        assert!(events.iter().any(|e| matches!(e, SimEvent::HookSplashed { .. })));
    }

    #[test]
    fn test_tick_pause() {
        let mut sim = Simulation::new(3, Tuning::default());
        sim.spawn_fish(stats(BaitPattern::Unknown), Vec2::new(500.0, 400.0));
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        sim.tick(SIM_DT, &pause);
        assert!(sim.is_paused());

        let before = sim.context().fish[0].pos;
        let now = sim.context().now;
        run(&mut sim, &TickInput::default(), 10);
        assert_eq!(sim.context().fish[0].pos, before);
        assert_eq!(sim.context().now, now);

        sim.tick(SIM_DT, &pause);
        assert!(!sim.is_paused());
        assert!(sim.context().now > now);
    }

    #[test]
    fn test_determinism() {
        let mut a = Simulation::new(99999, Tuning::default());
        let mut b = Simulation::new(99999, Tuning::default());
        for sim in [&mut a, &mut b] {
            sim.spawn_fish(stats(BaitPattern::Front), Vec2::new(300.0, 400.0));
            sim.spawn_fish(stats(BaitPattern::Still), Vec2::new(700.0, 500.0));
        }

        let inputs = [
            TickInput {
                charge_start: true,
                pointer: Some(Vec2::new(500.0, 300.0)),
                ..Default::default()
            },
            TickInput {
                charge_release: true,
                pointer: Some(Vec2::new(500.0, 300.0)),
                ..Default::default()
            },
            TickInput {
                pointer: Some(Vec2::new(520.0, 320.0)),
                ..Default::default()
            },
            TickInput {
                reel_held: true,
                ..Default::default()
            },
        ];

        for input in &inputs {
            for _ in 0..60 {
                a.tick(SIM_DT, input);
                b.tick(SIM_DT, input);
            }
        }

        let (ca, cb) = (a.context(), b.context());
        assert_eq!(ca.hook.pos, cb.hook.pos);
        assert_eq!(ca.fish.len(), cb.fish.len());
        for (fa, fb) in ca.fish.iter().zip(&cb.fish) {
            assert_eq!(fa.pos, fb.pos);
        }
        assert_eq!(ca.counters, cb.counters);
    }

    #[test]
    fn test_boosted_fish_strikes_on_contact() {
        let mut sim = Simulation::new(4, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let id = sim.spawn_fish(stats(BaitPattern::Front), hook + Vec2::new(10.0, 0.0));
        let now = sim.context().now;
        sim.context_mut().fish[0].pattern_boost.arm(now, 5.0);

        sim.tick(SIM_DT, &TickInput::default());
        let ctx = sim.context();
        let link = ctx.attached.expect("fish should be on the line");
        assert_eq!(link.fish_id, id);
        assert_eq!(link.via, AttachSource::PatternStrike);
        assert!(ctx.pending.is_none());
        assert!(ctx.fish[0].caught);
        assert_eq!(ctx.counters.hook_sets, 1);
    }

    #[test]
    fn test_pending_bite_set_by_reel_press() {
        let mut sim = Simulation::new(5, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let mut s = stats(BaitPattern::Unknown);
        s.bite_affinity = 1.0;
        s.flash_duration = 2.0;
        let id = sim.spawn_fish(s, hook + Vec2::new(10.0, 0.0));
        sim.set_bite_modifiers(BiteModifiers {
            hat: 10.0,
            ..BiteModifiers::NEUTRAL
        });

        sim.tick(SIM_DT, &TickInput::default());
        let bite = sim.context().pending.expect("bite should be pending");
        assert_eq!(bite.fish_id, id);
        assert!(sim.context().attached.is_none());

        let reel = TickInput {
            reel_held: true,
            ..Default::default()
        };
        sim.tick(SIM_DT, &reel);
        let ctx = sim.context();
        assert!(ctx.pending.is_none());
        assert_eq!(ctx.attached.map(|l| l.via), Some(AttachSource::Collision));
    }

    #[test]
    fn test_pending_bite_expires() {
        let mut sim = Simulation::new(6, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let mut s = stats(BaitPattern::Unknown);
        s.bite_affinity = 1.0;
        s.flash_duration = 0.2;
        let id = sim.spawn_fish(s, hook + Vec2::new(10.0, 0.0));
        sim.set_bite_modifiers(BiteModifiers {
            hat: 10.0,
            ..BiteModifiers::NEUTRAL
        });

        let events = run(&mut sim, &TickInput::default(), 30);
        assert!(events.contains(&SimEvent::BiteMissed { fish_id: id }));
        let ctx = sim.context();
        assert!(ctx.pending.is_none());
        assert!(ctx.attached.is_none());
        assert!(!ctx.fish[0].can_bite(ctx.now));
        assert_eq!(ctx.counters.misses, 1);
    }

    #[test]
    fn test_refusal_on_failed_roll() {
        let mut sim = Simulation::new(7, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let mut s = stats(BaitPattern::Unknown);
        s.bite_affinity = 0.0;
        let id = sim.spawn_fish(s, hook + Vec2::new(10.0, 0.0));

        sim.tick(SIM_DT, &TickInput::default());
        assert_eq!(sim.events(), &[SimEvent::BiteRefused { fish_id: id }]);
        assert!(sim.context().hook_free());
    }

    #[test]
    fn test_still_presentation_strikes() {
        for hz in [60.0_f32, 144.0] {
            let mut sim = Simulation::new(21, still_water());
            let hook = Vec2::new(500.0, 400.0);
            submerge(&mut sim, hook);
            let mut s = stats(BaitPattern::Still);
            s.speed = 60.0;
            let id = sim.spawn_fish(s, hook + Vec2::new(18.0, 4.0));

            let input = TickInput {
                pointer: Some(hook),
                ..Default::default()
            };
            let mut events = Vec::new();
            for _ in 0..(hz * 2.0) as usize {
                sim.tick(1.0 / hz, &input);
                events.extend(sim.events().iter().cloned());
            }

            assert!(
                events.contains(&SimEvent::PatternMatched {
                    fish_id: id,
                    pattern: BaitPattern::Still
                }),
                "{hz} Hz"
            );
            assert!(events.contains(&SimEvent::HookSet {
                fish_id: id,
                via: AttachSource::PatternStrike
            }));
            let ctx = sim.context();
            assert_eq!(ctx.counters.refusals, 0);
            assert_eq!(ctx.attached.map(|l| l.fish_id), Some(id));
        }
    }

    #[test]
    fn test_inspecting_fish_rolls_once_inspection_lapses() {
        let mut sim = Simulation::new(22, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let mut s = stats(BaitPattern::Still);
        s.speed = 60.0;
        s.bite_affinity = 0.0;
        let id = sim.spawn_fish(s, hook + Vec2::new(18.0, 4.0));

        // No pointer: nothing is being presented
        sim.tick(SIM_DT, &TickInput::default());
        assert!(sim.events().is_empty());
        let now = sim.context().now;
        assert!(sim.context().fish[0].is_inspecting(now));

        let inspect = sim.context().tuning.fish.inspect_duration;
        let ticks = ((inspect + 0.15) / SIM_DT) as usize;
        let events = run(&mut sim, &TickInput::default(), ticks);
        assert!(events.contains(&SimEvent::BiteRefused { fish_id: id }));
        let ctx = sim.context();
        assert_eq!(ctx.counters.refusals, 1);
        assert!(!ctx.fish[0].inspect.active);
    }

    #[test]
    fn test_inspection_ends_when_lure_leaves() {
        let mut sim = Simulation::new(23, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let mut s = stats(BaitPattern::Front);
        s.speed = 60.0;
        sim.spawn_fish(s, hook + Vec2::new(18.0, 4.0));
        sim.tick(SIM_DT, &TickInput::default());
        assert!(sim.context().fish[0].inspect.active);

        sim.context_mut().hook.pos = Vec2::new(100.0, 600.0);
        sim.tick(SIM_DT, &TickInput::default());
        assert!(!sim.context().fish[0].inspect.active);
    }

    #[test]
    fn test_only_one_fish_bites_per_tick() {
        let mut sim = Simulation::new(8, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        for dx in [5.0, -5.0, 8.0] {
            sim.spawn_fish(stats(BaitPattern::Front), hook + Vec2::new(dx, 0.0));
        }
        let now = sim.context().now;
        for fish in sim.context_mut().fish.iter_mut() {
            fish.pattern_boost.arm(now, 5.0);
        }

        run(&mut sim, &TickInput::default(), 10);
        let ctx = sim.context();
        assert!(ctx.attached.is_some());
        assert_eq!(ctx.fish.iter().filter(|f| f.caught).count(), 1);
        assert_eq!(ctx.counters.hook_sets, 1);
    }

    #[test]
    fn test_reeling_lands_fish() {
        let mut sim = Simulation::new(9, still_water());
        let origin = sim.context().origin();
        let hook = origin + Vec2::new(0.0, 100.0);
        submerge(&mut sim, hook);
        let mut s = stats(BaitPattern::Front);
        s.stamina = 0.0;
        let id = sim.spawn_fish(s, hook + Vec2::new(10.0, 0.0));
        let now = sim.context().now;
        sim.context_mut().fish[0].pattern_boost.arm(now, 5.0);
        sim.tick(SIM_DT, &TickInput::default());
        assert!(sim.context().attached.is_some());

        let reel = TickInput {
            reel_held: true,
            ..Default::default()
        };
        let events = run(&mut sim, &reel, 300);
        let caught = events.iter().find_map(|e| match e {
            SimEvent::Caught { fish_id, points, .. } => Some((*fish_id, *points)),
            _ => None,
        });
        assert_eq!(caught, Some((id, 25)));

        let ctx = sim.context();
        assert!(ctx.attached.is_none());
        assert!(ctx.fish.is_empty());
        assert_eq!(ctx.cast.phase, CastPhase::Idle);
        assert_eq!(ctx.line.break_risk, 0.0);
        assert_eq!(ctx.counters.catches, 1);
        assert_eq!(ctx.counters.score, 25);
        assert!((ctx.counters.total_weight_kg - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_break_releases_fish_in_same_tick() {
        let mut sim = Simulation::new(10, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let id = sim.spawn_fish(stats(BaitPattern::Front), hook + Vec2::new(10.0, 0.0));
        let now = sim.context().now;
        sim.context_mut().fish[0].pattern_boost.arm(now, 5.0);
        sim.tick(SIM_DT, &TickInput::default());
        assert!(sim.context().attached.is_some());

        {
            let ctx = sim.context_mut();
            ctx.line.tension = 1.0;
            ctx.line.break_risk = 0.999;
            let now = ctx.now;
            ctx.fish[0].pull_burst.arm(now, 5.0);
        }
        let reel = TickInput {
            reel_held: true,
            ..Default::default()
        };
        sim.tick(SIM_DT, &reel);

        let ctx = sim.context();
        assert_eq!(
            sim.events().last(),
            Some(&SimEvent::LineBroken {
                fish_id: id,
                species: "bass".into()
            })
        );
        assert!(ctx.attached.is_none());
        assert_eq!(ctx.line.tension, 0.0);
        assert_eq!(ctx.line.break_risk, 0.0);
        assert!(ctx.line.snapped);
        assert_eq!(ctx.hook.pos, ctx.origin());
        assert_eq!(ctx.cast.phase, CastPhase::Idle);
        assert_eq!(ctx.counters.breaks, 1);
        let fish = &ctx.fish[0];
        assert!(fish.is_escaping());
        assert!(fish.vel.length() > 0.0);
    }

    #[test]
    fn test_empty_hook_retrieved() {
        let mut sim = Simulation::new(11, still_water());
        let origin = sim.context().origin();
        submerge(&mut sim, origin + Vec2::new(0.0, 80.0));
        let reel = TickInput {
            reel_held: true,
            ..Default::default()
        };
        let events = run(&mut sim, &reel, 240);
        assert!(events.contains(&SimEvent::Retrieved));
        assert_eq!(sim.context().cast.phase, CastPhase::Idle);
        assert_eq!(sim.context().hook.pos, origin);
    }

    #[test]
    fn test_host_disruption_aborts_without_break() {
        let mut sim = Simulation::new(12, still_water());
        let hook = Vec2::new(500.0, 400.0);
        submerge(&mut sim, hook);
        let id = sim.spawn_fish(stats(BaitPattern::Front), hook + Vec2::new(10.0, 0.0));
        let now = sim.context().now;
        sim.context_mut().fish[0].pattern_boost.arm(now, 5.0);
        sim.tick(SIM_DT, &TickInput::default());
        assert!(sim.context().attached.is_some());

        sim.host_disrupted();
        let ctx = sim.context();
        assert_eq!(sim.events(), &[SimEvent::CastAborted { fish_id: Some(id) }]);
        assert_eq!(ctx.cast.phase, CastPhase::Idle);
        assert!(ctx.attached.is_none());
        assert!(ctx.fish[0].is_escaping());
        assert_eq!(ctx.counters.breaks, 0);
    }

    #[test]
    fn test_host_disruption_while_idle_is_quiet() {
        let mut sim = Simulation::new(13, Tuning::default());
        sim.host_disrupted();
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_close_clears_everything() {
        let mut sim = Simulation::new(14, still_water());
        submerge(&mut sim, Vec2::new(500.0, 400.0));
        sim.spawn_fish(stats(BaitPattern::Unknown), Vec2::new(300.0, 400.0));
        sim.set_hook_weight(2.0);
        run(&mut sim, &TickInput::default(), 5);

        sim.close();
        let ctx = sim.context();
        assert!(ctx.fish.is_empty());
        assert!(ctx.hook.history.is_empty());
        assert!(ctx.hook_free());
        assert_eq!(ctx.cast.phase, CastPhase::Idle);
        assert_eq!(ctx.now, 0.0);
        assert_eq!(ctx.hook.weight, 2.0);
    }

    #[test]
    fn test_escaped_fish_despawns() {
        let mut sim = Simulation::new(15, Tuning::default());
        sim.spawn_fish(stats(BaitPattern::Unknown), Vec2::new(500.0, 400.0));
        {
            let ctx = sim.context_mut();
            let origin = ctx.origin();
            let now = ctx.now;
            let fish = &mut ctx.fish[0];
            fish.start_escape(origin, now, &mut ctx.rng, &ctx.tuning.fish);
        }
        run(&mut sim, &TickInput::default(), 240);
        assert!(sim.context().fish.is_empty());
    }
}
