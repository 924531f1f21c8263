//! Lurecast headless demo
//!
//! Drives a scripted fishing session on the fixed-step loop a real host
//! would use, spawning fish from a built-in catalog and logging every event.
//!
//! Usage: `lurecast [seed] [tuning.json]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use lurecast::consts::{MAX_SUBSTEPS, SIM_DT};
use lurecast::sim::{BiteModifiers, CastPhase, Season, SimEvent, Simulation, TickInput, TimeOfDay};
use lurecast::{Catalog, Progression, Tuning};

/// Simulated session length in seconds
const SESSION_SECONDS: f32 = 180.0;
/// Fish kept in the pond
const POND_POPULATION: usize = 6;
/// Give up on a cast after this long without a bite
const CAST_PATIENCE: f32 = 12.0;

const CATALOG: &str = r#"{
    "species": [
        {
            "id": "perch", "name": "Perch",
            "size": { "min": 18.0, "max": 32.0 },
            "speed": { "min": 50.0, "max": 70.0 },
            "stamina": { "min": 2.0, "max": 3.5 },
            "weight_kg": { "min": 0.2, "max": 0.9 },
            "points": 10, "bite_affinity": 0.55, "aggression": 0.4,
            "preferred_pattern": "still",
            "depth": { "min": 0.1, "max": 0.5 }
        },
        {
            "id": "pike", "name": "Pike",
            "size": { "min": 45.0, "max": 80.0 },
            "speed": { "min": 80.0, "max": 110.0 },
            "stamina": { "min": 5.0, "max": 8.0 },
            "weight_kg": { "min": 2.0, "max": 9.0 },
            "points": 40, "bite_affinity": 0.25, "aggression": 0.8,
            "preferred_pattern": "active",
            "flash_duration": 0.45
        },
        {
            "id": "catfish", "name": "Catfish",
            "size": { "min": 40.0, "max": 70.0 },
            "speed": { "min": 30.0, "max": 45.0 },
            "stamina": { "min": 6.0, "max": 9.0 },
            "weight_kg": { "min": 1.5, "max": 7.0 },
            "points": 30, "bite_affinity": 0.3, "aggression": 0.2,
            "preferred_pattern": "deep",
            "depth": { "min": 0.7, "max": 1.0 },
            "flash_duration": 0.9
        }
    ],
    "hats": [
        { "id": "straw", "name": "Straw Hat" },
        { "id": "lucky", "name": "Lucky Cap", "bite_multiplier": 1.2, "unlock_catches": 3 }
    ]
}"#;

/// Demo host holding the simulation and its collaborators
struct Demo {
    sim: Simulation,
    catalog: Catalog,
    progression: Progression,
    rng: Pcg32,
    accumulator: f32,
    input: TickInput,
    wall_time: f64,
    cast_since: f32,
}

impl Demo {
    fn new(seed: u64, tuning: Tuning, catalog: Catalog) -> Self {
        let mut sim = Simulation::new(seed, tuning);
        sim.set_bite_modifiers(BiteModifiers::new(TimeOfDay::Dusk, Season::Autumn));
        Self {
            sim,
            catalog,
            progression: Progression::new(),
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed),
            accumulator: 0.0,
            input: TickInput::default(),
            wall_time: 0.0,
            cast_since: 0.0,
        }
    }

    /// Run simulation ticks for one host frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;
        self.wall_time += dt as f64;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.restock();
            self.drive();
            let input = self.input.clone();
            self.sim.tick(SIM_DT, &input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.charge_start = false;
            self.input.charge_release = false;
            self.input.pause = false;

            self.collect_events();
        }
    }

    /// Trivial spawner: uniform species, random spot in the water
    fn restock(&mut self) {
        let ctx = self.sim.context();
        if ctx.fish.len() >= POND_POPULATION {
            return;
        }
        let world = ctx.tuning.world.clone();
        let idx = self.rng.random_range(0..self.catalog.species.len());
        let stats = self.catalog.species[idx].resolve(&mut self.rng);
        let band_top = world.water_level + stats.depth_min * world.water_depth();
        let band_bottom = world.water_level + stats.depth_max * world.water_depth();
        let pos = Vec2::new(
            self.rng.random_range(world.width * 0.3..world.width * 0.95),
            self.rng.random_range(band_top..=band_bottom.max(band_top)),
        );
        self.sim.spawn_fish(stats, pos);
    }

    /// Scripted player: cast, work the lure, set hooks, reel in pulses
    fn drive(&mut self) {
        let ctx = self.sim.context();
        let hook = ctx.hook.pos;
        let origin = ctx.origin();
        self.cast_since += SIM_DT;

        match ctx.cast.phase {
            CastPhase::Idle => {
                self.input.reel_held = false;
                self.input.pointer = Some(origin + Vec2::new(300.0, 200.0));
                self.input.charge_start = true;
                self.cast_since = 0.0;
            }
            CastPhase::Charging => {
                if ctx.cast.power >= 0.6 {
                    self.input.charge_release = true;
                }
            }
            CastPhase::Flying => {}
            CastPhase::Submerged => {
                if ctx.pending.is_some() {
                    // Fresh press sets the hook
                    self.input.reel_held = !self.input.reel_held;
                } else if ctx.attached.is_some() {
                    // Ease off when the line gets hot
                    self.input.reel_held = ctx.line.tension < ctx.tuning.line.break_threshold - 0.1;
                } else if self.cast_since > CAST_PATIENCE {
                    self.input.reel_held = true;
                } else {
                    self.input.reel_held = false;
                    // Hover the pointer over the lure so nearby fish can judge it
                    self.input.pointer = Some(hook);
                }
            }
        }
    }

    fn collect_events(&mut self) {
        let timestamp = self.wall_time * 1000.0;
        for event in self.sim.events() {
            match event {
                SimEvent::Caught { species, weight_kg, .. } => {
                    log::info!("Landed a {} of {:.2} kg", species, weight_kg);
                }
                SimEvent::LineBroken { species, .. } => {
                    log::warn!("Lost a {} to a snapped line", species);
                }
                _ => log::debug!("{:?}", event),
            }
            if let Some(rank) = self.progression.record(event, timestamp) {
                log::info!("Trophy board rank {}", rank);
            }
        }
    }
}

fn load_tuning(path: Option<&str>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
    {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::warn!("Failed to load tuning from {}: {} (using defaults)", path, e);
            Tuning::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lurecast demo starting...");

    let args: Vec<String> = std::env::args().collect();
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = load_tuning(args.get(2).map(String::as_str));

    let catalog = match Catalog::from_json(CATALOG) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::error!("Built-in catalog is invalid: {}", e);
            return;
        }
    };

    let mut demo = Demo::new(seed, tuning, catalog);
    log::info!("Session seeded with {}", seed);

    // Host frames jitter around 60 Hz
    let mut frame_rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
    let mut elapsed = 0.0;
    while elapsed < SESSION_SECONDS {
        let frame = frame_rng.random_range(1.0 / 75.0..1.0 / 45.0);
        demo.update(frame);
        elapsed += frame;
    }
    demo.sim.close();

    let stats = &demo.progression.lifetime;
    log::info!(
        "Session over: {} casts, {} bites, {} catches, {} breaks, {} points",
        stats.casts,
        stats.bites,
        stats.catches,
        stats.breaks,
        stats.score
    );
    for hat in demo.progression.unlocked_hats(&demo.catalog) {
        log::info!("Hat unlocked: {}", hat.name);
    }
    match demo.progression.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize progression: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}
