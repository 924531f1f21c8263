//! Simulation state and core session types
//!
//! Everything a session mutates lives in one `SimulationContext`, so a reset
//! is a single assignment.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::classifier::BaitPattern;
use super::fish::Fish;
use super::history::MotionHistory;
use super::hook::{Hook, ReelInput};
use super::line::LineState;
use super::modifiers::BiteModifiers;
use super::timer::{TemporalFlag, Timestamp};
use crate::tuning::Tuning;

/// Where the cast is in its life cycle
///
/// Reeling is a flag on `CastState`, and a hooked fish is the
/// `attached` slot; both run alongside `Flying`/`Submerged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CastPhase {
    /// Hook resting at the rod tip
    #[default]
    Idle,
    /// Cast input held, power building
    Charging,
    /// Hook in the air after release
    Flying,
    /// Hook has entered the water
    Submerged,
}

impl CastPhase {
    /// Hook is out on the line and simulated
    pub fn is_out(&self) -> bool {
        matches!(self, CastPhase::Flying | CastPhase::Submerged)
    }
}

/// How a fish ended up on the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachSource {
    /// Player set the hook during a pending bite
    Collision,
    /// Preferred pattern made the strike certain
    PatternStrike,
}

/// The hook-to-fish binding (at most one)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachedLink {
    pub fish_id: u32,
    /// Fish position relative to the hook
    pub offset: Vec2,
    pub via: AttachSource,
}

/// A fish that struck and waits for the hook set (at most one)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingBite {
    pub fish_id: u32,
    pub window: TemporalFlag,
}

impl PendingBite {
    pub fn expires_at(&self) -> Timestamp {
        self.window.expires_at
    }
}

/// Cast input and reel bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CastState {
    pub phase: CastPhase,
    /// Charge power in [0, 1]
    pub power: f32,
    /// Reel held while the hook is out
    pub reeling: bool,
    /// Smoothed reel intensity in [0, 1]
    pub reel_intensity: f32,
    /// Reel input on the previous tick (hook sets need a fresh press)
    pub reel_was_held: bool,
    /// When the current cast was released
    pub released_at: Timestamp,
}

impl CastState {
    pub fn reel(&self) -> ReelInput {
        ReelInput {
            held: self.reeling,
            intensity: self.reel_intensity,
        }
    }

    pub fn since_release(&self, now: Timestamp) -> f32 {
        (now - self.released_at).max(0.0) as f32
    }
}

/// Discrete outcomes reported to the host each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    CastStarted {
        power: f32,
    },
    HookSplashed {
        pos: Vec2,
    },
    BitePending {
        fish_id: u32,
        expires_at: Timestamp,
    },
    /// Pending bite expired before the hook was set
    BiteMissed {
        fish_id: u32,
    },
    /// Fish touched the hook but declined
    BiteRefused {
        fish_id: u32,
    },
    HookSet {
        fish_id: u32,
        via: AttachSource,
    },
    PatternMatched {
        fish_id: u32,
        pattern: BaitPattern,
    },
    Caught {
        fish_id: u32,
        species: String,
        size: f32,
        weight_kg: f32,
        points: u32,
    },
    LineBroken {
        fish_id: u32,
        species: String,
    },
    /// Empty hook reeled back to the rod
    Retrieved,
    /// Host disruption reset the cast; a hooked fish got away unscored
    CastAborted {
        fish_id: Option<u32>,
    },
}

/// Per-session tallies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub casts: u32,
    /// Strikes: pending bites plus pattern strikes
    pub bites: u32,
    pub hook_sets: u32,
    pub catches: u32,
    pub breaks: u32,
    pub misses: u32,
    pub refusals: u32,
    pub score: u64,
    pub total_weight_kg: f32,
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub seed: u64,
    /// Simulation clock
    pub now: Timestamp,
    pub tuning: Tuning,
    pub rng: Pcg32,
    pub hook: Hook,
    /// Latest pointer position, if the pointer is over the scene
    pub pointer: Option<Vec2>,
    /// Pointer trail; only lure motion guided from near a fish is credited
    pub pointer_history: MotionHistory,
    pub line: LineState,
    /// Live fish, in spawn (id) order
    pub fish: Vec<Fish>,
    pub attached: Option<AttachedLink>,
    pub pending: Option<PendingBite>,
    pub cast: CastState,
    pub modifiers: BiteModifiers,
    pub counters: SessionCounters,
    /// Events emitted during the last tick
    pub events: Vec<SimEvent>,
    pub paused: bool,
    next_id: u32,
}

impl SimulationContext {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let origin = tuning.world.rod_origin;
        let weight = tuning.hook.default_weight;
        Self {
            seed,
            now: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            hook: Hook::new(origin, weight),
            pointer: None,
            pointer_history: MotionHistory::default(),
            line: LineState::new(origin),
            fish: Vec::new(),
            attached: None,
            pending: None,
            cast: CastState::default(),
            modifiers: BiteModifiers::NEUTRAL,
            counters: SessionCounters::default(),
            events: Vec::new(),
            paused: false,
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn origin(&self) -> Vec2 {
        self.tuning.world.rod_origin
    }

    pub fn fish_by_id(&self, id: u32) -> Option<&Fish> {
        self.fish.iter().find(|f| f.id == id)
    }

    pub fn fish_by_id_mut(&mut self, id: u32) -> Option<&mut Fish> {
        self.fish.iter_mut().find(|f| f.id == id)
    }

    /// The fish on the line, if any
    pub fn attached_fish(&self) -> Option<&Fish> {
        self.attached.and_then(|link| self.fish_by_id(link.fish_id))
    }

    pub fn hook_in_water(&self) -> bool {
        self.cast.phase.is_out() && self.hook.is_underwater(&self.tuning.world)
    }

    /// No bite pending and nothing on the line
    pub fn hook_free(&self) -> bool {
        self.attached.is_none() && self.pending.is_none()
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }
}
