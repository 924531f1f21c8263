//! Lurecast - real-time angling simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (hook physics, fish behavior, bait patterns, line tension)
//! - `tuning`: Data-driven game balance
//! - `catalog`: Species and hat definitions, validated at load time
//! - `progression`: Lifetime counters and trophy board fed by simulation events

pub mod catalog;
pub mod progression;
pub mod sim;
pub mod tuning;

pub use catalog::{Catalog, CatalogError, HatDef, SpeciesDef, StatRange};
pub use progression::Progression;
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Simulation constants that are not meant to be tuned
pub mod consts {
    /// Fixed simulation timestep used by the demo host (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Motion history ring capacity (hook and pointer)
    pub const HISTORY_CAPACITY: usize = 1024;
    /// Seconds of motion a history keeps, whatever the host frame rate
    pub const HISTORY_SPAN: f32 = 4.0;
    /// Samples closer together than this are coalesced (250 Hz)
    pub const HISTORY_MIN_INTERVAL: f64 = 1.0 / 250.0;

    /// Reference frame rate for per-frame multiplicative damping factors
    pub const DAMPING_REFERENCE_FPS: f32 = 60.0;

    /// Hook weight factor bounds
    pub const MIN_HOOK_WEIGHT: f32 = 0.5;
    pub const MAX_HOOK_WEIGHT: f32 = 3.0;

    /// Collision radius of the hook itself
    pub const HOOK_RADIUS: f32 = 6.0;
}

/// Distance guarded against zero so it can always be used as a divisor
#[inline]
pub fn dist_or_one(d: f32) -> f32 {
    if d > f32::EPSILON && d.is_finite() { d } else { 1.0 }
}

/// Unit vector from `from` toward `to`, or zero when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    delta / dist_or_one(delta.length())
}

/// Convert a per-frame multiplicative factor into one for an arbitrary `dt`
#[inline]
pub fn frame_damping(factor: f32, dt: f32) -> f32 {
    factor.powf(dt * consts::DAMPING_REFERENCE_FPS)
}
