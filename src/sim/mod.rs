//! Deterministic simulation module
//!
//! All angling logic lives here. This module must stay deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - Deadlines compared against the simulation clock, never wall time
//! - No rendering or platform dependencies

pub mod classifier;
pub mod fish;
pub mod history;
pub mod hook;
pub mod line;
pub mod modifiers;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod timer;

pub use classifier::{
    BaitPattern, Classification, PatternMetrics, PatternTarget, Presentation, classify,
    is_eligible,
};
pub use fish::{BiteChance, Fish, FishStats, Mood, bite_chance};
pub use history::{MotionHistory, MotionSample};
pub use hook::{ForceRegime, Hook, ReelInput};
pub use line::{LineState, target_tension};
pub use modifiers::{BiteModifiers, Season, TimeOfDay};
pub use snapshot::{FishStatus, FishView, Snapshot};
pub use state::{
    AttachSource, AttachedLink, CastPhase, PendingBite, SessionCounters, SimEvent,
    SimulationContext,
};
pub use tick::{Simulation, TickInput, tick};
pub use timer::{TemporalFlag, Timestamp, is_active};
