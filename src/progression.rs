//! Cumulative angling progression
//!
//! Accumulates terminal simulation events into lifetime counters, per-species
//! tallies and a top-10 trophy board. Storage is left to the host: the whole
//! record round-trips through JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, HatDef};
use crate::sim::SimEvent;

/// Maximum number of trophies to keep
pub const MAX_TROPHIES: usize = 10;

/// A single trophy board entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrophyEntry {
    pub species: String,
    pub weight_kg: f32,
    pub size: f32,
    pub points: u32,
    /// Host timestamp (ms) when landed
    pub timestamp: f64,
}

/// Heaviest catches, sorted descending by weight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrophyBoard {
    pub entries: Vec<TrophyEntry>,
}

impl TrophyBoard {
    /// Check if a catch of this weight earns a place on the board
    pub fn qualifies(&self, weight_kg: f32) -> bool {
        if weight_kg <= 0.0 {
            return false;
        }
        if self.entries.len() < MAX_TROPHIES {
            return true;
        }
        self.entries.last().is_none_or(|e| weight_kg > e.weight_kg)
    }

    /// Get the rank a weight would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, weight_kg: f32) -> Option<usize> {
        if !self.qualifies(weight_kg) {
            return None;
        }
        let rank = self.entries.iter().position(|e| weight_kg > e.weight_kg);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a trophy if it qualifies; returns the rank achieved (1-indexed)
    pub fn add(&mut self, entry: TrophyEntry) -> Option<usize> {
        let rank = self.potential_rank(entry.weight_kg)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_TROPHIES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn heaviest(&self) -> Option<&TrophyEntry> {
        self.entries.first()
    }
}

/// Tallies for one species
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub caught: u32,
    /// Lost to a snapped line
    pub lost: u32,
    pub heaviest_kg: f32,
    pub total_weight_kg: f32,
}

/// Lifetime counters across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub casts: u64,
    pub bites: u64,
    pub hook_sets: u64,
    pub catches: u64,
    pub breaks: u64,
    pub misses: u64,
    pub score: u64,
    pub total_weight_kg: f64,
}

/// Everything the progression store persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    #[serde(default)]
    pub lifetime: LifetimeStats,
    #[serde(default)]
    pub species: BTreeMap<String, SpeciesRecord>,
    #[serde(default)]
    pub trophies: TrophyBoard,
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one simulation event in; returns the trophy rank for a qualifying catch
    pub fn record(&mut self, event: &SimEvent, timestamp: f64) -> Option<usize> {
        let stats = &mut self.lifetime;
        match event {
            SimEvent::CastStarted { .. } => stats.casts += 1,
            SimEvent::BitePending { .. } => stats.bites += 1,
            SimEvent::BiteMissed { .. } => stats.misses += 1,
            SimEvent::HookSet { via, .. } => {
                // Pattern strikes skip the pending stage
                if *via == crate::sim::AttachSource::PatternStrike {
                    stats.bites += 1;
                }
                stats.hook_sets += 1;
            }
            SimEvent::Caught {
                species,
                size,
                weight_kg,
                points,
                ..
            } => {
                stats.catches += 1;
                stats.score += *points as u64;
                stats.total_weight_kg += *weight_kg as f64;

                let record = self.species.entry(species.clone()).or_default();
                record.caught += 1;
                record.total_weight_kg += weight_kg;
                record.heaviest_kg = record.heaviest_kg.max(*weight_kg);

                let rank = self.trophies.add(TrophyEntry {
                    species: species.clone(),
                    weight_kg: *weight_kg,
                    size: *size,
                    points: *points,
                    timestamp,
                });
                if let Some(rank) = rank {
                    log::info!("New trophy: {} {:.2} kg (rank {})", species, weight_kg, rank);
                }
                return rank;
            }
            SimEvent::LineBroken { species, .. } => {
                stats.breaks += 1;
                self.species.entry(species.clone()).or_default().lost += 1;
            }
            SimEvent::HookSplashed { .. }
            | SimEvent::BiteRefused { .. }
            | SimEvent::PatternMatched { .. }
            | SimEvent::Retrieved
            | SimEvent::CastAborted { .. } => {}
        }
        None
    }

    /// Hats whose catch requirement has been met
    pub fn unlocked_hats<'a>(&self, catalog: &'a Catalog) -> impl Iterator<Item = &'a HatDef> {
        catalog.unlocked_hats(self.lifetime.catches)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::AttachSource;

    fn caught(species: &str, weight_kg: f32) -> SimEvent {
        SimEvent::Caught {
            fish_id: 1,
            species: species.into(),
            size: 30.0,
            weight_kg,
            points: 10,
        }
    }

    fn trophy(weight_kg: f32) -> TrophyEntry {
        TrophyEntry {
            species: "perch".into(),
            weight_kg,
            size: 20.0,
            points: 5,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_board_keeps_heaviest_ten() {
        let mut board = TrophyBoard::default();
        for i in 1..=12 {
            board.add(trophy(i as f32));
        }
        assert_eq!(board.entries.len(), MAX_TROPHIES);
        assert_eq!(board.heaviest().map(|e| e.weight_kg), Some(12.0));
        assert_eq!(board.entries.last().map(|e| e.weight_kg), Some(3.0));
        assert!(!board.qualifies(2.0));
        assert_eq!(board.potential_rank(7.5), Some(6));
    }

    #[test]
    fn test_zero_weight_never_qualifies() {
        let board = TrophyBoard::default();
        assert!(!board.qualifies(0.0));
        assert!(board.qualifies(0.1));
    }

    #[test]
    fn test_records_catch() {
        let mut prog = Progression::new();
        assert_eq!(prog.record(&caught("pike", 4.0), 100.0), Some(1));
        assert_eq!(prog.record(&caught("pike", 6.0), 200.0), Some(1));
        assert_eq!(prog.record(&caught("perch", 1.0), 300.0), Some(3));

        assert_eq!(prog.lifetime.catches, 3);
        assert_eq!(prog.lifetime.score, 30);
        assert!((prog.lifetime.total_weight_kg - 11.0).abs() < 1e-6);
        let pike = &prog.species["pike"];
        assert_eq!(pike.caught, 2);
        assert_eq!(pike.heaviest_kg, 6.0);
    }

    #[test]
    fn test_counts_bites_and_breaks() {
        let mut prog = Progression::new();
        prog.record(&SimEvent::CastStarted { power: 0.5 }, 0.0);
        prog.record(
            &SimEvent::BitePending {
                fish_id: 1,
                expires_at: 1.0,
            },
            0.0,
        );
        prog.record(
            &SimEvent::HookSet {
                fish_id: 1,
                via: AttachSource::Collision,
            },
            0.0,
        );
        prog.record(
            &SimEvent::HookSet {
                fish_id: 2,
                via: AttachSource::PatternStrike,
            },
            0.0,
        );
        prog.record(
            &SimEvent::LineBroken {
                fish_id: 2,
                species: "bass".into(),
            },
            0.0,
        );

        assert_eq!(prog.lifetime.casts, 1);
        assert_eq!(prog.lifetime.bites, 2);
        assert_eq!(prog.lifetime.hook_sets, 2);
        assert_eq!(prog.lifetime.breaks, 1);
        assert_eq!(prog.species["bass"].lost, 1);
    }

    #[test]
    fn test_json_roundtrip_and_partial_load() {
        let mut prog = Progression::new();
        prog.record(&caught("carp", 3.0), 1.0);
        let json = prog.to_json().unwrap();
        assert_eq!(Progression::from_json(&json).unwrap(), prog);

        let partial = Progression::from_json(r#"{"lifetime":{"casts":4,"bites":0,"hook_sets":0,"catches":0,"breaks":0,"misses":0,"score":0,"total_weight_kg":0.0}}"#).unwrap();
        assert_eq!(partial.lifetime.casts, 4);
        assert!(partial.trophies.is_empty());
        assert!(Progression::from_json("nope").is_err());
    }
}
