//! Species and hat catalogs
//!
//! Loaded once from JSON and validated up front so the simulation never has
//! to second-guess a stat range. A spawner picks a species and calls
//! [`SpeciesDef::resolve`] to roll concrete [`FishStats`].

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{BaitPattern, FishStats};

/// Strike window used when a species does not declare its own
pub const DEFAULT_FLASH_DURATION: f32 = 0.6;

/// Errors raised while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog defines no species")]
    NoSpecies,
    #[error("{kind} entry with an empty id")]
    EmptyId { kind: &'static str },
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("species `{species}`: {field} range [{min}, {max}] is invalid")]
    InvalidRange {
        species: String,
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("`{id}`: {field} must be within [0, 1], got {value}")]
    NotUnit {
        id: String,
        field: &'static str,
        value: f32,
    },
    #[error("`{id}`: {field} must be positive, got {value}")]
    NotPositive {
        id: String,
        field: &'static str,
        value: f32,
    },
}

/// Inclusive numeric range rolled per spawned fish
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    pub min: f32,
    pub max: f32,
}

impl StatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Value at fraction `t` of the range
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t.clamp(0.0, 1.0)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        self.lerp(rng.random::<f32>())
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// One fish species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub id: String,
    pub name: String,
    pub size: StatRange,
    pub speed: StatRange,
    pub stamina: StatRange,
    pub weight_kg: StatRange,
    pub points: u32,
    pub bite_affinity: f32,
    pub aggression: f32,
    #[serde(default)]
    pub preferred_pattern: Option<BaitPattern>,
    /// Preferred band as fractions of the water column
    #[serde(default)]
    pub depth: Option<StatRange>,
    #[serde(default)]
    pub flash_duration: Option<f32>,
}

impl SpeciesDef {
    /// Roll concrete stats. Size and weight share one roll so big fish are heavy.
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> FishStats {
        let growth = rng.random::<f32>();
        let depth = self.depth.unwrap_or(StatRange::new(0.0, 1.0));
        FishStats {
            species: self.id.clone(),
            size: self.size.lerp(growth),
            weight_kg: self.weight_kg.lerp(growth),
            speed: self.speed.sample(rng),
            stamina: self.stamina.sample(rng),
            points: self.points,
            bite_affinity: self.bite_affinity,
            aggression: self.aggression,
            preferred_pattern: self.preferred_pattern.unwrap_or_default(),
            depth_min: depth.min,
            depth_max: depth.max,
            flash_duration: self.flash_duration.unwrap_or(DEFAULT_FLASH_DURATION),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.is_empty() {
            return Err(CatalogError::EmptyId { kind: "species" });
        }
        let ranges = [
            ("size", Some(self.size)),
            ("speed", Some(self.speed)),
            ("stamina", Some(self.stamina)),
            ("weight_kg", Some(self.weight_kg)),
            ("depth", self.depth),
        ];
        for (field, range) in ranges {
            if let Some(range) = range {
                let depth_ok = field != "depth" || range.max <= 1.0;
                if !range.is_valid() || !depth_ok {
                    return Err(CatalogError::InvalidRange {
                        species: self.id.clone(),
                        field,
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }
        if self.size.min <= 0.0 {
            return Err(CatalogError::NotPositive {
                id: self.id.clone(),
                field: "size",
                value: self.size.min,
            });
        }
        unit(&self.id, "bite_affinity", self.bite_affinity)?;
        unit(&self.id, "aggression", self.aggression)?;
        if let Some(flash) = self.flash_duration {
            if !(flash > 0.0 && flash.is_finite()) {
                return Err(CatalogError::NotPositive {
                    id: self.id.clone(),
                    field: "flash_duration",
                    value: flash,
                });
            }
        }
        Ok(())
    }
}

/// A cosmetic hat; some carry a bite bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bite_multiplier: Option<f32>,
    /// Lifetime catches needed to unlock
    #[serde(default)]
    pub unlock_catches: Option<u32>,
}

impl HatDef {
    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.is_empty() {
            return Err(CatalogError::EmptyId { kind: "hat" });
        }
        if let Some(m) = self.bite_multiplier {
            if !(m > 0.0 && m.is_finite()) {
                return Err(CatalogError::NotPositive {
                    id: self.id.clone(),
                    field: "bite_multiplier",
                    value: m,
                });
            }
        }
        Ok(())
    }
}

/// Validated species and hat tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub species: Vec<SpeciesDef>,
    #[serde(default)]
    pub hats: Vec<HatDef>,
}

impl Catalog {
    /// Parse and validate a catalog document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        log::info!(
            "Loaded catalog: {} species, {} hats",
            catalog.species.len(),
            catalog.hats.len()
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.species.is_empty() {
            return Err(CatalogError::NoSpecies);
        }
        let mut seen = HashSet::new();
        for species in &self.species {
            species.validate()?;
            if !seen.insert(species.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "species",
                    id: species.id.clone(),
                });
            }
        }
        let mut seen = HashSet::new();
        for hat in &self.hats {
            hat.validate()?;
            if !seen.insert(hat.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "hat",
                    id: hat.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn species(&self, id: &str) -> Option<&SpeciesDef> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn hat(&self, id: &str) -> Option<&HatDef> {
        self.hats.iter().find(|h| h.id == id)
    }

    /// Hats unlocked after `catches` lifetime catches
    pub fn unlocked_hats(&self, catches: u64) -> impl Iterator<Item = &HatDef> {
        self.hats
            .iter()
            .filter(move |h| h.unlock_catches.is_none_or(|n| catches >= n as u64))
    }
}

fn unit(id: &str, field: &'static str, value: f32) -> Result<(), CatalogError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::NotUnit {
            id: id.to_string(),
            field,
            value,
        })
    }
}
