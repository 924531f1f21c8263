//! Environmental bite modifiers
//!
//! Time of day, season and the equipped hat scale every fish's base bite
//! affinity before the bait pattern is considered.

use serde::{Deserialize, Serialize};

use crate::catalog::HatDef;

/// Coarse time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    #[default]
    Day,
    Dusk,
    Night,
}

impl TimeOfDay {
    /// Bucket a local hour (0-23, wraps)
    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            5..=7 => TimeOfDay::Dawn,
            8..=16 => TimeOfDay::Day,
            17..=19 => TimeOfDay::Dusk,
            _ => TimeOfDay::Night,
        }
    }

    /// Fish feed hardest around dawn and dusk
    pub fn bite_factor(&self) -> f32 {
        match self {
            TimeOfDay::Dawn => 1.25,
            TimeOfDay::Day => 1.0,
            TimeOfDay::Dusk => 1.2,
            TimeOfDay::Night => 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Season {
    Spring,
    #[default]
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Bucket a month (1-12)
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn bite_factor(&self) -> f32 {
        match self {
            Season::Spring => 1.1,
            Season::Summer => 1.0,
            Season::Autumn => 1.15,
            Season::Winter => 0.8,
        }
    }
}

/// Multipliers applied to base bite affinity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiteModifiers {
    pub time_of_day: TimeOfDay,
    pub season: Season,
    /// Bonus from the equipped hat (1.0 = none)
    pub hat: f32,
}

impl Default for BiteModifiers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl BiteModifiers {
    /// Daytime summer, no hat: every factor is exactly 1
    pub const NEUTRAL: Self = Self {
        time_of_day: TimeOfDay::Day,
        season: Season::Summer,
        hat: 1.0,
    };

    pub fn new(time_of_day: TimeOfDay, season: Season) -> Self {
        Self {
            time_of_day,
            season,
            hat: 1.0,
        }
    }

    pub fn with_hat(mut self, hat: Option<&HatDef>) -> Self {
        self.hat = hat.and_then(|h| h.bite_multiplier).unwrap_or(1.0);
        self
    }

    /// Combined multiplier
    pub fn factor(&self) -> f32 {
        self.time_of_day.bite_factor() * self.season.bite_factor() * self.hat.max(0.0)
    }
}
