//! Deadline flags polled once per tick
//!
//! Every transient window (refusal cooldown, rush, pattern boost, mood,
//! pull bursts, escape timeout) is an absolute deadline compared against the
//! simulation clock. Delayed frames simply find the window already expired.

use serde::{Deserialize, Serialize};

/// Simulation clock time in seconds since the session started
pub type Timestamp = f64;

/// A window that is live until `expires_at`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalFlag {
    pub active: bool,
    pub expires_at: Timestamp,
}

impl TemporalFlag {
    /// A flag that is not running
    pub const INACTIVE: Self = Self {
        active: false,
        expires_at: 0.0,
    };

    /// A flag live for `duration` seconds from `now`
    pub fn started(now: Timestamp, duration: f32) -> Self {
        Self {
            active: true,
            expires_at: now + duration as f64,
        }
    }

    /// (Re)start the window
    pub fn arm(&mut self, now: Timestamp, duration: f32) {
        *self = Self::started(now, duration);
    }

    /// Push the deadline out without shortening an already longer window
    pub fn extend(&mut self, now: Timestamp, duration: f32) {
        let until = now + duration as f64;
        if !self.is_active(now) || until > self.expires_at {
            self.arm(now, duration);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::INACTIVE;
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        is_active(self, now)
    }

    /// Seconds left, zero when expired
    pub fn remaining(&self, now: Timestamp) -> f32 {
        if self.is_active(now) {
            (self.expires_at - now) as f32
        } else {
            0.0
        }
    }
}

/// The single deadline check shared by every timer in the simulation
#[inline]
pub fn is_active(flag: &TemporalFlag, now: Timestamp) -> bool {
    flag.active && now < flag.expires_at
}
