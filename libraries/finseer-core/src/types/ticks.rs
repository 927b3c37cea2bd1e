//! Media server time unit
//!
//! Positions crossing the playback boundary are expressed in ticks,
//! 10,000,000 per second. Backends convert to native seconds themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Ticks per second used by the media server
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// A position or length in media server ticks
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticks(i64);

impl Ticks {
    /// Zero ticks (start of media)
    pub const ZERO: Self = Self(0);

    /// Wrap a raw tick count
    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Convert seconds to ticks, rounding to the nearest tick
    pub fn from_seconds(seconds: f64) -> Self {
        Self((seconds * TICKS_PER_SECOND as f64).round() as i64)
    }

    /// Raw tick count
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Seconds as used by native media elements
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / TICKS_PER_SECOND as f64
    }
}

impl From<Duration> for Ticks {
    fn from(duration: Duration) -> Self {
        Self::from_seconds(duration.as_secs_f64())
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
