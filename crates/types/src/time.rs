use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Chain block height.
pub type BlockNum = u32;

pub const MICROS_PER_SECOND: u64 = 1_000_000;
pub const MICROS_PER_DAY: u64 = 24 * 3600 * MICROS_PER_SECOND;
/// Block slots are half a second long.
pub const MICROS_PER_SLOT: u64 = 500_000;

/// Microseconds since the Unix epoch. `TimePoint::ZERO` means "never".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(pub u64);

impl TimePoint {
    pub const ZERO: TimePoint = TimePoint(0);

    pub const fn from_micros(micros: u64) -> Self {
        TimePoint(micros)
    }

    pub const fn from_secs(secs: u64) -> Self {
        TimePoint(secs * MICROS_PER_SECOND)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Microseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn micros_since(self, earlier: TimePoint) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<u64> for TimePoint {
    type Output = TimePoint;

    fn add(self, micros: u64) -> TimePoint {
        TimePoint(self.0.saturating_add(micros))
    }
}

impl Sub<u64> for TimePoint {
    type Output = TimePoint;

    fn sub(self, micros: u64) -> TimePoint {
        TimePoint(self.0.saturating_sub(micros))
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}s",
            self.0 / MICROS_PER_SECOND,
            self.0 % MICROS_PER_SECOND
        )
    }
}
