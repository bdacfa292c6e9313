//! Race time representation.
//!
//! Times are held as whole centiseconds and ordered numerically.
//! The `M:SS.CC` text form is only produced for display and for the
//! persisted profile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Milliseconds per centisecond.
const MS_PER_CENTI: u64 = 10;

/// Centiseconds per minute.
const CENTIS_PER_MINUTE: u64 = 6000;

/// A race or lap duration with centisecond resolution.
///
/// Construction from milliseconds floors to the centisecond, the same
/// truncation the display format applies, so a formatted time parses
/// back to an equal value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RaceTime(u64);

impl RaceTime {
    /// Zero duration.
    pub const ZERO: RaceTime = RaceTime(0);

    /// Create from whole centiseconds.
    pub const fn from_centis(centis: u64) -> Self {
        Self(centis)
    }

    /// Create from milliseconds, truncating sub-centisecond precision.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms / MS_PER_CENTI)
    }

    /// Whole centiseconds.
    pub const fn as_centis(self) -> u64 {
        self.0
    }

    /// Milliseconds (always a multiple of 10).
    pub const fn as_millis(self) -> u64 {
        self.0 * MS_PER_CENTI
    }
}

impl fmt::Display for RaceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / CENTIS_PER_MINUTE;
        let seconds = (self.0 % CENTIS_PER_MINUTE) / 100;
        let centis = self.0 % 100;
        write!(f, "{}:{:02}.{:02}", minutes, seconds, centis)
    }
}

/// Error parsing an `M:SS.CC` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid race time {0:?}, expected M:SS.CC")]
pub struct ParseRaceTimeError(String);

impl FromStr for RaceTime {
    type Err = ParseRaceTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRaceTimeError(s.to_string());

        let (minutes, rest) = s.split_once(':').ok_or_else(err)?;
        let (seconds, centis) = rest.split_once('.').ok_or_else(err)?;

        if minutes.is_empty() || seconds.len() != 2 || centis.len() != 2 {
            return Err(err());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(minutes) || !all_digits(seconds) || !all_digits(centis) {
            return Err(err());
        }

        let minutes: u64 = minutes.parse().map_err(|_| err())?;
        let seconds: u64 = seconds.parse().map_err(|_| err())?;
        let centis: u64 = centis.parse().map_err(|_| err())?;
        if seconds >= 60 {
            return Err(err());
        }

        minutes
            .checked_mul(CENTIS_PER_MINUTE)
            .and_then(|m| m.checked_add(seconds * 100 + centis))
            .map(RaceTime)
            .ok_or_else(err)
    }
}

impl Serialize for RaceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RaceTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Format milliseconds as `M:SS.CC` (floor-truncated, never rounded).
pub fn format_time(ms: u64) -> String {
    RaceTime::from_millis(ms).to_string()
}

/// Format a play-time counter in seconds as `Hh Mm`.
pub fn format_play_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}
