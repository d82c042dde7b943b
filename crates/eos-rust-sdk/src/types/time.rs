//! Second-resolution UTC timestamps in the chain's text format.

use crate::error::{EosError, EosResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Seconds since the Unix epoch, rendered as `2017-09-13T18:24:33`.
///
/// Parsing also accepts fractional seconds and a trailing `Z`, both of
/// which appear in block timestamps; fractions are truncated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePointSec(u32);

impl TimePointSec {
    /// Creates a timestamp from seconds since the epoch.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Converts a `chrono` time, which must fall in the `u32` second range.
    pub fn from_datetime(time: DateTime<Utc>) -> EosResult<Self> {
        u32::try_from(time.timestamp())
            .map(Self)
            .map_err(|_| EosError::serialization(format!("time {time} out of range")))
    }

    /// Seconds since the epoch.
    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// Returns this time shifted forward, saturating at the end of the range.
    pub fn plus_seconds(&self, seconds: u32) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// The `chrono` form of this time.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.0), 0).unwrap_or_default()
    }
}

impl FromStr for TimePointSec {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('Z');
        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| EosError::serialization(format!("invalid time '{s}': {e}")))?;
        Self::from_datetime(naive.and_utc())
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format(FORMAT))
    }
}

impl Serialize for TimePointSec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
