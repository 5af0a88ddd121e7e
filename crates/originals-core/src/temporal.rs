//! # Temporal Types: UTC-Only Timestamps
//!
//! `Timestamp` is the only time representation that enters canonical
//! bytes (`versionTime`, proof `created`, provenance records).
//!
//! ## Security Invariant
//!
//! Timestamps serialize as `YYYY-MM-DDTHH:MM:SSZ`: UTC, `Z` suffix, no
//! sub-seconds. Deserialization is equally strict, so a log line carrying
//! `+00:00` or fractional seconds is rejected instead of being silently
//! re-rendered into different canonical bytes than were signed.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TimestampError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a strict `Z`-suffixed RFC 3339 timestamp.
    ///
    /// Offsets such as `+00:00` are rejected even though they denote UTC.
    /// Sub-second precision is rejected as well.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if !s.ends_with('Z') {
            return Err(TimestampError::NotUtc(s.to_string()));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| TimestampError::Invalid {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let utc = dt.with_timezone(&Utc);
        if utc.nanosecond() != 0 {
            return Err(TimestampError::Invalid {
                input: s.to_string(),
                reason: "sub-second precision is not permitted".to_string(),
            });
        }
        let ts = Self(utc);
        if ts.to_iso8601() != s {
            return Err(TimestampError::Invalid {
                input: s.to_string(),
                reason: "not in canonical YYYY-MM-DDTHH:MM:SSZ form".to_string(),
            });
        }
        Ok(ts)
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TimestampError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(TimestampError::OutOfRange(secs))
    }

    /// The inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// ISO 8601 with `Z` suffix, e.g. `2026-01-15T12:00:00Z`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
