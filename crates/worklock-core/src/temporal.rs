//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds
//! precision. Audit records in the settlement core are serialized and
//! compared across processes; a single canonical rendering
//! (`YYYY-MM-DDTHH:MM:SSZ`) keeps those comparisons byte-stable.
//!
//! Non-UTC inputs are rejected at construction rather than silently
//! converted.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC timestamp with seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_epoch_secs()`] — from a Unix timestamp (the form
///   external callers supply job deadlines in).
/// - [`Timestamp::parse()`] — from an RFC 3339 string, rejecting non-UTC
///   offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if `secs` is outside the representable range.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| CoreError::InvalidTimestamp {
            input: secs.to_string(),
            reason: "out of range for a Unix timestamp".to_string(),
        })?;
        Ok(Self(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// Only the `Z` suffix is accepted. Explicit offsets are rejected, even
    /// `+00:00`, so every stored timestamp has exactly one rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid RFC 3339 or carries a
    /// non-Z offset.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp {
                input: s.to_string(),
                reason: "timestamp must use the Z suffix (UTC only)".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| CoreError::InvalidTimestamp {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_to_iso8601_format() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let ts = Timestamp(dt);
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
        assert_eq!(format!("{ts}"), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_offsets_rejected() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("2026-01-15T08:00:00-04:00").is_err());
    }

    #[test]
    fn test_parse_subseconds_truncated() {
        let ts = Timestamp::parse("2026-01-15T12:00:00.123456Z").unwrap();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2026-01-15").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn test_epoch_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let ts2 = Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap();
        assert_eq!(ts, ts2);
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let later = Timestamp::parse("2026-01-15T12:00:01Z").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
