//! Temporal value types
//!
//! The codec stores dates as epoch milliseconds and instants as an
//! (epoch seconds, nanoseconds) pair, so both types keep exactly that
//! integral form internally and round-trip losslessly through the byte
//! format. chrono sits at the seam for parsing, formatting, and calendar
//! accessors.
//!
//! ## Comparison Semantics
//!
//! Both types order by their position on the time line. `Instant` carries
//! sub-millisecond precision; `Date` is millisecond-granular.

use chrono::{DateTime as ChronoDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time with millisecond precision, stored as milliseconds
/// since the Unix epoch (negative before 1970).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Date(i64);

impl Date {
    /// Construct from milliseconds since the Unix epoch.
    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        Date(millis)
    }

    /// Milliseconds since the Unix epoch.
    #[inline]
    pub fn millis(self) -> i64 {
        self.0
    }

    /// Convert to a chrono UTC datetime.
    ///
    /// Returns `None` when the millisecond value falls outside chrono's
    /// representable range.
    pub fn to_datetime(self) -> Option<ChronoDateTime<Utc>> {
        ChronoDateTime::from_timestamp_millis(self.0)
    }

    /// Construct from a chrono datetime, truncating to millisecond
    /// precision.
    pub fn from_datetime<Tz: TimeZone>(dt: &ChronoDateTime<Tz>) -> Self {
        Date(dt.timestamp_millis())
    }

    /// Parse an RFC 3339 timestamp into a millisecond-granular date.
    pub fn parse(s: &str) -> Result<Self, String> {
        ChronoDateTime::parse_from_rfc3339(s)
            .map(|dt| Date(dt.timestamp_millis()))
            .map_err(|e| format!("invalid date '{}': {}", s, e))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "#date[{}ms]", self.0),
        }
    }
}

impl From<i64> for Date {
    fn from(millis: i64) -> Self {
        Date(millis)
    }
}

/// A point in time with nanosecond precision, stored as seconds since the
/// Unix epoch plus a nanosecond-of-second component in `0..1_000_000_000`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instant {
    secs: i64,
    nanos: u32,
}

impl Instant {
    /// Construct from epoch seconds and a nanosecond-of-second component.
    ///
    /// `nanos` values of one second or more carry into `secs`.
    pub fn new(secs: i64, nanos: u32) -> Self {
        let carry = (nanos / 1_000_000_000) as i64;
        Instant {
            secs: secs + carry,
            nanos: nanos % 1_000_000_000,
        }
    }

    /// Construct from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Instant {
            secs: millis.div_euclid(1000),
            nanos: (millis.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    /// Seconds since the Unix epoch.
    #[inline]
    pub fn secs(self) -> i64 {
        self.secs
    }

    /// Nanosecond-of-second component.
    #[inline]
    pub fn nanos(self) -> u32 {
        self.nanos
    }

    /// Milliseconds since the Unix epoch, when this instant is exactly
    /// millisecond-aligned and the result fits in an `i64`.
    ///
    /// The inline ID encoding carries instants as milliseconds, so anything
    /// finer must take the stored form.
    pub fn to_millis(self) -> Option<i64> {
        if self.nanos % 1_000_000 != 0 {
            return None;
        }
        self.secs
            .checked_mul(1000)?
            .checked_add((self.nanos / 1_000_000) as i64)
    }

    /// Convert to a chrono UTC datetime.
    ///
    /// Returns `None` when the value falls outside chrono's representable
    /// range.
    pub fn to_datetime(self) -> Option<ChronoDateTime<Utc>> {
        ChronoDateTime::from_timestamp(self.secs, self.nanos)
    }

    /// Construct from a chrono datetime (nanosecond precision).
    pub fn from_datetime<Tz: TimeZone>(dt: &ChronoDateTime<Tz>) -> Self {
        Instant {
            secs: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    /// Parse an RFC 3339 timestamp.
    pub fn parse(s: &str) -> Result<Self, String> {
        ChronoDateTime::parse_from_rfc3339(s)
            .map(|dt| Instant::from_datetime(&dt))
            .map_err(|e| format!("invalid instant '{}': {}", s, e))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "#instant[{}s {}ns]", self.secs, self.nanos),
        }
    }
}
