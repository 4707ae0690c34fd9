// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! A wall-clock instant with nanosecond precision.
//!
//! [`Timestamp`] is the time type used both for local write times (the client clock at which a
//! mutation was issued) and for the concrete values the server assigns to server-timestamp
//! transforms. It is stored as seconds since the UNIX epoch plus a non-negative nanosecond
//! offset, and is constrained to the years 1 through 9999.
use std::fmt;

#[cfg(feature = "chrono")]
use chrono::{DateTime, Utc};
#[cfg(feature = "chrono")]
use std::str::FromStr;

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Error returned when creating or parsing a `Timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The seconds lie outside `0001-01-01T00:00:00Z ..= 9999-12-31T23:59:59Z`.
    SecondsOutOfRange(i64),
    /// The nanoseconds are negative or not smaller than one second.
    NanosOutOfRange(i32),
    /// The string could not be parsed as a valid RFC 3339 datetime.
    Parse(String),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::SecondsOutOfRange(seconds) => write!(
                f,
                "timestamp seconds {seconds} out of range, supported years are between 1 and 9999 included"
            ),
            TimestampError::NanosOutOfRange(nanos) => {
                write!(f, "timestamp nanoseconds {nanos} out of range 0..1000000000")
            }
            TimestampError::Parse(s) => {
                write!(f, "failed to parse date {s} in rfc3339 format")
            }
        }
    }
}

impl std::error::Error for TimestampError {}

/// Represents a UTC instant with nanosecond precision.
///
/// The valid range for a `Timestamp` is from `0001-01-01T00:00:00Z` to
/// `9999-12-31T23:59:59.999999999Z`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TimestampWire"))]
pub struct Timestamp {
    seconds: i64,
    nanos: i32,
}

/// Unvalidated serialized form of a [`Timestamp`].
#[cfg(feature = "serde")]
#[derive(::serde::Deserialize)]
struct TimestampWire {
    seconds: i64,
    nanos: i32,
}

#[cfg(feature = "serde")]
impl TryFrom<TimestampWire> for Timestamp {
    type Error = TimestampError;

    fn try_from(wire: TimestampWire) -> Result<Self, Self::Error> {
        Timestamp::new(wire.seconds, wire.nanos)
    }
}

impl Timestamp {
    /// The minimum supported `Timestamp`: `0001-01-01T00:00:00Z`.
    pub const MIN: Timestamp = Timestamp {
        seconds: -62_135_596_800,
        nanos: 0,
    };
    /// The maximum supported `Timestamp`: `9999-12-31T23:59:59.999999999Z`.
    pub const MAX: Timestamp = Timestamp {
        seconds: 253_402_300_799,
        nanos: NANOS_PER_SECOND - 1,
    };
    /// The UNIX epoch.
    pub const EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Creates a new `Timestamp` from seconds since the UNIX epoch and a nanosecond offset.
    ///
    /// # Errors
    ///
    /// Returns an error if `nanos` is not in `0..1_000_000_000` or if the instant lies outside
    /// the supported range.
    pub fn new(seconds: i64, nanos: i32) -> Result<Timestamp, TimestampError> {
        if !(0..NANOS_PER_SECOND).contains(&nanos) {
            return Err(TimestampError::NanosOutOfRange(nanos));
        }
        if !(Self::MIN.seconds..=Self::MAX.seconds).contains(&seconds) {
            return Err(TimestampError::SecondsOutOfRange(seconds));
        }
        Ok(Timestamp { seconds, nanos })
    }

    /// Creates a new `Timestamp` from a `chrono::DateTime<Utc>`.
    ///
    /// Leap seconds are folded into the last representable nanosecond of the preceding second.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is outside the supported range of `1` to `9999`.
    #[cfg(feature = "chrono")]
    pub fn from_datetime(datetime: DateTime<Utc>) -> Result<Timestamp, TimestampError> {
        let nanos = datetime.timestamp_subsec_nanos().min(999_999_999);
        // NOTE: cannot truncate, `nanos` was clamped below one second above.
        Timestamp::new(datetime.timestamp(), nanos as i32)
    }

    /// Creates a `Timestamp` from a number of milliseconds since the UNIX epoch.
    ///
    /// Returns `None` if the number of milliseconds corresponds to an instant outside
    /// the supported range.
    pub fn from_millis(milliseconds: i64) -> Option<Self> {
        let candidate = Self::__from_millis_unchecked(milliseconds);
        (Self::MIN..=Self::MAX)
            .contains(&candidate)
            .then_some(candidate)
    }

    #[doc(hidden)]
    pub const fn __from_millis_unchecked(milliseconds: i64) -> Self {
        Self {
            seconds: milliseconds.div_euclid(1000),
            nanos: (milliseconds.rem_euclid(1000) * 1_000_000) as i32,
        }
    }

    /// Returns the current time according to the local clock.
    #[cfg(feature = "chrono")]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now()).expect("the system clock reports a year between 1 and 9999")
    }

    /// Returns the current time according to the local clock.
    #[cfg(not(feature = "chrono"))]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => Self {
                seconds: since.as_secs() as i64,
                nanos: since.subsec_nanos() as i32,
            },
            Err(before) => {
                let before = before.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut nanos = -(before.subsec_nanos() as i32);
                if nanos < 0 {
                    seconds -= 1;
                    nanos += NANOS_PER_SECOND;
                }
                Self { seconds, nanos }
            }
        }
    }

    /// Seconds since the UNIX epoch.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Non-negative fraction of a second, in nanoseconds.
    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    /// Returns the number of milliseconds since the UNIX epoch, truncating sub-millisecond
    /// precision.
    pub fn as_millis(&self) -> i64 {
        self.seconds * 1000 + i64::from(self.nanos / 1_000_000)
    }

    /// Converts the `Timestamp` to a `chrono::DateTime<Utc>`.
    #[cfg(feature = "chrono")]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
            .expect("supported range is a subset of chrono's range")
    }
}

#[cfg(feature = "chrono")]
impl fmt::Display for Timestamp {
    // Formats the `Timestamp` as an RFC 3339 string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            &self
                .as_datetime()
                .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
        )
    }
}

#[cfg(not(feature = "chrono"))]
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp(seconds={}, nanos={})", self.seconds, self.nanos)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(feature = "chrono")]
impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let datetime =
            DateTime::parse_from_rfc3339(s).map_err(|_| TimestampError::Parse(s.to_string()))?;
        Timestamp::from_datetime(datetime.to_utc())
    }
}

#[cfg(feature = "chrono")]
impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = TimestampError;

    fn try_from(datetime: DateTime<Utc>) -> Result<Self, Self::Error> {
        Timestamp::from_datetime(datetime)
    }
}

/// The version of a document, as assigned by the server.
///
/// Versions are ordered; a document that has never been seen by the server carries
/// [`SnapshotVersion::NONE`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct SnapshotVersion(Timestamp);

impl SnapshotVersion {
    /// The version of documents that only exist locally.
    pub const NONE: SnapshotVersion = SnapshotVersion(Timestamp::EPOCH);

    pub fn new(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.0
    }
}

impl From<Timestamp> for SnapshotVersion {
    fn from(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotVersion({self})")
    }
}
