//! Event date-time as exchanged with the backend.

use core::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format produced by a `datetime-local` form field and sent on upload.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Accepted input layouts, most specific first.
const INPUT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Error returned when a date-time string matches no accepted layout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised event date-time: {0}")]
pub struct EventDateTimeError(String);

/// Local wall-clock date and time of an event.
///
/// Venues advertise local times, so no time zone is attached. RFC 3339
/// values from the backend are converted to UTC wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventDateTime(NaiveDateTime);

impl EventDateTime {
    /// Parse from `YYYY-MM-DDTHH:MM[:SS[.fff]]`, `YYYY-MM-DD HH:MM` or RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns [`EventDateTimeError`] if no layout matches.
    pub fn parse(s: &str) -> Result<Self, EventDateTimeError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_utc()));
        }
        INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(Self)
            .ok_or_else(|| EventDateTimeError(s.to_owned()))
    }

    /// Human-facing form, e.g. `2025-06-01 19:30`.
    #[must_use]
    pub fn display(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M").to_string()
    }

    /// The `YYYY-MM-DDTHH:MM` form sent to the backend.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.0.format(WIRE_FORMAT).to_string()
    }
}

impl From<NaiveDateTime> for EventDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self(dt)
    }
}

impl fmt::Display for EventDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl std::str::FromStr for EventDateTime {
    type Err = EventDateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EventDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for EventDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
