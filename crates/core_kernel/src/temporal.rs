//! Business dates and clocks
//!
//! Invoices and payments are dated with calendar days (`NaiveDate`). What
//! "today" and "the current year" mean depends on the timezone the business
//! operates in, so services obtain them through a `Clock` instead of calling
//! `Utc::now()` directly.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for the business location
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parses an IANA timezone name such as "Europe/Belgrade"
    pub fn parse(name: &str) -> Result<Self, TemporalError> {
        Tz::from_str(name)
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(name.to_string()))
    }

    /// Returns the local calendar date of a UTC instant
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Date out of range: {date} + {days} days")]
    DateOutOfRange {
        date: NaiveDate,
        days: u32,
    },
}

/// Source of the current business date
pub trait Clock: Send + Sync + 'static {
    /// Returns today's date in the business timezone
    fn today(&self) -> NaiveDate;

    /// Returns the current calendar year in the business timezone
    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Wall clock reading the system time in a fixed timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    timezone: Timezone,
}

impl SystemClock {
    pub fn new(timezone: Timezone) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        self.timezone.local_date(Utc::now())
    }
}

/// Clock frozen at a given date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Adds a payment term in days to an issue date
pub fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate, TemporalError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or(TemporalError::DateOutOfRange { date, days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_date_crosses_midnight() {
        let tz = Timezone::parse("Europe/Belgrade").unwrap();
        // 23:30 UTC on New Year's Eve is already January 1st in Belgrade
        let instant = Utc.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(tz.local_date(instant), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_unknown_timezone() {
        assert_eq!(
            Timezone::parse("Mars/Olympus"),
            Err(TemporalError::UnknownTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn test_fixed_clock_year() {
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(clock.current_year(), 2025);
    }

    #[test]
    fn test_add_days() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(add_days(date, 30).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
    }
}
