//! Calendar dates in the `DD/MM/YYYY` representation used at the repository boundary.

use crate::error::{CoreError, Result};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A day-granularity date, displayed and parsed as `DD/MM/YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReviewDate(NaiveDate);

impl ReviewDate {
    /// Build from day, month and year. Returns `None` for impossible dates.
    pub fn from_dmy(day: u32, month: u32, year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local timezone.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    /// Add a number of days, rolling over months and years.
    ///
    /// Returns `None` past the last representable date.
    pub fn plus_days(self, days: u32) -> Option<Self> {
        self.0.checked_add_days(Days::new(u64::from(days))).map(Self)
    }
}

impl fmt::Display for ReviewDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04}",
            self.0.day(),
            self.0.month(),
            self.0.year()
        )
    }
}

impl FromStr for ReviewDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let unparseable = || CoreError::UnparseableDate {
            value: s.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(unparseable());
        }

        let day: u32 = parts[0].parse().map_err(|_| unparseable())?;
        let month: u32 = parts[1].parse().map_err(|_| unparseable())?;
        let year: i32 = parts[2].parse().map_err(|_| unparseable())?;

        Self::from_dmy(day, month, year).ok_or_else(unparseable)
    }
}

impl Serialize for ReviewDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReviewDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a stored date, substituting `fallback` when it doesn't match `DD/MM/YYYY`.
pub fn parse_or(raw: &str, fallback: ReviewDate) -> ReviewDate {
    match raw.parse() {
        Ok(date) => date,
        Err(err) => {
            tracing::debug!(%err, %fallback, "recovering from unparseable date");
            fallback
        }
    }
}
