/// Calendar normalization: instants to timezone-local day buckets
///
/// A day is always local midnight to local midnight in the habit's zone,
/// never a fixed 24 hour span, so DST days of 23 or 25 hours bucket correctly.
/// Nothing in here reads the system clock; "now" comes from a [`Clock`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Canonical calendar date in a specific timezone (`YYYY-MM-DD`)
///
/// This is the atomic unit of completion tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a day from its parts, `None` if the date doesn't exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Shift by a signed number of days, saturating at the calendar limits
    pub fn offset_days(&self, days: i64) -> DayKey {
        match self.0.checked_add_signed(Duration::days(days)) {
            Some(date) => DayKey(date),
            None if days < 0 => DayKey(NaiveDate::MIN),
            None => DayKey(NaiveDate::MAX),
        }
    }

    /// Months since year 0, so consecutive calendar months differ by one
    pub fn month_index(&self) -> i64 {
        self.0.year() as i64 * 12 + self.0.month0() as i64
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(DayKey)
            .map_err(|_| DomainError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", s)))
    }
}

/// Signed whole days from `a` to `b` (positive when `b` is later)
pub fn days_between(a: DayKey, b: DayKey) -> i64 {
    (b.0 - a.0).num_days()
}

pub fn previous_day(day: DayKey) -> DayKey {
    day.offset_days(-1)
}

/// True iff `b` is the day right after `a`
pub fn is_consecutive(a: DayKey, b: DayKey) -> bool {
    days_between(a, b) == 1
}

/// A timezone after name resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedZone {
    pub tz: Tz,
    /// Set when the requested name was not a known IANA zone and UTC was
    /// used instead
    pub fell_back_to_utc: bool,
}

/// Strictly parse an IANA zone name, rejecting unknown names
pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(format!("'{}' is not a known IANA timezone", name)))
}

/// Resolve a zone name, falling back to UTC (observably) when unknown
pub fn resolve_timezone(name: &str) -> ResolvedZone {
    match parse_timezone(name) {
        Ok(tz) => ResolvedZone { tz, fell_back_to_utc: false },
        Err(_) => {
            tracing::warn!("Unknown timezone '{}', falling back to UTC day boundaries", name);
            ResolvedZone { tz: chrono_tz::UTC, fell_back_to_utc: true }
        }
    }
}

/// The day an instant falls on, plus whether the zone had to fall back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucket {
    pub day: DayKey,
    pub fell_back_to_utc: bool,
}

/// Bucket an instant into the calendar day it falls on in `timezone`
pub fn day_bucket(instant: DateTime<Utc>, timezone: &str) -> DayBucket {
    let zone = resolve_timezone(timezone);
    DayBucket {
        day: day_in_zone(instant, zone.tz),
        fell_back_to_utc: zone.fell_back_to_utc,
    }
}

/// Bucket an instant using an already resolved zone
pub fn day_in_zone(instant: DateTime<Utc>, tz: Tz) -> DayKey {
    DayKey(instant.with_timezone(&tz).date_naive())
}

/// Source of the current instant
///
/// The engine never reads the system clock itself; the surrounding
/// application supplies one of these.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// A clock frozen at one instant, for deterministic callers and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_bucket_respects_zone_offset() {
        // 15:00 UTC on Jan 1 is already Jan 2 in Tokyo
        let instant = utc(2024, 1, 1, 15, 0);
        assert_eq!(day_bucket(instant, "Asia/Tokyo").day, day("2024-01-02"));
        assert_eq!(day_bucket(instant, "UTC").day, day("2024-01-01"));
        // ...and still Jan 1 in New York
        assert_eq!(day_bucket(instant, "America/New_York").day, day("2024-01-01"));
    }

    #[test]
    fn test_dst_spring_forward_day_is_23_hours() {
        // 2024-03-10 in New York runs 05:00Z .. 03:59:59Z next day
        let tz = "America/New_York";
        assert_eq!(day_bucket(utc(2024, 3, 10, 4, 59), tz).day, day("2024-03-09"));
        assert_eq!(day_bucket(utc(2024, 3, 10, 5, 0), tz).day, day("2024-03-10"));
        assert_eq!(day_bucket(utc(2024, 3, 11, 3, 59), tz).day, day("2024-03-10"));
        assert_eq!(day_bucket(utc(2024, 3, 11, 4, 0), tz).day, day("2024-03-11"));
    }

    #[test]
    fn test_dst_fall_back_day_is_25_hours() {
        // 2024-11-03 in New York runs 04:00Z .. 04:59:59Z next day
        let tz = "America/New_York";
        assert_eq!(day_bucket(utc(2024, 11, 3, 4, 0), tz).day, day("2024-11-03"));
        assert_eq!(day_bucket(utc(2024, 11, 4, 4, 59), tz).day, day("2024-11-03"));
        assert_eq!(day_bucket(utc(2024, 11, 4, 5, 0), tz).day, day("2024-11-04"));
    }

    #[test]
    fn test_unknown_zone_falls_back_observably() {
        let bucket = day_bucket(utc(2024, 6, 1, 23, 30), "Mars/Olympus_Mons");
        assert!(bucket.fell_back_to_utc);
        assert_eq!(bucket.day, day("2024-06-01"));

        let known = day_bucket(utc(2024, 6, 1, 23, 30), "Europe/Berlin");
        assert!(!known.fell_back_to_utc);
        assert_eq!(known.day, day("2024-06-02"));
    }

    #[test]
    fn test_day_arithmetic() {
        let a = day("2024-02-28");
        let b = day("2024-03-01");
        assert_eq!(days_between(a, b), 2); // leap year
        assert_eq!(days_between(b, a), -2);
        assert_eq!(previous_day(b), day("2024-02-29"));
        assert!(is_consecutive(day("2023-12-31"), day("2024-01-01")));
        assert!(!is_consecutive(day("2024-01-01"), day("2023-12-31")));
        assert!(!is_consecutive(a, a));
    }

    #[test]
    fn test_month_index_is_contiguous_across_years() {
        assert_eq!(day("2024-01-15").month_index() - day("2023-12-31").month_index(), 1);
    }

    #[test]
    fn test_malformed_day_is_rejected() {
        assert!("2024-13-01".parse::<DayKey>().is_err());
        assert!("yesterday".parse::<DayKey>().is_err());
        assert_eq!(day(" 2024-05-06 ").to_string(), "2024-05-06");
    }
}
