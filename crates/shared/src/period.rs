//! Calendar month keys (`YYYY-MM`) and the UTC windows they cover.
//!
//! The month key is the time-partition key used by every earnings query,
//! export and chart, so parsing is strict: four digit year, two digit month.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const LONG_MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Earliest and latest years accepted in a month key.
const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 9999;

/// Error type for month key parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthKeyError {
    #[error("Month must use the YYYY-MM format, got '{0}'")]
    InvalidFormat(String),

    #[error("Month is out of range: '{0}'")]
    OutOfRange(String),
}

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(NaiveDate);

/// Half-open UTC interval `[start, end)` covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// Whether the instant falls inside the window.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start <= *instant && *instant < self.end
    }
}

impl MonthKey {
    /// Build a month key from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(MonthKeyError::OutOfRange(format!("{:04}-{:02}", year, month)));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| MonthKeyError::OutOfRange(format!("{:04}-{:02}", year, month)))
    }

    /// The month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// The current UTC month.
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        Self(self.0 + Months::new(1))
    }

    /// The preceding calendar month.
    pub fn previous(&self) -> Self {
        Self(self.0 - Months::new(1))
    }

    /// The month `count` months before this one.
    pub fn months_before(&self, count: u32) -> Self {
        Self(self.0 - Months::new(count))
    }

    /// `count` trailing months ending with (and including) this month, oldest first.
    pub fn trailing(&self, count: u32) -> Vec<MonthKey> {
        (0..count).rev().map(|back| self.months_before(back)).collect()
    }

    /// UTC window `[first instant of month, first instant of next month)`.
    pub fn window(&self) -> MonthWindow {
        MonthWindow {
            start: Utc.from_utc_datetime(&self.0.and_time(NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&self.next().0.and_time(NaiveTime::MIN)),
        }
    }

    /// Three-letter month name, e.g. `Mar`.
    pub fn short_label(&self) -> &'static str {
        SHORT_MONTH_NAMES[self.0.month0() as usize]
    }

    /// Chart axis label, e.g. `Mar 25`.
    pub fn chart_label(&self) -> String {
        format!("{} {:02}", self.short_label(), self.year().rem_euclid(100))
    }

    /// Long label, e.g. `March 2025`.
    pub fn long_label(&self) -> String {
        format!("{} {}", LONG_MONTH_NAMES[self.0.month0() as usize], self.year())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| MonthKeyError::InvalidFormat(s.to_string()))?;

        if year.len() != 4
            || month.len() != 2
            || !year.chars().all(|c| c.is_ascii_digit())
            || !month.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MonthKeyError::InvalidFormat(s.to_string()));
        }

        let year: i32 = year
            .parse()
            .map_err(|_| MonthKeyError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthKeyError::InvalidFormat(s.to_string()))?;

        MonthKey::new(year, month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_key() {
        let key: MonthKey = "2025-03".parse().unwrap();
        assert_eq!(key.year(), 2025);
        assert_eq!(key.month(), 3);
        assert_eq!(key.to_string(), "2025-03");
    }

    #[test]
    fn test_parse_rejects_bad_formats() {
        for raw in ["2025-3", "25-03", "2025/03", "2025-13", "2025-00", "", "2025-03-01", "abcd-ef"] {
            assert!(raw.parse::<MonthKey>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_year() {
        assert!(matches!(
            "1969-12".parse::<MonthKey>(),
            Err(MonthKeyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_window_is_half_open_utc() {
        let key = MonthKey::new(2025, 3).unwrap();
        let window = key.window();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
        assert!(window.contains(&window.start));
        assert!(!window.contains(&window.end));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let key = MonthKey::new(2024, 12).unwrap();
        assert_eq!(key.next().to_string(), "2025-01");
        assert_eq!(
            key.window().end,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_trailing_months_oldest_first() {
        let key = MonthKey::new(2025, 2).unwrap();
        let months: Vec<String> = key.trailing(4).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn test_trailing_zero_is_empty() {
        assert!(MonthKey::new(2025, 2).unwrap().trailing(0).is_empty());
    }

    #[test]
    fn test_labels() {
        let key = MonthKey::new(2025, 3).unwrap();
        assert_eq!(key.short_label(), "Mar");
        assert_eq!(key.chart_label(), "Mar 25");
        assert_eq!(key.long_label(), "March 2025");
    }

    #[test]
    fn test_containing_truncates_to_first_day() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 19).unwrap();
        assert_eq!(MonthKey::containing(date), MonthKey::new(2025, 7).unwrap());
        assert_eq!(MonthKey::containing(date).window().start.day(), 1);
    }

    #[test]
    fn test_serde_as_string() {
        let key = MonthKey::new(2025, 1).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2025-01\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
