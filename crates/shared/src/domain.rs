use std::{borrow::Borrow, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthKeyError {
    #[error("month value '{0}' is shorter than YYYY-MM")]
    TooShort(String),
    #[error("month value '{0}' does not start with a zero-padded YYYY-MM")]
    Malformed(String),
    #[error("month value '{0}' names a month outside 01..=12")]
    OutOfRange(String),
}

/// Calendar month in zero-padded `YYYY-MM` form.
///
/// Ordering is lexicographic on the inner string, which coincides with
/// chronological order because both components are zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(String);

impl MonthKey {
    /// Truncates an ISO date (`YYYY-MM-DD`, or an already truncated `YYYY-MM`)
    /// to its calendar month. Inputs shorter than seven characters are rejected
    /// rather than sliced.
    pub fn from_iso_date(raw: &str) -> Result<Self, MonthKeyError> {
        let Some(prefix) = raw.get(..7) else {
            return Err(MonthKeyError::TooShort(raw.to_string()));
        };

        let bytes = prefix.as_bytes();
        let digits_ok = bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..7].iter().all(u8::is_ascii_digit);
        if !digits_ok || bytes[4] != b'-' {
            return Err(MonthKeyError::Malformed(raw.to_string()));
        }
        if raw.len() > 7 && raw.as_bytes()[7] != b'-' {
            return Err(MonthKeyError::Malformed(raw.to_string()));
        }

        let month = (bytes[5] - b'0') * 10 + (bytes[6] - b'0');
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::OutOfRange(raw.to_string()));
        }

        Ok(Self(prefix.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or_default()
    }

    pub fn month(&self) -> u32 {
        self.0[5..7].parse().unwrap_or_default()
    }

    /// First calendar day of the month; the service keys monthly records on it.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_iso_date(s.trim())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_iso_date(&value)
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.0
    }
}

impl TryFrom<NaiveDate> for MonthKey {
    type Error = MonthKeyError;

    /// Years outside `0000..=9999` have no `YYYY-MM` form and are rejected.
    fn try_from(value: NaiveDate) -> Result<Self, Self::Error> {
        Self::from_iso_date(&value.format("%Y-%m").to_string())
    }
}

/// Table filter where `All` is a wildcard distinct from every concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T> Filter<T> {
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::All, Self::Only)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn matches<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            Self::All => true,
            Self::Only(expected) => expected.borrow() == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// Per-table filter state. The dataset and inputs tables each own one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSelection {
    pub kam: Filter<String>,
    pub month: Filter<MonthKey>,
}

impl FilterSelection {
    pub fn new(kam: Filter<String>, month: Filter<MonthKey>) -> Self {
        Self { kam, month }
    }

    pub fn kam(name: impl Into<String>) -> Self {
        Self {
            kam: Filter::Only(name.into()),
            month: Filter::All,
        }
    }

    pub fn month(month: MonthKey) -> Self {
        Self {
            kam: Filter::All,
            month: Filter::Only(month),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_full_iso_date_to_month() {
        let key = MonthKey::from_iso_date("2026-01-01").expect("month");
        assert_eq!(key.as_str(), "2026-01");
        assert_eq!(key.year(), 2026);
        assert_eq!(key.month(), 1);
        assert_eq!(key.first_day(), NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn calendar_dates_convert_only_within_four_digit_years() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).expect("date");
        assert_eq!(MonthKey::try_from(date).expect("month").as_str(), "2026-03");
        assert_eq!(
            format!("{:<8}|", MonthKey::try_from(date).expect("month")),
            "2026-03 |"
        );

        let far = NaiveDate::from_ymd_opt(10000, 1, 1).expect("date");
        assert!(matches!(
            MonthKey::try_from(far),
            Err(MonthKeyError::Malformed(_))
        ));
        let before_year_zero = NaiveDate::from_ymd_opt(-1, 1, 1).expect("date");
        assert!(MonthKey::try_from(before_year_zero).is_err());
    }

    #[test]
    fn accepts_already_truncated_month() {
        assert_eq!(
            "2025-12".parse::<MonthKey>().expect("month").as_str(),
            "2025-12"
        );
    }

    #[test]
    fn rejects_short_input_instead_of_slicing() {
        assert_eq!(
            MonthKey::from_iso_date("2026-1"),
            Err(MonthKeyError::TooShort("2026-1".into()))
        );
        assert!(matches!(
            MonthKey::from_iso_date(""),
            Err(MonthKeyError::TooShort(_))
        ));
    }

    #[test]
    fn rejects_unpadded_and_out_of_range_months() {
        assert!(matches!(
            MonthKey::from_iso_date("2026-1-05"),
            Err(MonthKeyError::Malformed(_))
        ));
        assert!(matches!(
            MonthKey::from_iso_date("2026/01/01"),
            Err(MonthKeyError::Malformed(_))
        ));
        assert!(matches!(
            MonthKey::from_iso_date("2026-13-01"),
            Err(MonthKeyError::OutOfRange(_))
        ));
    }

    #[test]
    fn month_keys_sort_chronologically() {
        let mut keys: Vec<MonthKey> = ["2026-02", "2025-11", "2026-01"]
            .iter()
            .map(|raw| raw.parse().expect("month"))
            .collect();
        keys.sort();
        let rendered: Vec<&str> = keys.iter().map(MonthKey::as_str).collect();
        assert_eq!(rendered, vec!["2025-11", "2026-01", "2026-02"]);
    }

    #[test]
    fn all_filter_is_a_wildcard_not_a_literal() {
        let all: Filter<String> = Filter::All;
        assert!(all.matches("All"));
        assert!(all.matches("Alice"));

        let literal = Filter::Only("All".to_string());
        assert!(literal.matches("All"));
        assert!(!literal.matches("Alice"));
    }

    #[test]
    fn filter_selection_round_trips_through_json() {
        let selection = FilterSelection::new(
            Filter::Only("Bob".into()),
            Filter::Only("2026-03".parse().expect("month")),
        );
        let raw = serde_json::to_string(&selection).expect("encode");
        let decoded: FilterSelection = serde_json::from_str(&raw).expect("decode");
        assert_eq!(decoded, selection);
    }
}
