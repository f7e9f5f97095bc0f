//! Conversions between domain values and their column representation
//!
//! Money is stored as integer cents, instants as fixed-width RFC 3339 UTC text
//! (lexicographic order == chronological order), calendar days as `YYYY-MM-DD`.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use lus_core::Amount;
use std::str::FromStr;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn ts(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_ts(field: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| StoreError::invalid_value(field, value))
}

pub fn parse_opt_ts(field: &str, value: Option<&str>) -> StoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(field, v)).transpose()
}

pub fn day(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_day(field: &str, value: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| StoreError::invalid_value(field, value))
}

pub fn cents(amount: &Amount) -> StoreResult<i64> {
    Ok(amount.to_cents()?)
}

pub fn amount(cents: i64) -> StoreResult<Amount> {
    Ok(Amount::from_cents(cents)?)
}

pub fn parse_enum<T: FromStr>(field: &str, value: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::invalid_value(field, value))
}

pub fn parse_opt_enum<T: FromStr>(field: &str, value: Option<&str>) -> StoreResult<Option<T>> {
    value.map(|v| parse_enum(field, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_chronologically() {
        let a = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(5);
        assert!(ts(&a) < ts(&b));
        assert_eq!(parse_ts("t", &ts(&b)).unwrap(), b);
    }

    #[test]
    fn test_day_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(day(&d), "2024-02-29");
        assert_eq!(parse_day("d", "2024-02-29").unwrap(), d);
        assert!(parse_day("d", "29/02/2024").is_err());
    }
}
