//! Calendar-date and epoch-millisecond conversions shared by every crate.
//!
//! A trading day is placed on the continuous time axis at 00:00 UTC of its
//! calendar date.

use crate::error::CoreError;
use chrono::{DateTime, NaiveDate};

/// ISO calendar date format used on the wire and in shareable links.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Epoch milliseconds of `date` at midnight UTC.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    // `NaiveDate::default()` is the Unix epoch (1970-01-01).
    (date - NaiveDate::default()).num_days() * MILLIS_PER_DAY
}

/// The UTC calendar date containing `millis`, if representable.
pub fn millis_to_date(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| CoreError::InvalidInput("date".to_string(), format!("{value}: {e}")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
