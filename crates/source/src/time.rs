//! Interpreting driver timestamp values as epoch milliseconds.
//!
//! Drivers hand back timestamps in several textual shapes: epoch seconds
//! (with fraction), epoch milliseconds, RFC 3339, naive datetimes, and
//! bare dates. Naive values are treated as UTC; bare dates are combined
//! with 00:00:00 UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::SourceError;

/// Parse a numeric cell that is already epoch milliseconds.
pub fn parse_millis_value(value: &str) -> Result<i64, SourceError> {
    value
        .trim()
        .parse::<f64>()
        .map(|v| v as i64)
        .map_err(|_| SourceError::Parse(format!("expected epoch millis, got {value:?}")))
}

/// Parse a driver timestamp value into epoch milliseconds.
///
/// Accepted shapes, tried in order:
/// - RFC 3339 (`2023-07-22T05:06:40Z`, offset forms)
/// - naive datetime (`2023-07-22 05:06:40[.fff]`, `T`-separated too) → UTC
/// - bare date (`2023-07-22`) → midnight UTC
/// - epoch seconds with fraction (`1690000000.123`)
/// - bare integers: epoch millis when 12+ digits, else epoch seconds
pub fn parse_timestamp_value(value: &str) -> Result<i64, SourceError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).timestamp_millis());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(midnight_utc_millis(date));
    }

    if value.contains('.') {
        if let Ok(seconds) = value.parse::<f64>() {
            return Ok((seconds * 1000.0) as i64);
        }
    } else if let Ok(number) = value.parse::<i64>() {
        let millis = if value.trim_start_matches('-').len() >= 12 {
            number
        } else {
            number * 1000
        };
        return Ok(millis);
    }

    Err(SourceError::Parse(format!(
        "unrecognized timestamp value {value:?}"
    )))
}

/// A bare date combined with 00:00:00 UTC, as epoch milliseconds.
pub fn midnight_utc_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis()
}
