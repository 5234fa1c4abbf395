//! Cron expression helpers shared by the scheduler and the freshness
//! window math.

use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use cron::Schedule;

use vigil_core::MonitorError;

/// Normalize a 5-field cron expression to 6-field by prepending "0" for
/// seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour dom month dow`.
/// The catalog contract uses standard 5-field cron:
/// `min hour dom month dow`.
pub(crate) fn normalize_cron(cron_5field: &str) -> String {
    let trimmed = cron_5field.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        // Already 6-field or non-standard; let the parser judge.
        trimmed.to_string()
    }
}

/// Parse a 5-field cron expression.
pub(crate) fn parse_schedule(expression: &str) -> Result<Schedule, MonitorError> {
    Schedule::from_str(&normalize_cron(expression)).map_err(|e| MonitorError::InvalidCron {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an IANA timezone name.
pub(crate) fn parse_timezone(timezone: &str) -> Result<Tz, MonitorError> {
    timezone
        .parse::<Tz>()
        .map_err(|_| MonitorError::InvalidTimezone(timezone.to_string()))
}

/// The first fire strictly after `when`.
pub(crate) fn next_fire_after<Z: TimeZone>(
    schedule: &Schedule,
    when: &DateTime<Z>,
) -> Option<DateTime<Z>> {
    schedule.after(when).next()
}

/// The last fire at or before `limit`.
///
/// The `cron` crate only iterates forward, so the scan starts from an
/// escalating lookback (a day, a month, a year) and keeps the last fire
/// that does not pass `limit`.
pub(crate) fn last_fire_at_or_before(
    schedule: &Schedule,
    limit: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    for lookback_days in [1, 35, 400] {
        let from = limit.clone() - Duration::days(lookback_days);
        let mut last = None;
        for fire in schedule.after(&from) {
            if fire > *limit {
                break;
            }
            last = Some(fire);
        }
        if last.is_some() {
            return last;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::UTC;

    #[test]
    fn normalizes_five_field_expressions() {
        assert_eq!(normalize_cron("0 * * * *"), "0 0 * * * *");
        assert_eq!(normalize_cron("0 0 * * * *"), "0 0 * * * *");
        assert_eq!(normalize_cron("  15 2 * * 1  "), "0 15 2 * * 1");
    }

    #[test]
    fn parses_standard_expressions() {
        assert!(parse_schedule("0 * * * *").is_ok());
        assert!(parse_schedule("1 2 3 4 5").is_ok());
        assert!(parse_schedule("not a cron").is_err());
    }

    #[test]
    fn parses_timezones() {
        assert!(parse_timezone("America/Los_Angeles").is_ok());
        assert!(parse_timezone("UTC").is_ok());
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn fires_around_half_past() {
        let schedule = parse_schedule("0 * * * *").unwrap();
        let now = Utc
            .with_ymd_and_hms(2023, 7, 10, 14, 30, 0)
            .unwrap()
            .with_timezone(&UTC);

        let next = next_fire_after(&schedule, &now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 7, 10, 15, 0, 0).unwrap());

        let prev = last_fire_at_or_before(&schedule, &now).unwrap();
        assert_eq!(prev, Utc.with_ymd_and_hms(2023, 7, 10, 14, 0, 0).unwrap());
    }

    #[test]
    fn prev_fire_includes_exact_match() {
        let schedule = parse_schedule("0 * * * *").unwrap();
        let now = Utc
            .with_ymd_and_hms(2023, 7, 10, 14, 0, 0)
            .unwrap()
            .with_timezone(&UTC);
        let prev = last_fire_at_or_before(&schedule, &now).unwrap();
        assert_eq!(prev, Utc.with_ymd_and_hms(2023, 7, 10, 14, 0, 0).unwrap());
    }

    #[test]
    fn sparse_schedule_uses_longer_lookback() {
        // Yearly fire: January 1st at 00:00.
        let schedule = parse_schedule("0 0 1 1 *").unwrap();
        let now = Utc
            .with_ymd_and_hms(2023, 7, 10, 0, 0, 0)
            .unwrap()
            .with_timezone(&UTC);
        let prev = last_fire_at_or_before(&schedule, &now).unwrap();
        assert_eq!(prev, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
    }
}
