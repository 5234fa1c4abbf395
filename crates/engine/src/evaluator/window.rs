//! Validation-window computation for freshness assertions.
//!
//! The window describes where in time the evaluator looks for evidence
//! of activity. It is derived from the assertion's own schedule (cron or
//! fixed interval), not from the job trigger schedule.

use chrono::{DateTime, Duration, Utc};

use vigil_core::model::{
    CalendarInterval, FixedIntervalSchedule, FreshnessCronSchedule, ValidationWindow,
};
use vigil_core::MonitorError;

use crate::scheduler::cron::{last_fire_at_or_before, next_fire_after, parse_schedule, parse_timezone};

/// A previous fire closer than this to `now` is considered degenerate
/// (the evaluation raced the tick itself) and is stepped back once more.
pub(crate) const MIN_PREV_FIRE_AGE_MS: i64 = 30_000;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Milliseconds per calendar interval unit.
///
/// DAY exists in the type system but is not accepted here.
pub fn unit_to_ms(unit: CalendarInterval) -> Result<i64, MonitorError> {
    match unit {
        CalendarInterval::Minute => Ok(MILLIS_PER_MINUTE),
        CalendarInterval::Hour => Ok(MILLIS_PER_HOUR),
        CalendarInterval::Day => Err(MonitorError::UnsupportedUnit(unit.to_string())),
    }
}

/// Sliding window: `multiple × unit` back from `now`.
pub fn fixed_interval_window(
    schedule: &FixedIntervalSchedule,
    now_ms: i64,
) -> Result<ValidationWindow, MonitorError> {
    let span = i64::from(schedule.multiple) * unit_to_ms(schedule.unit)?;
    Ok(ValidationWindow::new(now_ms - span, now_ms))
}

/// Cron-shaped window in the schedule's timezone.
///
/// The window ends at the next fire at-or-after `now`. Its start is the
/// previous fire at-or-before `now` (stepped one fire further back when
/// the previous fire is under thirty seconds old), unless an explicit
/// start offset from the window end was configured.
pub fn cron_window(
    schedule: &FreshnessCronSchedule,
    now: DateTime<Utc>,
) -> Result<ValidationWindow, MonitorError> {
    let tz = parse_timezone(&schedule.timezone)?;
    let cron = parse_schedule(&schedule.cron)?;
    let now_tz = now.with_timezone(&tz);

    let next = next_fire_after(&cron, &now_tz).ok_or_else(|| MonitorError::InvalidCron {
        expression: schedule.cron.clone(),
        reason: "no upcoming fire time".to_string(),
    })?;
    let end_ms = next.timestamp_millis();

    let start_ms = match schedule.window_start_offset_ms {
        Some(offset) => end_ms - offset,
        None => {
            let mut prev =
                last_fire_at_or_before(&cron, &now_tz).ok_or_else(|| MonitorError::InvalidCron {
                    expression: schedule.cron.clone(),
                    reason: "no previous fire time".to_string(),
                })?;

            if now.timestamp_millis() - prev.timestamp_millis() < MIN_PREV_FIRE_AGE_MS {
                let limit = prev - Duration::milliseconds(1);
                prev = last_fire_at_or_before(&cron, &limit).ok_or_else(|| {
                    MonitorError::InvalidCron {
                        expression: schedule.cron.clone(),
                        reason: "no previous fire time".to_string(),
                    }
                })?;
            }
            prev.timestamp_millis()
        }
    };

    Ok(ValidationWindow::new(start_ms.min(end_ms), end_ms))
}
