//! Entity events and evaluation results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A timestamped record of qualifying activity on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
    pub event_type: EntityEventType,
    /// Milliseconds since the UNIX epoch (UTC).
    pub event_time_ms: i64,
}

impl EntityEvent {
    pub fn new(event_type: EntityEventType, event_time_ms: i64) -> Self {
        Self {
            event_type,
            event_time_ms,
        }
    }
}

/// Kinds of entity events retrievable through a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityEventType {
    /// Rows changed based on the value of a particular field.
    FieldUpdate,
    /// The table changed per a last-updated statistic maintained by the
    /// source system.
    InformationSchemaUpdate,
    /// An operation on the entity recorded in the source's audit log.
    AuditLogOperation,
    /// A data job writing to the entity completed successfully.
    DataJobRunCompletedSuccess,
    /// A data job writing to the entity completed with a failure.
    DataJobRunCompletedFailure,
}

impl EntityEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityEventType::FieldUpdate => "FIELD_UPDATE",
            EntityEventType::InformationSchemaUpdate => "INFORMATION_SCHEMA_UPDATE",
            EntityEventType::AuditLogOperation => "AUDIT_LOG_OPERATION",
            EntityEventType::DataJobRunCompletedSuccess => "DATA_JOB_RUN_COMPLETED_SUCCESS",
            EntityEventType::DataJobRunCompletedFailure => "DATA_JOB_RUN_COMPLETED_FAILURE",
        }
    }
}

impl fmt::Display for EntityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail outcome of one assertion evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssertionResultType {
    Success,
    Failure,
}

impl AssertionResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertionResultType::Success => "SUCCESS",
            AssertionResultType::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for AssertionResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of evaluating an assertion. On success the matching events
/// are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionEvaluationResult {
    pub kind: AssertionResultType,
    pub events: Vec<EntityEvent>,
}

impl AssertionEvaluationResult {
    pub fn success(events: Vec<EntityEvent>) -> Self {
        Self {
            kind: AssertionResultType::Success,
            events,
        }
    }

    pub fn failure() -> Self {
        Self {
            kind: AssertionResultType::Failure,
            events: Vec::new(),
        }
    }
}

/// The `[start_ms, end_ms]` interval within which the evaluator asks the
/// warehouse for evidence of activity. `start_ms <= end_ms` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl ValidationWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        debug_assert!(start_ms <= end_ms, "window start must not exceed end");
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names() {
        assert_eq!(
            EntityEventType::InformationSchemaUpdate.as_str(),
            "INFORMATION_SCHEMA_UPDATE"
        );
        assert_eq!(AssertionResultType::Success.to_string(), "SUCCESS");
    }

    #[test]
    fn result_constructors() {
        let event = EntityEvent::new(EntityEventType::FieldUpdate, 1_690_000_000_000);
        let ok = AssertionEvaluationResult::success(vec![event]);
        assert_eq!(ok.kind, AssertionResultType::Success);
        assert_eq!(ok.events.len(), 1);

        let fail = AssertionEvaluationResult::failure();
        assert_eq!(fail.kind, AssertionResultType::Failure);
        assert!(fail.events.is_empty());
    }

    #[test]
    fn window_duration() {
        let window = ValidationWindow::new(1_000, 4_000);
        assert_eq!(window.duration_ms(), 3_000);
    }
}
