//! Monitor model: the catalog entity grouping assertion evaluation specs.

use serde::{Deserialize, Serialize};

use super::assertion::{Assertion, AssertionEvaluationParameters, CronSchedule};

/// The kind of monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorType {
    Assertion,
}

/// One scheduled evaluation: the assertion, its trigger schedule, and the
/// parameters the evaluator needs. This triple uniquely determines one
/// scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionEvaluationSpec {
    pub assertion: Assertion,
    pub schedule: CronSchedule,
    #[serde(default)]
    pub parameters: Option<AssertionEvaluationParameters>,
}

/// A monitor that evaluates assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionMonitor {
    pub assertions: Vec<AssertionEvaluationSpec>,
}

/// An asset monitor as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub urn: String,
    #[serde(rename = "type")]
    pub kind: MonitorType,
    #[serde(default)]
    pub assertion_monitor: Option<AssertionMonitor>,
}
