//! Assertion model: entity coordinates, freshness schedules, and
//! evaluation parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Enums ───────────────────────────────────────────────────────────

/// The kind of assertion attached to a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssertionType {
    Dataset,
    Freshness,
}

impl AssertionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertionType::Dataset => "DATASET",
            AssertionType::Freshness => "FRESHNESS",
        }
    }
}

impl fmt::Display for AssertionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of freshness assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreshnessAssertionType {
    DatasetChange,
}

/// Which schedule variant a freshness assertion carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreshnessScheduleKind {
    Cron,
    FixedInterval,
}

/// Calendar interval unit for fixed-interval schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarInterval {
    Minute,
    Hour,
    Day,
}

impl CalendarInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarInterval::Minute => "MINUTE",
            CalendarInterval::Hour => "HOUR",
            CalendarInterval::Day => "DAY",
        }
    }
}

impl fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the freshness signal comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetFreshnessSourceType {
    /// A column / field value last-updated watermark.
    FieldValue,
    /// The source system's table last-updated statistic.
    InformationSchema,
    /// The source system's audit log.
    AuditLog,
}

impl DatasetFreshnessSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFreshnessSourceType::FieldValue => "FIELD_VALUE",
            DatasetFreshnessSourceType::InformationSchema => "INFORMATION_SCHEMA",
            DatasetFreshnessSourceType::AuditLog => "AUDIT_LOG",
        }
    }
}

impl fmt::Display for DatasetFreshnessSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of evaluation parameters attached to a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssertionEvaluationParametersType {
    DatasetFreshness,
}

// ── Schedules ───────────────────────────────────────────────────────

/// The trigger schedule controlling *when* an evaluation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronSchedule {
    /// Five-field cron expression: `minute hour day month day_of_week`.
    pub cron: String,
    /// IANA timezone name.
    pub timezone: String,
}

/// Cron-shaped validation window description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessCronSchedule {
    pub cron: String,
    pub timezone: String,
    /// Optional window-start offset back from the window end. When absent
    /// the previous cron fire is used as the window start.
    #[serde(default)]
    pub window_start_offset_ms: Option<i64>,
}

/// Sliding-window validation description: `multiple × unit` back from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedIntervalSchedule {
    pub unit: CalendarInterval,
    pub multiple: u32,
}

/// The validation-window shape of a freshness assertion. Exactly one of
/// `cron` / `fixed_interval` is expected to be present, per `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessAssertionSchedule {
    #[serde(rename = "type")]
    pub kind: FreshnessScheduleKind,
    #[serde(default)]
    pub cron: Option<FreshnessCronSchedule>,
    #[serde(default)]
    pub fixed_interval: Option<FixedIntervalSchedule>,
}

/// A freshness expectation on a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessAssertion {
    #[serde(rename = "type")]
    pub kind: FreshnessAssertionType,
    pub schedule: FreshnessAssertionSchedule,
}

// ── Parameters ──────────────────────────────────────────────────────

/// A dataset field used as a freshness watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFieldSpec {
    /// Field path within the schema.
    pub path: String,
    /// Standardized field type.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Native column type as collected from the source system.
    #[serde(default)]
    pub native_type: Option<String>,
}

/// Filters applied when reading the source's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogSpec {
    /// Operation types to consider; all operations when absent.
    #[serde(default)]
    pub operation_types: Option<Vec<String>>,
    /// Only consider operations performed by this user.
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Parameters for evaluating a dataset freshness assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFreshnessParameters {
    pub source_type: DatasetFreshnessSourceType,
    /// Present when `source_type` is FIELD_VALUE.
    #[serde(default)]
    pub field: Option<SchemaFieldSpec>,
    /// Present when `source_type` is AUDIT_LOG.
    #[serde(default)]
    pub audit_log: Option<AuditLogSpec>,
}

/// Parameters required to evaluate an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionEvaluationParameters {
    #[serde(rename = "type")]
    pub kind: AssertionEvaluationParametersType,
    #[serde(default)]
    pub dataset_freshness_parameters: Option<DatasetFreshnessParameters>,
}

impl AssertionEvaluationParameters {
    /// The defaults substituted when a spec carries no parameters:
    /// dataset freshness backed by the information schema.
    pub fn default_freshness() -> Self {
        Self {
            kind: AssertionEvaluationParametersType::DatasetFreshness,
            dataset_freshness_parameters: Some(DatasetFreshnessParameters {
                source_type: DatasetFreshnessSourceType::InformationSchema,
                field: None,
                audit_log: None,
            }),
        }
    }
}

/// Explicit per-variant source parameters handed to the adapters.
///
/// This is the flattened form of the evaluation parameters: the adapter
/// receives exactly the spec matching the requested event type, never a
/// generic attribute map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceParams {
    None,
    Field(SchemaFieldSpec),
    AuditLog(AuditLogSpec),
}

impl SourceParams {
    pub fn as_field(&self) -> Option<&SchemaFieldSpec> {
        match self {
            SourceParams::Field(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_audit_log(&self) -> Option<&AuditLogSpec> {
        match self {
            SourceParams::AuditLog(spec) => Some(spec),
            _ => None,
        }
    }
}

// ── Assertion ───────────────────────────────────────────────────────

/// The dataset the assertion is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionEntity {
    pub urn: String,
    pub platform_urn: String,
    #[serde(default)]
    pub platform_instance: Option<String>,
    #[serde(default)]
    pub sub_types: Option<Vec<String>>,
}

/// A declarative rule attached to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    pub urn: String,
    #[serde(rename = "type")]
    pub kind: AssertionType,
    pub entity: AssertionEntity,
    /// Key used by the connection provider. In the current contract this
    /// is the entity's platform urn.
    #[serde(default)]
    pub connection_urn: Option<String>,
    #[serde(default)]
    pub freshness_assertion: Option<FreshnessAssertion>,
}

/// Context provided during an assertion evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssertionEvaluationContext {
    /// Dry-run evaluations produce a result but never reach the result
    /// handlers.
    pub dry_run: bool,
}
