//! Per-job descriptor types.

use uuid::Uuid;

/// Identifier of one scheduled cron binding.
pub type JobId = Uuid;

/// Descriptor of a scheduled evaluation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: JobId,
    /// Urn of the assertion this job evaluates.
    pub assertion_urn: String,
    /// Five-field trigger expression, as configured.
    pub cron: String,
    /// IANA timezone the trigger fires in.
    pub timezone: String,
}
