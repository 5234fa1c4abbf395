use thiserror::Error;

/// Errors surfaced along the assertion evaluation path.
///
/// The scheduler is the containment boundary: everything below it raises
/// upward, and the scheduler logs and swallows at the worker edge so a
/// failing evaluation never affects other jobs.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// No evaluator is registered for the assertion's type.
    #[error("no evaluator registered for assertion type {0}")]
    UnknownAssertionType(String),

    /// The connection provider could not resolve a connection for the urn.
    #[error("unable to resolve connection for urn {0}")]
    ConnectionUnavailable(String),

    /// The data platform is not one we know how to query.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The freshness source type cannot be mapped to an event request.
    #[error("unsupported source type: {0}")]
    UnsupportedSourceType(String),

    /// The field column's native type is not queryable for freshness.
    #[error("unsupported column type: {0}")]
    UnsupportedColumnType(String),

    /// The fixed-interval unit is not accepted by the evaluator.
    #[error("unsupported calendar interval unit: {0}")]
    UnsupportedUnit(String),

    /// A warehouse call failed after exhausting retries.
    #[error("warehouse error: {0}")]
    WarehouseTransient(String),

    /// Emitting a run event back to the catalog failed.
    #[error("failed to emit run event to catalog: {0}")]
    CatalogEmitFailed(String),

    /// The assertion is missing required nested fields.
    #[error("malformed assertion: {0}")]
    MalformedAssertion(String),

    /// An evaluation exceeded its wall-clock cap.
    #[error("evaluation timed out after {0}s")]
    EvaluationTimeout(u64),

    /// A catalog (GraphQL) call failed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A cron expression could not be parsed.
    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },

    /// A timezone name is not a known IANA zone.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// A urn did not have the expected structure.
    #[error("invalid urn {urn:?}: {reason}")]
    InvalidUrn { urn: String, reason: String },
}
