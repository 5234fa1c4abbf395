use thiserror::Error;

use vigil_connection::ConnectionError;
use vigil_core::MonitorError;

/// Errors that can occur retrieving entity events from a warehouse.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying connection / driver call failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The field column's native type cannot be used as a watermark.
    #[error("unsupported column type: {0}")]
    UnsupportedColumnType(String),

    /// The adapter cannot retrieve events of the requested kind.
    #[error("unsupported entity event type: {0}")]
    UnsupportedEventType(String),

    /// Required source parameters were absent.
    #[error("missing required inputs: {0}")]
    MissingParameters(String),

    /// A row value could not be interpreted.
    #[error("failed to parse row value: {0}")]
    Parse(String),

    /// The adapter was bound to a connection for another platform.
    #[error("source misconfigured: {0}")]
    Config(String),
}

impl SourceError {
    /// Whether the retry envelope should take another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Connection(c) => c.is_transient(),
            _ => false,
        }
    }
}

impl From<SourceError> for MonitorError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Connection(c) => c.into(),
            SourceError::UnsupportedColumnType(t) => MonitorError::UnsupportedColumnType(t),
            SourceError::UnsupportedEventType(t) => MonitorError::UnsupportedSourceType(t),
            SourceError::MissingParameters(m) => MonitorError::MalformedAssertion(m),
            other => MonitorError::WarehouseTransient(other.to_string()),
        }
    }
}
