use thiserror::Error;

use vigil_core::MonitorError;

/// Errors that can occur resolving or using a warehouse connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from a warehouse endpoint.
    #[error("warehouse endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Postgres-wire (Redshift) failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The warehouse rejected or failed the submitted statement.
    #[error("statement failed: {0}")]
    Statement(String),

    /// The platform urn is not one we can build a connection for.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Connection configuration was missing or invalid.
    #[error("connection config error: {0}")]
    Config(String),

    /// A secret reference could not be resolved.
    #[error("secret resolution failed: {0}")]
    Secret(String),

    /// A catalog call made during resolution failed.
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl ConnectionError {
    /// Whether a retry could plausibly succeed. Driver-side failures are
    /// treated as transient; configuration problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectionError::Http(_) | ConnectionError::Database(_) => true,
            ConnectionError::Status { status, .. } => *status >= 500,
            ConnectionError::Statement(_) => true,
            _ => false,
        }
    }
}

impl From<vigil_catalog::CatalogError> for ConnectionError {
    fn from(e: vigil_catalog::CatalogError) -> Self {
        ConnectionError::Catalog(e.to_string())
    }
}

impl From<ConnectionError> for MonitorError {
    fn from(e: ConnectionError) -> Self {
        match e {
            ConnectionError::UnsupportedPlatform(p) => MonitorError::UnsupportedPlatform(p),
            other => MonitorError::WarehouseTransient(other.to_string()),
        }
    }
}
