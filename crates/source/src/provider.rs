//! Source construction from connections.

use std::sync::Arc;

use vigil_connection::Connection;

use crate::bigquery::BigQuerySource;
use crate::error::SourceError;
use crate::redshift::RedshiftSource;
use crate::snowflake::SnowflakeSource;
use crate::source::Source;

/// Provider of sources, keyed by the connection's platform.
pub trait SourceProvider: Send + Sync {
    fn create_source(&self, connection: Arc<Connection>) -> Result<Arc<dyn Source>, SourceError>;
}

/// Instantiates the adapter matching the connection's platform.
pub struct DefaultSourceProvider;

impl SourceProvider for DefaultSourceProvider {
    fn create_source(&self, connection: Arc<Connection>) -> Result<Arc<dyn Source>, SourceError> {
        match connection.as_ref() {
            Connection::Snowflake(_) => Ok(Arc::new(SnowflakeSource::new(connection))),
            Connection::BigQuery(_) => Ok(Arc::new(BigQuerySource::new(connection))),
            Connection::Redshift(_) => Ok(Arc::new(RedshiftSource::new(connection))),
        }
    }
}
