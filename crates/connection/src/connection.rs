//! The connection handle shared by the evaluation path.

/// Platform urns we can resolve connections for.
pub const SNOWFLAKE_PLATFORM_URN: &str = "urn:li:dataPlatform:snowflake";
pub const BIGQUERY_PLATFORM_URN: &str = "urn:li:dataPlatform:bigquery";
pub const REDSHIFT_PLATFORM_URN: &str = "urn:li:dataPlatform:redshift";

use crate::bigquery::BigQueryConnection;
use crate::redshift::RedshiftConnection;
use crate::snowflake::SnowflakeConnection;

/// An authenticated route to one warehouse.
///
/// Each variant carries the platform config and a lazily constructed
/// client; the client is created at most once per connection and the
/// provider hands out at most one connection per urn, so driver setup
/// happens once per process lifetime.
pub enum Connection {
    Snowflake(SnowflakeConnection),
    BigQuery(BigQueryConnection),
    Redshift(RedshiftConnection),
}

impl Connection {
    /// The urn this connection was resolved for.
    pub fn urn(&self) -> &str {
        match self {
            Connection::Snowflake(c) => c.urn(),
            Connection::BigQuery(c) => c.urn(),
            Connection::Redshift(c) => c.urn(),
        }
    }

    /// The data platform urn of the underlying warehouse.
    pub fn platform_urn(&self) -> &'static str {
        match self {
            Connection::Snowflake(_) => SNOWFLAKE_PLATFORM_URN,
            Connection::BigQuery(_) => BIGQUERY_PLATFORM_URN,
            Connection::Redshift(_) => REDSHIFT_PLATFORM_URN,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("urn", &self.urn())
            .field("platform_urn", &self.platform_urn())
            .finish_non_exhaustive()
    }
}
