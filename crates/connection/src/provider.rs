//! Maps a data platform urn to a warehouse connection by reusing the
//! catalog's ingestion recipes as the source of credentials.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, warn};

use vigil_catalog::client::GraphApi;
use vigil_catalog::ingestion::{list_ingestion_sources, IngestionSource};
use vigil_core::urn;

use crate::bigquery::{BigQueryConfig, BigQueryConnection};
use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::recipe::resolve_recipe;
use crate::redshift::{RedshiftConfig, RedshiftConnection};
use crate::secret::SecretStore;
use crate::snowflake::{SnowflakeConfig, SnowflakeConnection};

/// Recipes executed by the CLI never represent a standing connection.
pub const CLI_EXECUTOR_ID: &str = "__datahub_cli_";

const DATA_PLATFORM_ENTITY_TYPE: &str = "dataPlatform";

const SNOWFLAKE_PLATFORM_NAME: &str = "snowflake";
const BIGQUERY_PLATFORM_NAME: &str = "bigquery";
const REDSHIFT_PLATFORM_NAME: &str = "redshift";

const SUPPORTED_PLATFORMS: &[&str] = &[
    SNOWFLAKE_PLATFORM_NAME,
    BIGQUERY_PLATFORM_NAME,
    REDSHIFT_PLATFORM_NAME,
];

/// Provider of connection details keyed by catalog urn.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Resolve a connection for the urn. `Ok(None)` means no matching
    /// connection is configured; errors mean resolution itself failed.
    async fn get_connection(&self, urn: &str)
        -> Result<Option<Arc<Connection>>, ConnectionError>;
}

/// Resolves connections from the catalog's ingestion sources.
///
/// Connections are memoized per urn: the mutex is held across the whole
/// resolution so a connection is built at most once per process
/// lifetime, no matter how many evaluations race on the same urn.
pub struct IngestionSourceConnectionProvider {
    graph: Arc<dyn GraphApi>,
    secret_stores: Vec<Arc<dyn SecretStore>>,
    cache: tokio::sync::Mutex<HashMap<String, Arc<Connection>>>,
}

impl IngestionSourceConnectionProvider {
    pub fn new(graph: Arc<dyn GraphApi>, secret_stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self {
            graph,
            secret_stores,
            cache: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    async fn resolve_from_data_platform(
        &self,
        platform_urn: &str,
    ) -> Result<Option<Arc<Connection>>, ConnectionError> {
        let platform = urn::platform_name(platform_urn)
            .map_err(|e| ConnectionError::Config(e.to_string()))?;

        if !SUPPORTED_PLATFORMS.contains(&platform) {
            return Err(ConnectionError::UnsupportedPlatform(platform.to_string()));
        }

        let sources = list_ingestion_sources(self.graph.as_ref()).await?;

        // Ingestion source types are assumed to match data platform names.
        let matching = sources.into_iter().find(|source| {
            source.source_type == platform
                && source.config.executor_id.as_deref() != Some(CLI_EXECUTOR_ID)
        });

        let Some(source) = matching else {
            error!(
                urn = %platform_urn,
                "failed to resolve connection: no matching ingestion sources configured"
            );
            return Ok(None);
        };

        match self.connection_from_source(platform_urn, platform, &source).await {
            Ok(connection) => Ok(Some(Arc::new(connection))),
            Err(ConnectionError::Secret(reason)) => Err(ConnectionError::Secret(reason)),
            Err(e) => {
                warn!(
                    urn = %platform_urn,
                    source_urn = %source.urn,
                    error = %e,
                    "failed to extract connection from ingestion source"
                );
                Ok(None)
            }
        }
    }

    async fn connection_from_source(
        &self,
        platform_urn: &str,
        platform: &str,
        source: &IngestionSource,
    ) -> Result<Connection, ConnectionError> {
        let recipe = resolve_recipe(&source.config.recipe, &self.secret_stores).await?;

        let config_value = recipe
            .pointer("/source/config")
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| {
                ConnectionError::Config("recipe missing source.config section".to_string())
            })?;

        debug!(
            urn = %platform_urn,
            source_urn = %source.urn,
            platform,
            "building connection from ingestion recipe"
        );

        match platform {
            SNOWFLAKE_PLATFORM_NAME => {
                let config: SnowflakeConfig = from_config(config_value)?;
                Ok(Connection::Snowflake(SnowflakeConnection::new(
                    platform_urn,
                    config,
                )))
            }
            BIGQUERY_PLATFORM_NAME => {
                let config: BigQueryConfig = from_config(config_value)?;
                Ok(Connection::BigQuery(BigQueryConnection::new(
                    platform_urn,
                    config,
                )))
            }
            REDSHIFT_PLATFORM_NAME => {
                let config: RedshiftConfig = from_config(config_value)?;
                Ok(Connection::Redshift(RedshiftConnection::new(
                    platform_urn,
                    config,
                )))
            }
            other => Err(ConnectionError::UnsupportedPlatform(other.to_string())),
        }
    }
}

fn from_config<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ConnectionError> {
    serde_json::from_value(value)
        .map_err(|e| ConnectionError::Config(format!("invalid source config: {e}")))
}

#[async_trait]
impl ConnectionProvider for IngestionSourceConnectionProvider {
    async fn get_connection(
        &self,
        urn: &str,
    ) -> Result<Option<Arc<Connection>>, ConnectionError> {
        let entity_type =
            urn::entity_type(urn).map_err(|e| ConnectionError::Config(e.to_string()))?;
        if entity_type != DATA_PLATFORM_ENTITY_TYPE {
            return Err(ConnectionError::UnsupportedPlatform(format!(
                "cannot resolve connections for {entity_type} urns"
            )));
        }

        let mut cache = self.cache.lock().await;
        if let Some(connection) = cache.get(urn) {
            return Ok(Some(connection.clone()));
        }

        let resolved = self.resolve_from_data_platform(urn).await?;
        if let Some(connection) = &resolved {
            cache.insert(urn.to_string(), connection.clone());
        }
        Ok(resolved)
    }
}
