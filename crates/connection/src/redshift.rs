//! Redshift connection: recipe-derived config plus a lazily created
//! Postgres-wire pool (Redshift speaks the Postgres protocol).

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ConnectionError;

/// Connection coordinates extracted from a Redshift ingestion recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct RedshiftConfig {
    /// `host:port` of the cluster endpoint.
    pub host_port: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
}

impl RedshiftConfig {
    fn connect_options(&self) -> Result<PgConnectOptions, ConnectionError> {
        let (host, port) = self
            .host_port
            .split_once(':')
            .ok_or_else(|| ConnectionError::Config("host_port must be host:port".to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| ConnectionError::Config(format!("invalid port in {:?}", self.host_port)))?;

        let mut options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.username)
            .database(&self.database);
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }
}

/// A connection to Redshift. The pool is created on first use.
pub struct RedshiftConnection {
    urn: String,
    config: RedshiftConfig,
    pool: OnceCell<PgPool>,
}

impl RedshiftConnection {
    pub fn new(urn: impl Into<String>, config: RedshiftConfig) -> Self {
        Self {
            urn: urn.into(),
            config,
            pool: OnceCell::new(),
        }
    }

    pub fn urn(&self) -> &str {
        &self.urn
    }

    pub fn config(&self) -> &RedshiftConfig {
        &self.config
    }

    /// The connection pool, created lazily and memoized.
    pub async fn pool(&self) -> Result<&PgPool, ConnectionError> {
        self.pool
            .get_or_try_init(|| async {
                let options = self.config.connect_options()?;
                debug!(host_port = %self.config.host_port, "connecting to redshift");
                let pool = PgPoolOptions::new()
                    .max_connections(2)
                    .connect_with(options)
                    .await?;
                Ok(pool)
            })
            .await
    }
}
