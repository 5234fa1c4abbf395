//! Warehouse connection resolution.
//!
//! This crate provides:
//! - The [`Connection`] handle: per-platform config plus a lazily
//!   constructed, memoized driver client
//! - Ingestion-recipe secret resolution through pluggable
//!   [`SecretStore`] implementations
//! - The [`ConnectionProvider`] that maps a data platform urn to a
//!   connection by reusing the catalog's ingestion recipes

pub mod bigquery;
pub mod connection;
pub mod error;
pub mod provider;
pub mod recipe;
pub mod redshift;
pub mod secret;
pub mod snowflake;

pub use bigquery::{BigQueryClient, BigQueryConfig, BigQueryConnection, LogEntry};
pub use connection::Connection;
pub use error::ConnectionError;
pub use provider::{ConnectionProvider, IngestionSourceConnectionProvider};
pub use redshift::{RedshiftConfig, RedshiftConnection};
pub use secret::{CatalogSecretStore, EnvSecretStore, SecretStore};
pub use snowflake::{SnowflakeClient, SnowflakeConfig, SnowflakeConnection};
