//! Warehouse source adapters.
//!
//! Each adapter answers one question: did an event of kind K happen for
//! entity E inside the window [t0, t1]? The translation into SQL (or a
//! Cloud Logging filter for BigQuery audit logs) lives in pure builder
//! functions per adapter; the adapter submits the query through its
//! connection's client and maps rows to [`EntityEvent`]s.
//!
//! [`EntityEvent`]: vigil_core::model::EntityEvent

pub mod bigquery;
pub mod error;
pub mod provider;
pub mod redshift;
pub mod snowflake;
pub mod source;
pub mod time;

pub use bigquery::BigQuerySource;
pub use error::SourceError;
pub use provider::{DefaultSourceProvider, SourceProvider};
pub use redshift::RedshiftSource;
pub use snowflake::SnowflakeSource;
pub use source::Source;
