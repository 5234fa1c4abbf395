//! Upstream metadata catalog access.
//!
//! This crate provides:
//! - [`GraphClient`], a GraphQL client for the catalog endpoint (behind
//!   the [`GraphApi`] trait so callers can be tested with mocks)
//! - The monitor fetcher with its retry envelope and explicit
//!   GraphQL-to-model mapping
//! - Ingestion-source listing and secret-value lookup used by the
//!   connection provider
//! - The run-event emitter producing metadata-change proposals

pub mod client;
pub mod emitter;
pub mod fetcher;
pub mod ingestion;
pub mod mapper;
pub mod queries;

pub use client::{CatalogError, GraphApi, GraphClient};
pub use emitter::{AspectEmitter, AssertionRunEvent, AssertionRunResult, SystemMetadata};
pub use fetcher::MonitorFetcher;
pub use ingestion::{IngestionSource, IngestionSourceConfig};
