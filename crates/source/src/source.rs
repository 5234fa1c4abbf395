//! The source adapter trait.

use async_trait::async_trait;

use vigil_core::model::{EntityEvent, EntityEventType, SourceParams, ValidationWindow};

use crate::error::SourceError;

/// A connector responsible for fetching entity events from an external
/// system. Parallel concept to an ingestion source, but read-only and
/// scoped to freshness evidence.
#[async_trait]
pub trait Source: Send + Sync {
    /// Retrieve events of `event_type` for the entity within `window`.
    ///
    /// Implementations retry transient driver failures (3 attempts,
    /// exponential backoff) before surfacing an error.
    async fn get_entity_events(
        &self,
        entity_urn: &str,
        event_type: EntityEventType,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError>;
}
