//! Run-event emission back to the catalog.
//!
//! Each evaluation outcome becomes an `assertionRunEvent` aspect wrapped
//! in a metadata-change proposal and posted to the catalog's ingest
//! endpoint. Matching events are serialized into the result's native
//! results so the catalog UI can show why an assertion passed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use vigil_core::model::{AssertionResultType, EntityEvent};

use crate::client::{CatalogError, GraphClient};

/// Run status reported with every emitted event; evaluations that never
/// complete produce no event at all.
pub const RUN_STATUS_COMPLETE: &str = "COMPLETE";

// ---------------------------------------------------------------------------
// Aspect payload
// ---------------------------------------------------------------------------

/// The `assertionRunEvent` aspect body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRunEvent {
    pub timestamp_millis: i64,
    pub run_id: String,
    pub assertee_urn: String,
    pub status: String,
    pub assertion_urn: String,
    pub result: AssertionRunResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRunResult {
    #[serde(rename = "type")]
    pub kind: AssertionResultType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_results: Option<BTreeMap<String, String>>,
}

/// Event shape inside the `events` native result; field order is part of
/// the emitted contract.
#[derive(Serialize)]
struct NativeEvent<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    time: i64,
}

impl AssertionRunResult {
    /// Build the result payload, serializing matching events into the
    /// `events` native result as a compact JSON array.
    pub fn from_outcome(kind: AssertionResultType, events: &[EntityEvent]) -> Self {
        let native_results = if events.is_empty() {
            None
        } else {
            let serialized: Vec<_> = events
                .iter()
                .map(|e| NativeEvent {
                    kind: e.event_type.as_str(),
                    time: e.event_time_ms,
                })
                .collect();
            let mut results = BTreeMap::new();
            results.insert(
                "events".to_string(),
                serde_json::to_string(&serialized).unwrap_or_default(),
            );
            Some(results)
        };

        Self {
            kind,
            native_results,
        }
    }
}

/// System metadata attached to the proposal envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetadata {
    pub run_id: String,
    pub last_observed: i64,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Emits aspects to the catalog. Behind a trait so the result handler can
/// be tested without a live endpoint.
#[async_trait]
pub trait AspectEmitter: Send + Sync {
    async fn emit_run_event(
        &self,
        event: &AssertionRunEvent,
        metadata: &SystemMetadata,
    ) -> Result<(), CatalogError>;
}

#[async_trait]
impl AspectEmitter for GraphClient {
    async fn emit_run_event(
        &self,
        event: &AssertionRunEvent,
        metadata: &SystemMetadata,
    ) -> Result<(), CatalogError> {
        let aspect_value = serde_json::to_string(event)
            .map_err(|e| CatalogError::Parse(format!("failed to serialize run event: {e}")))?;

        let proposal = json!({
            "proposal": {
                "entityType": "assertion",
                "entityUrn": event.assertion_urn,
                "changeType": "UPSERT",
                "aspectName": "assertionRunEvent",
                "aspect": {
                    "contentType": "application/json",
                    "value": aspect_value
                },
                "systemMetadata": metadata
            }
        });

        self.post_json("/aspects?action=ingestProposal", &proposal)
            .await?;

        debug!(
            assertion_urn = %event.assertion_urn,
            run_id = %event.run_id,
            "emitted assertion run event"
        );
        Ok(())
    }
}
