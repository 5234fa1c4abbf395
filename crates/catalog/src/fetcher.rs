//! Periodic monitor listing with a retry envelope.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error};

use vigil_core::model::Monitor;
use vigil_core::retry::{retry_with_backoff, RetryPolicy};

use crate::client::{CatalogError, GraphApi};
use crate::mapper::monitors_from_search;
use crate::queries::LIST_MONITORS_QUERY;

/// Page size for the monitor search call.
pub const LIST_MONITORS_BATCH_SIZE: u32 = 1000;

/// Fetches the full monitor list from the catalog.
pub struct MonitorFetcher {
    graph: Arc<dyn GraphApi>,
    batch_size: u32,
}

impl MonitorFetcher {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self {
            graph,
            batch_size: LIST_MONITORS_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Fetch the list of monitors.
    ///
    /// Transport failures are retried (3 attempts, exponential backoff).
    /// A structurally incomplete response yields an empty list rather
    /// than an error, so one bad page does not stall the refresh loop.
    pub async fn fetch_monitors(&self) -> Result<Vec<Monitor>, CatalogError> {
        let data = retry_with_backoff(
            RetryPolicy::default(),
            "fetch_monitors",
            CatalogError::is_transient,
            || self.list_monitors_once(),
        )
        .await?;

        let Some(results) = data
            .pointer("/searchAcrossEntities/searchResults")
            .and_then(Value::as_array)
        else {
            error!("incomplete search results when fetching monitors");
            return Ok(Vec::new());
        };

        let entities: Vec<Value> = results
            .iter()
            .filter_map(|r| r.get("entity"))
            .cloned()
            .collect();

        let monitors = monitors_from_search(&entities);
        debug!(count = monitors.len(), "fetched monitors");
        Ok(monitors)
    }

    async fn list_monitors_once(&self) -> Result<Value, CatalogError> {
        let variables = json!({
            "input": {
                "types": ["MONITOR"],
                "query": "*",
                "start": 0,
                "count": self.batch_size,
                "searchFlags": { "skipCache": true }
            }
        });
        self.graph.execute(LIST_MONITORS_QUERY, variables).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// GraphApi stub that fails a configurable number of times before
    /// returning a canned payload.
    struct FlakyGraph {
        failures: u32,
        calls: AtomicU32,
        payload: Value,
    }

    #[async_trait]
    impl GraphApi for FlakyGraph {
        async fn execute(&self, _query: &str, _variables: Value) -> Result<Value, CatalogError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(CatalogError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(self.payload.clone())
            }
        }
    }

    fn search_payload() -> Value {
        json!({
            "searchAcrossEntities": {
                "searchResults": [
                    {
                        "entity": {
                            "urn": "urn:li:monitor:test",
                            "type": "MONITOR",
                            "info": { "type": "ASSERTION" }
                        }
                    }
                ]
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures() {
        let graph = Arc::new(FlakyGraph {
            failures: 2,
            calls: AtomicU32::new(0),
            payload: search_payload(),
        });
        let fetcher = MonitorFetcher::new(graph.clone());

        let monitors = fetcher.fetch_monitors().await.unwrap();
        assert_eq!(monitors.len(), 1);
        assert_eq!(monitors[0].urn, "urn:li:monitor:test");
        assert_eq!(graph.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn propagates_after_three_failures() {
        let graph = Arc::new(FlakyGraph {
            failures: 3,
            calls: AtomicU32::new(0),
            payload: search_payload(),
        });
        let fetcher = MonitorFetcher::new(graph.clone());

        assert!(fetcher.fetch_monitors().await.is_err());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn incomplete_response_yields_empty_list() {
        let graph = Arc::new(FlakyGraph {
            failures: 0,
            calls: AtomicU32::new(0),
            payload: json!({ "unexpected": {} }),
        });
        let fetcher = MonitorFetcher::new(graph);

        let monitors = fetcher.fetch_monitors().await.unwrap();
        assert!(monitors.is_empty());
    }
}
