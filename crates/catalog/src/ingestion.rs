//! Ingestion-source listing and secret-value lookup.
//!
//! The connection provider reuses ingestion recipes as its source of
//! warehouse credentials, so this module exposes the two catalog calls it
//! needs: one page of ingestion sources (large batch, single call) and
//! secret resolution for `${SECRET}` references inside those recipes.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{CatalogError, GraphApi};
use crate::queries::{GET_SECRET_VALUES_QUERY, LIST_INGESTION_SOURCES_QUERY};

/// Page size for the ingestion-source listing; one page is assumed to
/// cover every configured source.
pub const LIST_INGESTION_SOURCES_BATCH_SIZE: u32 = 10_000;

/// A configured ingestion source as listed by the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionSource {
    pub urn: String,
    /// Platform token, e.g. `snowflake`. Ingestion source types are
    /// assumed to match data platform names.
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub name: Option<String>,
    pub config: IngestionSourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSourceConfig {
    /// The serialized recipe (JSON or YAML text).
    pub recipe: String,
    /// Which executor runs this recipe; CLI-only recipes are excluded
    /// from connection resolution.
    #[serde(default)]
    pub executor_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// List every active ingestion source in one paged call.
pub async fn list_ingestion_sources(
    graph: &dyn GraphApi,
) -> Result<Vec<IngestionSource>, CatalogError> {
    let variables = json!({
        "input": {
            "start": 0,
            "count": LIST_INGESTION_SOURCES_BATCH_SIZE
        }
    });

    let data = graph
        .execute(LIST_INGESTION_SOURCES_QUERY, variables)
        .await?;

    let Some(sources) = data
        .pointer("/listIngestionSources/ingestionSources")
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let mut parsed = Vec::with_capacity(sources.len());
    for source in sources {
        match serde_json::from_value::<IngestionSource>(source.clone()) {
            Ok(s) => parsed.push(s),
            Err(e) => {
                debug!(error = %e, "skipping ingestion source that failed to parse");
            }
        }
    }
    Ok(parsed)
}

/// Resolve secret values by name through the catalog's secret service.
pub async fn get_secret_values(
    graph: &dyn GraphApi,
    names: &[String],
) -> Result<HashMap<String, String>, CatalogError> {
    if names.is_empty() {
        return Ok(HashMap::new());
    }

    let variables = json!({ "input": { "secrets": names } });
    let data = graph.execute(GET_SECRET_VALUES_QUERY, variables).await?;

    let mut values = HashMap::new();
    if let Some(entries) = data.get("getSecretValues").and_then(Value::as_array) {
        for entry in entries {
            if let (Some(name), Some(value)) = (
                entry.get("name").and_then(Value::as_str),
                entry.get("value").and_then(Value::as_str),
            ) {
                values.insert(name.to_string(), value.to_string());
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedGraph {
        payload: Value,
    }

    #[async_trait]
    impl GraphApi for CannedGraph {
        async fn execute(&self, _query: &str, _variables: Value) -> Result<Value, CatalogError> {
            Ok(self.payload.clone())
        }
    }

    #[tokio::test]
    async fn parses_ingestion_sources() {
        let graph = CannedGraph {
            payload: json!({
                "listIngestionSources": {
                    "ingestionSources": [
                        {
                            "urn": "urn:li:dataHubIngestionSource:snowflake-prod",
                            "type": "snowflake",
                            "name": "snowflake-prod",
                            "config": {
                                "recipe": "{\"source\":{\"type\":\"snowflake\",\"config\":{}}}",
                                "executorId": "default"
                            }
                        },
                        { "urn": "broken" }
                    ]
                }
            }),
        };

        let sources = list_ingestion_sources(&graph).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_type, "snowflake");
        assert_eq!(sources[0].config.executor_id.as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn secret_values_by_name() {
        let graph = CannedGraph {
            payload: json!({
                "getSecretValues": [
                    { "name": "SNOWFLAKE_PASSWORD", "value": "hunter2" }
                ]
            }),
        };

        let values = get_secret_values(&graph, &["SNOWFLAKE_PASSWORD".to_string()])
            .await
            .unwrap();
        assert_eq!(values.get("SNOWFLAKE_PASSWORD").map(String::as_str), Some("hunter2"));
    }
}
