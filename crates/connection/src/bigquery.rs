//! BigQuery connection: recipe-derived config plus REST clients for the
//! query surface and Cloud Logging (audit log reads).

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ConnectionError;

fn default_log_page_size() -> u32 {
    1000
}

/// Connection coordinates extracted from a BigQuery ingestion recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct BigQueryConfig {
    pub project_id: String,
    /// Pre-issued OAuth bearer token used for both BigQuery and Cloud
    /// Logging calls.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_log_page_size")]
    pub log_page_size: u32,
}

/// A connection to BigQuery. The client is created on first use.
pub struct BigQueryConnection {
    urn: String,
    config: BigQueryConfig,
    client: OnceCell<BigQueryClient>,
}

impl BigQueryConnection {
    pub fn new(urn: impl Into<String>, config: BigQueryConfig) -> Self {
        Self {
            urn: urn.into(),
            config,
            client: OnceCell::new(),
        }
    }

    pub fn urn(&self) -> &str {
        &self.urn
    }

    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    pub async fn client(&self) -> Result<&BigQueryClient, ConnectionError> {
        self.client
            .get_or_try_init(|| async { BigQueryClient::new(self.config.clone()) })
            .await
    }
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// One Cloud Logging entry; only the timestamp is consumed downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 timestamp of the logged operation.
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Option<Vec<QueryRow>>,
    #[serde(default, rename = "jobComplete")]
    job_complete: Option<bool>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    f: Vec<QueryCell>,
}

#[derive(Debug, Deserialize)]
struct QueryCell {
    #[serde(default)]
    v: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<LogEntry>,
}

/// Thin client over the BigQuery `jobs/queries` endpoint and the Cloud
/// Logging `entries:list` endpoint.
pub struct BigQueryClient {
    http: reqwest::Client,
    config: BigQueryConfig,
}

impl BigQueryClient {
    pub fn new(config: BigQueryConfig) -> Result<Self, ConnectionError> {
        if config.project_id.is_empty() {
            return Err(ConnectionError::Config(
                "bigquery project_id is empty".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            config,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    pub fn log_page_size(&self) -> u32 {
        self.config.log_page_size
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ConnectionError> {
        let response = self.authorized(self.http.post(url)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Run a query and return its rows as string cells.
    pub async fn query(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>, ConnectionError> {
        debug!(sql, "submitting bigquery query");

        let url = format!(
            "https://bigquery.googleapis.com/bigquery/v2/projects/{}/queries",
            self.config.project_id
        );
        let body = serde_json::json!({
            "query": sql,
            "useLegacySql": false,
            "timeoutMs": 60_000
        });

        let payload = self.post_json(&url, &body).await?;
        let parsed: QueryResponse = serde_json::from_value(payload)
            .map_err(|e| ConnectionError::Statement(format!("unexpected query response: {e}")))?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            return Err(ConnectionError::Statement(format!("query errors: {errors:?}")));
        }
        if parsed.job_complete == Some(false) {
            return Err(ConnectionError::Statement(
                "query did not complete within the request timeout".to_string(),
            ));
        }

        let rows = parsed
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.f
                    .into_iter()
                    .map(|cell| match cell.v {
                        Some(Value::String(s)) => Some(s),
                        Some(Value::Null) | None => None,
                        Some(other) => Some(other.to_string()),
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    /// List audit-log entries matching a Cloud Logging filter.
    pub async fn list_log_entries(&self, filter: &str) -> Result<Vec<LogEntry>, ConnectionError> {
        debug!(filter, "listing bigquery audit log entries");

        let body = serde_json::json!({
            "resourceNames": [format!("projects/{}", self.config.project_id)],
            "filter": filter,
            "orderBy": "timestamp desc",
            "pageSize": self.config.log_page_size
        });

        let payload = self
            .post_json("https://logging.googleapis.com/v2/entries:list", &body)
            .await?;
        let parsed: ListEntriesResponse = serde_json::from_value(payload)
            .map_err(|e| ConnectionError::Statement(format!("unexpected log response: {e}")))?;
        Ok(parsed.entries)
    }
}
