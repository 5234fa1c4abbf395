//! Snowflake connection: recipe-derived config plus a SQL API client.

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ConnectionError;

/// Connection coordinates extracted from a Snowflake ingestion recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    /// Account identifier, e.g. `xy12345.us-east-1`.
    pub account_id: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A connection to Snowflake. The client is created on first use.
pub struct SnowflakeConnection {
    urn: String,
    config: SnowflakeConfig,
    client: OnceCell<SnowflakeClient>,
}

impl SnowflakeConnection {
    pub fn new(urn: impl Into<String>, config: SnowflakeConfig) -> Self {
        Self {
            urn: urn.into(),
            config,
            client: OnceCell::new(),
        }
    }

    pub fn urn(&self) -> &str {
        &self.urn
    }

    pub fn config(&self) -> &SnowflakeConfig {
        &self.config
    }

    /// The SQL API client, constructed lazily and memoized.
    pub async fn client(&self) -> Result<&SnowflakeClient, ConnectionError> {
        self.client
            .get_or_try_init(|| async { SnowflakeClient::new(self.config.clone()) })
            .await
    }
}

// ---------------------------------------------------------------------------
// SQL API client
// ---------------------------------------------------------------------------

/// Statement response subset we consume.
#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(default)]
    data: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Thin client for the Snowflake SQL API (`/api/v2/statements`).
///
/// Every statement runs with the session parameter `TIMEZONE=UTC` so
/// comparisons against timezone-typed columns are always performed in
/// UTC. Rows come back as string cells; interpretation is left to the
/// caller.
pub struct SnowflakeClient {
    http: reqwest::Client,
    config: SnowflakeConfig,
    base_url: String,
}

impl SnowflakeClient {
    pub fn new(config: SnowflakeConfig) -> Result<Self, ConnectionError> {
        if config.account_id.is_empty() {
            return Err(ConnectionError::Config(
                "snowflake account_id is empty".to_string(),
            ));
        }
        let base_url = format!("https://{}.snowflakecomputing.com", config.account_id);
        Ok(Self {
            http: reqwest::Client::new(),
            config,
            base_url,
        })
    }

    /// Submit one statement and return its rows as string cells.
    pub async fn fetch_rows(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>, ConnectionError> {
        debug!(sql, "submitting snowflake statement");

        let mut body = serde_json::json!({
            "statement": sql,
            "timeout": 60,
            "parameters": { "TIMEZONE": "UTC" }
        });
        if let Some(warehouse) = &self.config.warehouse {
            body["warehouse"] = serde_json::Value::String(warehouse.clone());
        }
        if let Some(role) = &self.config.role {
            body["role"] = serde_json::Value::String(role.clone());
        }

        let response = self
            .http
            .post(format!("{}/api/v2/statements", self.base_url))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: StatementResponse = response.json().await?;
        if let Some(code) = parsed.code.as_deref() {
            // "090001" is statement success in the SQL API.
            if code != "090001" {
                return Err(ConnectionError::Statement(format!(
                    "code {}: {}",
                    code,
                    parsed.message.unwrap_or_default()
                )));
            }
        }

        Ok(parsed.data.unwrap_or_default())
    }
}
