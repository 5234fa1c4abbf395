//! GraphQL client for the catalog endpoint.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use vigil_core::config::CatalogConfig;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the endpoint.
    #[error("catalog returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL layer reported errors.
    #[error("GraphQL error: {0}")]
    Response(String),

    /// The response was missing an expected section.
    #[error("incomplete catalog response: {0}")]
    MissingData(String),

    /// A response value did not have the expected shape.
    #[error("failed to parse catalog response: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Http(_) => true,
            CatalogError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// GraphApi trait
// ---------------------------------------------------------------------------

/// Minimal surface of the catalog's GraphQL endpoint.
///
/// The fetcher and the connection provider depend on this trait rather
/// than the concrete client so they can be exercised with mocks.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Execute a GraphQL query and return the `data` payload.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, CatalogError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GraphQL client for the catalog (GMS) endpoint.
///
/// When system client credentials are configured, requests carry the
/// system `Authorization: Basic {id}:{secret}` header pair the catalog
/// expects from internal services.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
}

impl GraphClient {
    pub fn new(config: &CatalogConfig) -> Self {
        let authorization = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) => Some(format!("Basic {}:{}", id, secret)),
            _ => None,
        };
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url(),
            authorization,
        }
    }

    /// Base URL of the catalog, e.g. `http://localhost:8080`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to a catalog path, checking the response status.
    pub(crate) async fn post_json(&self, path: &str, body: &Value) -> Result<Value, CatalogError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.post(&url).json(body);
        if let Some(auth) = &self.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, CatalogError> {
        debug!(base_url = %self.base_url, "executing GraphQL query");

        let body = json!({ "query": query, "variables": variables });
        let mut payload = self.post_json("/api/graphql", &body).await?;

        if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
            return Err(CatalogError::Response(errors.to_string()));
        }

        match payload.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(CatalogError::MissingData("no data in response".to_string())),
        }
    }
}
