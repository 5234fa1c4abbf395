//! Secret stores used during recipe resolution.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vigil_catalog::client::GraphApi;
use vigil_catalog::ingestion::get_secret_values;

use crate::error::ConnectionError;

/// A named source of secret values. Stores are consulted in registration
/// order; the first store that knows a name wins.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Human-readable store name for logs.
    fn store_name(&self) -> &str;

    /// Resolve as many of the requested names as this store knows.
    /// Unknown names are simply absent from the result.
    async fn resolve(&self, names: &[String]) -> Result<HashMap<String, String>, ConnectionError>;
}

/// Resolves secrets from process environment variables.
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    fn store_name(&self) -> &str {
        "env"
    }

    async fn resolve(&self, names: &[String]) -> Result<HashMap<String, String>, ConnectionError> {
        let mut values = HashMap::new();
        for name in names {
            if let Ok(value) = std::env::var(name) {
                values.insert(name.clone(), value);
            }
        }
        Ok(values)
    }
}

/// Resolves secrets through the catalog's secret service.
pub struct CatalogSecretStore {
    graph: Arc<dyn GraphApi>,
}

impl CatalogSecretStore {
    pub fn new(graph: Arc<dyn GraphApi>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl SecretStore for CatalogSecretStore {
    fn store_name(&self) -> &str {
        "catalog"
    }

    async fn resolve(&self, names: &[String]) -> Result<HashMap<String, String>, ConnectionError> {
        let values = get_secret_values(self.graph.as_ref(), names).await?;
        debug!(
            requested = names.len(),
            resolved = values.len(),
            "resolved secrets from catalog"
        );
        Ok(values)
    }
}
