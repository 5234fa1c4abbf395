//! Explicit wiring of the monitor service.
//!
//! Every collaborator is constructed here and handed down as an
//! explicit dependency; there are no process-global singletons.

use std::sync::Arc;

use tracing::info;

use vigil_catalog::{GraphClient, MonitorFetcher};
use vigil_connection::{
    CatalogSecretStore, EnvSecretStore, IngestionSourceConnectionProvider, SecretStore,
};
use vigil_core::Config;
use vigil_engine::{
    AssertionEngine, AssertionScheduler, FreshnessEvaluator, MonitorManager,
    RunEventResultHandler,
};
use vigil_source::DefaultSourceProvider;

/// The assembled monitor service.
pub struct Service {
    pub scheduler: Arc<AssertionScheduler>,
    pub manager: Arc<MonitorManager>,
}

impl Service {
    /// Build the full dependency graph from configuration.
    pub fn from_config(config: &Config) -> Self {
        let graph = Arc::new(GraphClient::new(&config.catalog));

        let fetcher = MonitorFetcher::new(graph.clone())
            .with_batch_size(config.monitors.list_monitors_batch_size);

        // Secrets referenced by ingestion recipes resolve from the
        // process environment first, then through the catalog.
        let secret_stores: Vec<Arc<dyn SecretStore>> = vec![
            Arc::new(EnvSecretStore),
            Arc::new(CatalogSecretStore::new(graph.clone())),
        ];
        let connection_provider = Arc::new(IngestionSourceConnectionProvider::new(
            graph.clone(),
            secret_stores,
        ));

        let freshness_evaluator =
            FreshnessEvaluator::new(connection_provider, Arc::new(DefaultSourceProvider));
        let run_event_handler = RunEventResultHandler::new(graph);

        let engine = Arc::new(AssertionEngine::new(
            vec![Box::new(freshness_evaluator)],
            vec![Box::new(run_event_handler)],
        ));

        let scheduler = Arc::new(AssertionScheduler::new(engine, &config.monitors));
        let manager = Arc::new(MonitorManager::new(
            fetcher,
            scheduler.clone(),
            config.monitors.refresh_interval(),
        ));

        info!(
            catalog = %config.catalog.base_url(),
            refresh_interval_minutes = config.monitors.refresh_interval_minutes,
            worker_pool_size = config.monitors.worker_pool_size,
            "monitor service assembled"
        );

        Self { scheduler, manager }
    }
}
