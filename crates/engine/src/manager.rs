//! Periodic reconciliation of the scheduled set with the catalog.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use vigil_catalog::MonitorFetcher;
use vigil_core::model::{AssertionEvaluationSpec, Monitor, MonitorType};

use crate::scheduler::AssertionScheduler;

/// Fetches the monitor list on a fixed interval and (re)registers every
/// contained assertion evaluation spec with the scheduler.
///
/// Monitors that vanish upstream are currently left scheduled until the
/// process restarts; `AssertionScheduler::remove_assertion` is the hook
/// for a future reconcile step that diffs successive refreshes.
pub struct MonitorManager {
    fetcher: MonitorFetcher,
    scheduler: Arc<AssertionScheduler>,
    refresh_interval: Duration,
}

impl MonitorManager {
    pub fn new(
        fetcher: MonitorFetcher,
        scheduler: Arc<AssertionScheduler>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            scheduler,
            refresh_interval,
        }
    }

    /// Run the refresh loop until the task is dropped. The first refresh
    /// happens immediately.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.refresh_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.refresh_monitors().await;
        }
    }

    /// Refresh the monitor set by fetching it from the catalog.
    pub async fn refresh_monitors(&self) {
        info!("refreshing the set of monitors");

        let monitors = match self.fetcher.fetch_monitors().await {
            Ok(monitors) => monitors,
            Err(e) => {
                error!(error = %e, "failed to fetch monitors; keeping the current schedule");
                return;
            }
        };

        let count = monitors.len();
        for monitor in &monitors {
            self.start_monitor(monitor).await;
        }

        info!(monitors = count, "monitor refresh complete");
    }

    async fn start_monitor(&self, monitor: &Monitor) {
        match monitor.kind {
            MonitorType::Assertion => {
                let specs = monitor
                    .assertion_monitor
                    .as_ref()
                    .map(|am| am.assertions.as_slice())
                    .unwrap_or_default();
                for spec in specs {
                    self.schedule_assertion_evaluation(spec).await;
                }
            }
        }
    }

    async fn schedule_assertion_evaluation(&self, spec: &AssertionEvaluationSpec) {
        self.scheduler.remove_assertion(&spec.assertion).await;
        if let Err(e) = self
            .scheduler
            .add_assertion(
                &spec.assertion,
                spec.parameters.as_ref(),
                Some(&spec.schedule),
                &Default::default(),
            )
            .await
        {
            error!(
                assertion_urn = %spec.assertion.urn,
                error = %e,
                "failed to schedule assertion evaluation"
            );
        }
    }
}
