//! Emits an assertion run event back to the catalog for each outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use vigil_catalog::emitter::{
    AspectEmitter, AssertionRunEvent, AssertionRunResult, SystemMetadata, RUN_STATUS_COMPLETE,
};
use vigil_core::model::{
    Assertion, AssertionEvaluationContext, AssertionEvaluationParameters,
    AssertionEvaluationResult,
};
use vigil_core::MonitorError;

use super::ResultHandler;

/// Builds the run-event aspect for an outcome and emits it.
///
/// Emission is best-effort: a failed emit is logged and swallowed, and
/// the evaluation result is not retried here. Run events are keyed by
/// emit time, so a late emit from a superseded job binding is harmless.
pub struct RunEventResultHandler {
    emitter: Arc<dyn AspectEmitter>,
}

impl RunEventResultHandler {
    pub fn new(emitter: Arc<dyn AspectEmitter>) -> Self {
        Self { emitter }
    }
}

#[async_trait]
impl ResultHandler for RunEventResultHandler {
    fn name(&self) -> &str {
        "assertion-run-event"
    }

    async fn handle(
        &self,
        assertion: &Assertion,
        _parameters: Option<&AssertionEvaluationParameters>,
        result: &AssertionEvaluationResult,
        _context: &AssertionEvaluationContext,
    ) -> Result<(), MonitorError> {
        let now_ms = Utc::now().timestamp_millis();
        let run_id = format!("native-{}-{}", assertion.urn, now_ms);

        let event = AssertionRunEvent {
            timestamp_millis: now_ms,
            run_id: run_id.clone(),
            assertee_urn: assertion.entity.urn.clone(),
            status: RUN_STATUS_COMPLETE.to_string(),
            assertion_urn: assertion.urn.clone(),
            result: AssertionRunResult::from_outcome(result.kind, &result.events),
        };
        let metadata = SystemMetadata {
            run_id,
            last_observed: now_ms,
        };

        match self.emitter.emit_run_event(&event, &metadata).await {
            Ok(()) => {
                info!(
                    assertion_urn = %assertion.urn,
                    entity_urn = %assertion.entity.urn,
                    result = %result.kind,
                    "produced assertion run event"
                );
            }
            Err(e) => {
                // Swallowed: results are simply not viewable upstream for
                // this run.
                let e = MonitorError::CatalogEmitFailed(e.to_string());
                error!(
                    assertion_urn = %assertion.urn,
                    entity_urn = %assertion.entity.urn,
                    result = %result.kind,
                    error = %e,
                    "failed to produce assertion run event"
                );
            }
        }

        Ok(())
    }
}
