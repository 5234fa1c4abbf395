//! Evaluator for FRESHNESS assertions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use vigil_connection::ConnectionProvider;
use vigil_core::model::{
    Assertion, AssertionEvaluationContext, AssertionEvaluationParameters,
    AssertionEvaluationResult, AssertionType, FreshnessScheduleKind, ValidationWindow,
};
use vigil_core::MonitorError;
use vigil_source::SourceProvider;

use super::params::derive_event_request;
use super::window::{cron_window, fixed_interval_window};
use super::AssertionEvaluator;

/// Evaluates dataset freshness by asking the entity's warehouse for
/// evidence of activity inside a computed validation window.
pub struct FreshnessEvaluator {
    connections: Arc<dyn ConnectionProvider>,
    sources: Arc<dyn SourceProvider>,
}

impl FreshnessEvaluator {
    pub fn new(connections: Arc<dyn ConnectionProvider>, sources: Arc<dyn SourceProvider>) -> Self {
        Self {
            connections,
            sources,
        }
    }

    fn validation_window(&self, assertion: &Assertion) -> Result<ValidationWindow, MonitorError> {
        let freshness = assertion.freshness_assertion.as_ref().ok_or_else(|| {
            MonitorError::MalformedAssertion("missing freshness assertion".to_string())
        })?;

        match freshness.schedule.kind {
            FreshnessScheduleKind::Cron => {
                let cron = freshness.schedule.cron.as_ref().ok_or_else(|| {
                    MonitorError::MalformedAssertion("missing cron schedule".to_string())
                })?;
                cron_window(cron, Utc::now())
            }
            FreshnessScheduleKind::FixedInterval => {
                let interval = freshness.schedule.fixed_interval.ok_or_else(|| {
                    MonitorError::MalformedAssertion("missing fixed interval schedule".to_string())
                })?;
                fixed_interval_window(&interval, Utc::now().timestamp_millis())
            }
        }
    }
}

#[async_trait]
impl AssertionEvaluator for FreshnessEvaluator {
    fn assertion_type(&self) -> AssertionType {
        AssertionType::Freshness
    }

    async fn evaluate(
        &self,
        assertion: &Assertion,
        parameters: Option<&AssertionEvaluationParameters>,
        _context: &AssertionEvaluationContext,
    ) -> Result<AssertionEvaluationResult, MonitorError> {
        let connection_urn = assertion.connection_urn.as_deref().ok_or_else(|| {
            MonitorError::MalformedAssertion("missing connection urn".to_string())
        })?;

        let connection = self
            .connections
            .get_connection(connection_urn)
            .await
            .map_err(MonitorError::from)?
            .ok_or_else(|| MonitorError::ConnectionUnavailable(connection_urn.to_string()))?;

        let default_parameters;
        let parameters = match parameters {
            Some(p) => p,
            None => {
                default_parameters = AssertionEvaluationParameters::default_freshness();
                &default_parameters
            }
        };

        let window = self.validation_window(assertion)?;
        let (event_type, source_params) = derive_event_request(parameters)?;

        debug!(
            assertion_urn = %assertion.urn,
            entity_urn = %assertion.entity.urn,
            event_type = %event_type,
            window_start_ms = window.start_ms,
            window_end_ms = window.end_ms,
            "evaluating freshness assertion"
        );

        let source = self
            .sources
            .create_source(connection)
            .map_err(MonitorError::from)?;

        let events = source
            .get_entity_events(&assertion.entity.urn, event_type, &window, &source_params)
            .await
            .map_err(|e| {
                error!(
                    assertion_urn = %assertion.urn,
                    entity_urn = %assertion.entity.urn,
                    event_type = %event_type,
                    error = %e,
                    "failed to retrieve entity events for freshness window"
                );
                MonitorError::from(e)
            })?;

        if events.is_empty() {
            info!(
                assertion_urn = %assertion.urn,
                "no matching events within the window; assertion is failing"
            );
            Ok(AssertionEvaluationResult::failure())
        } else {
            info!(
                assertion_urn = %assertion.urn,
                events = events.len(),
                "found matching events within the window; assertion is passing"
            );
            Ok(AssertionEvaluationResult::success(events))
        }
    }
}
