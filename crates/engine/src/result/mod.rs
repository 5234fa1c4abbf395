//! Result handlers invoked after each (non dry-run) evaluation.

pub mod run_event;

use async_trait::async_trait;

use vigil_core::model::{
    Assertion, AssertionEvaluationContext, AssertionEvaluationParameters,
    AssertionEvaluationResult,
};
use vigil_core::MonitorError;

pub use run_event::RunEventResultHandler;

/// Consumes one evaluation outcome. Handlers run in registration order;
/// a failing handler never affects the others.
#[async_trait]
pub trait ResultHandler: Send + Sync {
    /// Human-readable handler name for logs.
    fn name(&self) -> &str;

    async fn handle(
        &self,
        assertion: &Assertion,
        parameters: Option<&AssertionEvaluationParameters>,
        result: &AssertionEvaluationResult,
        context: &AssertionEvaluationContext,
    ) -> Result<(), MonitorError>;
}
