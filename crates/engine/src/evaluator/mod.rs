//! Assertion evaluators.

pub mod freshness;
pub mod params;
pub mod window;

use async_trait::async_trait;

use vigil_core::model::{
    Assertion, AssertionEvaluationContext, AssertionEvaluationParameters,
    AssertionEvaluationResult, AssertionType,
};
use vigil_core::MonitorError;

pub use freshness::FreshnessEvaluator;

/// One evaluation strategy, keyed by the assertion type it handles.
#[async_trait]
pub trait AssertionEvaluator: Send + Sync {
    /// The assertion type this evaluator handles.
    fn assertion_type(&self) -> AssertionType;

    /// Evaluate the assertion, producing a pass/fail result.
    async fn evaluate(
        &self,
        assertion: &Assertion,
        parameters: Option<&AssertionEvaluationParameters>,
        context: &AssertionEvaluationContext,
    ) -> Result<AssertionEvaluationResult, MonitorError>;
}
