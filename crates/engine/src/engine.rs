//! Evaluator registry and result fan-out.

use std::collections::HashMap;

use tracing::error;

use vigil_core::model::{
    Assertion, AssertionEvaluationContext, AssertionEvaluationParameters,
    AssertionEvaluationResult, AssertionType,
};
use vigil_core::MonitorError;

use crate::evaluator::AssertionEvaluator;
use crate::result::ResultHandler;

/// Dispatches evaluations to the evaluator registered for the assertion
/// type and fans the result out to the configured handlers.
pub struct AssertionEngine {
    evaluators: HashMap<AssertionType, Box<dyn AssertionEvaluator>>,
    result_handlers: Vec<Box<dyn ResultHandler>>,
}

impl AssertionEngine {
    pub fn new(
        evaluators: Vec<Box<dyn AssertionEvaluator>>,
        result_handlers: Vec<Box<dyn ResultHandler>>,
    ) -> Self {
        let evaluators = evaluators
            .into_iter()
            .map(|e| (e.assertion_type(), e))
            .collect();
        Self {
            evaluators,
            result_handlers,
        }
    }

    /// Evaluate an assertion.
    ///
    /// Evaluator failures propagate to the caller. Result handlers run in
    /// registration order unless the context is a dry run; a failing
    /// handler is logged and never masks the evaluation result or stops
    /// later handlers.
    pub async fn evaluate(
        &self,
        assertion: &Assertion,
        parameters: Option<&AssertionEvaluationParameters>,
        context: &AssertionEvaluationContext,
    ) -> Result<AssertionEvaluationResult, MonitorError> {
        let evaluator = self.evaluators.get(&assertion.kind).ok_or_else(|| {
            MonitorError::UnknownAssertionType(assertion.kind.to_string())
        })?;

        let result = evaluator.evaluate(assertion, parameters, context).await?;

        if !context.dry_run {
            for handler in &self.result_handlers {
                if let Err(e) = handler.handle(assertion, parameters, &result, context).await {
                    error!(
                        handler = handler.name(),
                        assertion_urn = %assertion.urn,
                        error = %e,
                        "result handler failed"
                    );
                }
            }
        }

        Ok(result)
    }
}
