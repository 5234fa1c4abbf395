//! Engine dispatch and result-handler fan-out behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vigil_core::model::{
    Assertion, AssertionEntity, AssertionEvaluationContext, AssertionEvaluationParameters,
    AssertionEvaluationResult, AssertionType, EntityEvent, EntityEventType,
};
use vigil_core::MonitorError;
use vigil_engine::evaluator::AssertionEvaluator;
use vigil_engine::result::ResultHandler;
use vigil_engine::AssertionEngine;

fn assertion(kind: AssertionType) -> Assertion {
    Assertion {
        urn: "urn:li:assertion:test".to_string(),
        kind,
        entity: AssertionEntity {
            urn: "urn:li:dataset:test".to_string(),
            platform_urn: "urn:li:dataPlatform:snowflake".to_string(),
            platform_instance: None,
            sub_types: None,
        },
        connection_urn: Some("urn:li:dataPlatform:snowflake".to_string()),
        freshness_assertion: None,
    }
}

struct StubEvaluator {
    kind: AssertionType,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AssertionEvaluator for StubEvaluator {
    fn assertion_type(&self) -> AssertionType {
        self.kind
    }

    async fn evaluate(
        &self,
        _assertion: &Assertion,
        _parameters: Option<&AssertionEvaluationParameters>,
        _context: &AssertionEvaluationContext,
    ) -> Result<AssertionEvaluationResult, MonitorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AssertionEvaluationResult::success(vec![EntityEvent::new(
            EntityEventType::InformationSchemaUpdate,
            1_690_000_000_000,
        )]))
    }
}

struct RecordingHandler {
    name: String,
    order: Arc<Mutex<Vec<String>>>,
    should_fail: bool,
}

#[async_trait]
impl ResultHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(
        &self,
        _assertion: &Assertion,
        _parameters: Option<&AssertionEvaluationParameters>,
        _result: &AssertionEvaluationResult,
        _context: &AssertionEvaluationContext,
    ) -> Result<(), MonitorError> {
        self.order.lock().unwrap().push(self.name.clone());
        if self.should_fail {
            Err(MonitorError::CatalogEmitFailed("handler boom".to_string()))
        } else {
            Ok(())
        }
    }
}

fn engine_with_handlers(
    calls: Arc<AtomicUsize>,
    order: Arc<Mutex<Vec<String>>>,
    first_fails: bool,
) -> AssertionEngine {
    AssertionEngine::new(
        vec![Box::new(StubEvaluator {
            kind: AssertionType::Freshness,
            calls,
        })],
        vec![
            Box::new(RecordingHandler {
                name: "first".to_string(),
                order: order.clone(),
                should_fail: first_fails,
            }),
            Box::new(RecordingHandler {
                name: "second".to_string(),
                order,
                should_fail: false,
            }),
        ],
    )
}

#[tokio::test]
async fn dispatches_to_the_registered_evaluator() {
    let calls = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_handlers(calls.clone(), order.clone(), false);

    let result = engine
        .evaluate(
            &assertion(AssertionType::Freshness),
            None,
            &AssertionEvaluationContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn unknown_assertion_type_fails_fast() {
    let calls = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_handlers(calls.clone(), order.clone(), false);

    let err = engine
        .evaluate(
            &assertion(AssertionType::Dataset),
            None,
            &AssertionEvaluationContext::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MonitorError::UnknownAssertionType(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(order.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dry_run_never_reaches_handlers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_handlers(calls.clone(), order.clone(), false);

    let result = engine
        .evaluate(
            &assertion(AssertionType::Freshness),
            None,
            &AssertionEvaluationContext { dry_run: true },
        )
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(order.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failing_handler_does_not_block_later_handlers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_handlers(calls, order.clone(), true);

    let result = engine
        .evaluate(
            &assertion(AssertionType::Freshness),
            None,
            &AssertionEvaluationContext::default(),
        )
        .await;

    // The handler failure is swallowed and the result survives.
    assert!(result.is_ok());
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}
