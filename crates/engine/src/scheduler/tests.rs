use std::sync::Arc;
use std::time::Duration;

use vigil_core::config::MonitorConfig;
use vigil_core::model::{
    Assertion, AssertionEntity, AssertionEvaluationContext, AssertionType, CronSchedule,
};

use super::core::run_evaluation;
use super::AssertionScheduler;
use crate::engine::AssertionEngine;

fn test_config() -> MonitorConfig {
    MonitorConfig {
        refresh_interval_minutes: 1,
        worker_pool_size: 4,
        evaluation_timeout_secs: 30,
        default_schedule: "0 * * * *".to_string(),
        default_timezone: "America/Los_Angeles".to_string(),
        list_monitors_batch_size: 1000,
    }
}

fn scheduler() -> AssertionScheduler {
    // No evaluators: every dispatched evaluation fails with
    // UnknownAssertionType, which the scheduler wrapper must swallow.
    let engine = Arc::new(AssertionEngine::new(Vec::new(), Vec::new()));
    AssertionScheduler::new(engine, &test_config())
}

fn assertion(urn: &str) -> Assertion {
    Assertion {
        urn: urn.to_string(),
        kind: AssertionType::Dataset,
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

fn schedule(cron: &str) -> CronSchedule {
    CronSchedule {
        cron: cron.to_string(),
        timezone: "America/Los_Angeles".to_string(),
    }
}

#[tokio::test]
async fn add_assertion_registers_one_job() {
    let scheduler = scheduler();
    let a = assertion("urn:li:assertion:a");

    let id = scheduler
        .add_assertion(&a, None, Some(&schedule("1 2 3 4 5")), &Default::default())
        .await
        .unwrap();

    let jobs = scheduler.jobs_for_assertion(&a.urn).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, id);
    assert_eq!(jobs[0].cron, "1 2 3 4 5");
    assert_eq!(jobs[0].timezone, "America/Los_Angeles");

    scheduler.shutdown().await;
}

#[tokio::test]
async fn re_adding_replaces_the_previous_binding() {
    let scheduler = scheduler();
    let a = assertion("urn:li:assertion:a");

    let first = scheduler
        .add_assertion(&a, None, Some(&schedule("0 * * * *")), &Default::default())
        .await
        .unwrap();
    let second = scheduler
        .add_assertion(&a, None, Some(&schedule("30 2 * * *")), &Default::default())
        .await
        .unwrap();
    assert_ne!(first, second);

    let jobs = scheduler.jobs_for_assertion(&a.urn).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, second);
    assert_eq!(jobs[0].cron, "30 2 * * *");

    scheduler.shutdown().await;
}

#[tokio::test]
async fn remove_assertion_unschedules_every_job() {
    let scheduler = scheduler();
    let a = assertion("urn:li:assertion:a");
    let b = assertion("urn:li:assertion:b");

    scheduler
        .add_assertion(&a, None, Some(&schedule("0 * * * *")), &Default::default())
        .await
        .unwrap();
    scheduler
        .add_assertion(&b, None, Some(&schedule("0 * * * *")), &Default::default())
        .await
        .unwrap();
    assert_eq!(scheduler.job_count().await, 2);

    scheduler.remove_assertion(&a).await;
    assert!(scheduler.jobs_for_assertion(&a.urn).await.is_empty());
    assert_eq!(scheduler.jobs_for_assertion(&b.urn).await.len(), 1);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn missing_schedule_falls_back_to_defaults() {
    let scheduler = scheduler();
    let a = assertion("urn:li:assertion:a");

    scheduler
        .add_assertion(&a, None, None, &Default::default())
        .await
        .unwrap();

    let jobs = scheduler.jobs_for_assertion(&a.urn).await;
    assert_eq!(jobs[0].cron, "0 * * * *");
    assert_eq!(jobs[0].timezone, "America/Los_Angeles");

    scheduler.shutdown().await;
}

#[tokio::test]
async fn invalid_schedules_are_rejected() {
    let scheduler = scheduler();
    let a = assertion("urn:li:assertion:a");

    let bad_cron = scheduler
        .add_assertion(&a, None, Some(&schedule("bad cron")), &Default::default())
        .await;
    assert!(bad_cron.is_err());

    let bad_tz = CronSchedule {
        cron: "0 * * * *".to_string(),
        timezone: "Nowhere/Fake".to_string(),
    };
    let bad_tz = scheduler
        .add_assertion(&a, None, Some(&bad_tz), &Default::default())
        .await;
    assert!(bad_tz.is_err());

    assert_eq!(scheduler.job_count().await, 0);
}

#[tokio::test]
async fn failed_evaluations_are_contained() {
    // The engine has no evaluators, so the evaluation fails with
    // UnknownAssertionType; the wrapper must swallow it.
    let engine = Arc::new(AssertionEngine::new(Vec::new(), Vec::new()));
    run_evaluation(
        engine,
        assertion("urn:li:assertion:a"),
        None,
        AssertionEvaluationContext::default(),
        Duration::from_secs(5),
    )
    .await;
}
