//! [`AssertionScheduler`] — owns the cron bindings and the worker pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use vigil_core::config::MonitorConfig;
use vigil_core::model::{
    Assertion, AssertionEvaluationContext, AssertionEvaluationParameters, CronSchedule,
};
use vigil_core::MonitorError;

use super::cron::{next_fire_after, parse_schedule, parse_timezone};
use super::entry::{JobId, ScheduledJob};
use super::pool::WorkerPool;
use crate::engine::AssertionEngine;

struct JobBinding {
    descriptor: ScheduledJob,
    handle: JoinHandle<()>,
}

/// Schedules assertion evaluations on cron triggers and dispatches them
/// to a bounded worker pool.
///
/// The scheduler is the containment boundary of the evaluation path: an
/// evaluation that fails or times out is logged with the assertion urn
/// and never crashes the trigger task or affects other jobs.
pub struct AssertionScheduler {
    engine: Arc<AssertionEngine>,
    pool: Arc<WorkerPool>,
    jobs: tokio::sync::Mutex<HashMap<String, Vec<JobBinding>>>,
    default_schedule: String,
    default_timezone: String,
    evaluation_timeout: Duration,
}

impl AssertionScheduler {
    pub fn new(engine: Arc<AssertionEngine>, config: &MonitorConfig) -> Self {
        Self {
            engine,
            pool: Arc::new(WorkerPool::new(config.worker_pool_size)),
            jobs: tokio::sync::Mutex::new(HashMap::new()),
            default_schedule: config.default_schedule.clone(),
            default_timezone: config.default_timezone.clone(),
            evaluation_timeout: config.evaluation_timeout(),
        }
    }

    /// Schedule an assertion, replacing any jobs already registered for
    /// its urn. Returns the new job id.
    pub async fn add_assertion(
        &self,
        assertion: &Assertion,
        parameters: Option<&AssertionEvaluationParameters>,
        schedule: Option<&CronSchedule>,
        context: &AssertionEvaluationContext,
    ) -> Result<JobId, MonitorError> {
        let cron_expr = schedule
            .map(|s| s.cron.clone())
            .unwrap_or_else(|| self.default_schedule.clone());
        let timezone = schedule
            .map(|s| s.timezone.clone())
            .unwrap_or_else(|| self.default_timezone.clone());

        // Validate up front so a bad schedule fails loudly instead of
        // producing a silent no-op job.
        let cron = parse_schedule(&cron_expr)?;
        let tz = parse_timezone(&timezone)?;

        // At most one binding per assertion urn.
        self.remove_assertion(assertion).await;

        let id = Uuid::new_v4();
        let descriptor = ScheduledJob {
            id,
            assertion_urn: assertion.urn.clone(),
            cron: cron_expr.clone(),
            timezone: timezone.clone(),
        };

        debug!(
            assertion_urn = %assertion.urn,
            cron = %cron_expr,
            timezone = %timezone,
            job_id = %id,
            "scheduling assertion evaluation job"
        );

        let engine = self.engine.clone();
        let pool = self.pool.clone();
        let assertion = assertion.clone();
        let parameters = parameters.cloned();
        let context = *context;
        let evaluation_timeout = self.evaluation_timeout;

        let handle = tokio::spawn(async move {
            loop {
                let now = Utc::now().with_timezone(&tz);
                let Some(next) = next_fire_after(&cron, &now) else {
                    warn!(
                        assertion_urn = %assertion.urn,
                        "cron schedule has no upcoming fires; stopping job"
                    );
                    break;
                };
                let delay = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(delay).await;

                let engine = engine.clone();
                let assertion = assertion.clone();
                let parameters = parameters.clone();
                let _worker = pool
                    .submit(async move {
                        run_evaluation(engine, assertion, parameters, context, evaluation_timeout)
                            .await;
                    })
                    .await;
            }
        });

        self.jobs
            .lock()
            .await
            .entry(descriptor.assertion_urn.clone())
            .or_default()
            .push(JobBinding { descriptor, handle });

        Ok(id)
    }

    /// Unregister every job bound to the assertion's urn.
    pub async fn remove_assertion(&self, assertion: &Assertion) {
        let removed = self.jobs.lock().await.remove(&assertion.urn);
        if let Some(bindings) = removed {
            for binding in &bindings {
                binding.handle.abort();
            }
            debug!(
                assertion_urn = %assertion.urn,
                jobs = bindings.len(),
                "unscheduled assertion jobs"
            );
        }
    }

    /// Descriptors of the jobs bound to an assertion urn.
    pub async fn jobs_for_assertion(&self, assertion_urn: &str) -> Vec<ScheduledJob> {
        self.jobs
            .lock()
            .await
            .get(assertion_urn)
            .map(|bindings| bindings.iter().map(|b| b.descriptor.clone()).collect())
            .unwrap_or_default()
    }

    /// Total number of scheduled jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.lock().await.values().map(Vec::len).sum()
    }

    /// Free slots in the worker pool.
    pub fn available_workers(&self) -> usize {
        self.pool.available()
    }

    /// Abort every trigger task. In-flight evaluations run to completion
    /// on the worker pool.
    pub async fn shutdown(&self) {
        let mut jobs = self.jobs.lock().await;
        for bindings in jobs.values() {
            for binding in bindings {
                binding.handle.abort();
            }
        }
        jobs.clear();
    }
}

/// One wrapped evaluation: capped by the wall-clock timeout, with every
/// failure logged and swallowed.
pub(crate) async fn run_evaluation(
    engine: Arc<AssertionEngine>,
    assertion: Assertion,
    parameters: Option<AssertionEvaluationParameters>,
    context: AssertionEvaluationContext,
    cap: Duration,
) {
    debug!(
        assertion_urn = %assertion.urn,
        "running scheduled evaluation"
    );

    match tokio::time::timeout(
        cap,
        engine.evaluate(&assertion, parameters.as_ref(), &context),
    )
    .await
    {
        Ok(Ok(result)) => {
            debug!(
                assertion_urn = %assertion.urn,
                result = %result.kind,
                "scheduled evaluation complete"
            );
        }
        Ok(Err(e)) => {
            error!(
                assertion_urn = %assertion.urn,
                error = %e,
                "failed to evaluate scheduled assertion; no assertion result will be produced, \
                 which could indicate missing data"
            );
        }
        Err(_) => {
            let e = MonitorError::EvaluationTimeout(cap.as_secs());
            error!(
                assertion_urn = %assertion.urn,
                error = %e,
                "scheduled evaluation exceeded its wall-clock cap"
            );
        }
    }
}
