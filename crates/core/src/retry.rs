//! Retry with exponential backoff for transport-level calls.
//!
//! The catalog fetcher and the warehouse source adapters share the same
//! envelope: three attempts, delay doubling from 4s and capped at 10s.
//! Only errors the caller classifies as retryable are retried; config
//! errors fail fast.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff parameters for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts (including the first).
    pub attempts: u32,
    /// Multiplier applied to the delay after every failed attempt.
    pub factor: u32,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            factor: 2,
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Run `op` up to `policy.attempts` times, sleeping between attempts.
///
/// `is_retryable` decides whether a given error is worth another attempt;
/// a non-retryable error is returned immediately. The final error is
/// returned unchanged once attempts are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = policy.min_delay;

    for attempt in 1..=policy.attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.attempts && is_retryable(&e) => {
                warn!(
                    label,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * policy.factor).min(policy.max_delay);
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop always returns within the final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient={})", self.transient)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = retry_with_backoff(
            RetryPolicy::default(),
            "test",
            |_e: &TestError| true,
            move || {
                let calls = calls_clone.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError { transient: true })
                    } else {
                        Ok(42u32)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<u32, TestError> = retry_with_backoff(
            RetryPolicy::default(),
            "test",
            |_e| true,
            move || {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError { transient: true })
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<u32, TestError> = retry_with_backoff(
            RetryPolicy::default(),
            "test",
            |e: &TestError| e.transient,
            move || {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError { transient: false })
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
