use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

/// The one retry budget applied around an unreliable call.
///
/// Attempt `n` (1-based) that fails is followed by a sleep of
/// `base_delay * n`, so the defaults wait 2s then 4s. Every attempt is bounded
/// by `attempt_timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: AttemptError<E>,
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds or the budget is spent.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = match timeout(self.attempt_timeout, operation(attempt)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => AttemptError::Failed(e),
                Err(_) => AttemptError::Timeout(self.attempt_timeout),
            };

            metrics::counter!("evaluator_attempt_failures_total", "call" => label.to_string())
                .increment(1);

            if attempt >= max_attempts {
                tracing::error!(call = label, attempts = attempt, error = %outcome, "All retry attempts failed");
                return Err(RetryExhausted {
                    attempts: attempt,
                    last: outcome,
                });
            }

            let delay = self.delay_after(attempt);
            tracing::warn!(
                call = label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %outcome,
                "Attempt failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_short_circuits() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let value = policy()
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>("ok") }
            })
            .await
            .unwrap();
        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_linear_backoff() {
        let start = Instant::now();
        let value = policy()
            .run("test", |attempt| async move {
                if attempt < 3 {
                    Err(format!("attempt {attempt} failed"))
                } else {
                    Ok(attempt)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "slept {elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "slept {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_error() {
        let calls = AtomicU32::new(0);
        let err = policy()
            .run("test", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err::<(), _>(format!("failure {attempt}")) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.to_string(), "gave up after 3 attempts: failure 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_attempt_times_out() {
        let err = RetryPolicy {
            max_attempts: 2,
            ..policy()
        }
        .run("test", |_| std::future::pending::<Result<(), String>>())
        .await
        .unwrap_err();
        assert_eq!(err.attempts, 2);
        assert!(matches!(err.last, AttemptError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy {
            max_attempts: 0,
            base_delay: Duration::ZERO,
            attempt_timeout: Duration::from_secs(1),
        }
        .run("test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("nope") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
