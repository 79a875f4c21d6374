use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{AdapterError, AdapterResult};

/// Exponential backoff with jitter for idempotent upstream reads.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);

        let millis = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..1.5)
        } else {
            capped
        };

        Duration::from_millis(millis as u64)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> AdapterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = AdapterResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = self.calculate_backoff(attempt - 1);
                debug!(
                    attempt = attempt + 1,
                    max_attempts = self.max_attempts,
                    ?backoff,
                    "Retrying upstream call"
                );
                tokio::time::sleep(backoff).await;
            }

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Upstream call failed"
                    );
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AdapterError::Connection("no attempt was made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = fast(3)
            .execute(|| {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(AdapterError::request_failed(503, "warming up"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = fast(3)
            .execute(|| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AdapterError::Timeout("slow".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(AdapterError::Timeout(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = fast(3)
            .execute(|| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AdapterError::request_failed(401, "bad key"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_growth_is_capped() {
        let policy = RetryPolicy::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(300))
            .with_multiplier(2.0)
            .with_jitter(false);

        assert_eq!(policy.calculate_backoff(0).as_millis(), 100);
        assert_eq!(policy.calculate_backoff(1).as_millis(), 200);
        assert_eq!(policy.calculate_backoff(2).as_millis(), 300);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }
}
