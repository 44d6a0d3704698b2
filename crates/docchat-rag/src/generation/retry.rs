//! Bounded retry with exponential backoff for generation service calls

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// How often and how patiently a request is retried
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// A failed attempt, tagged with whether another attempt may succeed
#[derive(Debug)]
pub struct AttemptError {
    pub error: Error,
    pub retryable: bool,
}

impl AttemptError {
    /// Fail without retrying
    pub fn fatal(error: Error) -> Self {
        Self {
            error,
            retryable: false,
        }
    }

    /// Classify a non-success HTTP status: 429 and 5xx are transient
    pub fn from_status(status: reqwest::StatusCode, body: &str, what: &str) -> Self {
        Self {
            error: Error::external(format!("{} failed: HTTP {} - {}", what, status, body)),
            retryable: status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        }
    }
}

impl From<Error> for AttemptError {
    fn from(error: Error) -> Self {
        let retryable = error.is_retryable();
        Self { error, retryable }
    }
}

impl RetryPolicy {
    /// Build from the generation service configuration
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails fatally or runs out of retries
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        failure.error
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = quick(2)
            .run(move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AttemptError::from(Error::external("unavailable")))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = quick(1)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::from_status(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    "busy",
                    "Generation",
                ))
            })
            .await;

        assert!(matches!(result, Err(Error::ExternalService(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = quick(3)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::from_status(
                    reqwest::StatusCode::UNAUTHORIZED,
                    "bad key",
                    "Generation",
                ))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
