use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::CollaboratorError;
use crate::domain::models::config::RetryConfig;

/// Retry policy for collaborator calls
///
/// Transient errors (rate limit, 5xx, timeout, network) are retried with
/// exponential backoff: `initial_backoff * 2^attempt`, capped at `max_backoff`.
/// Permanent errors are returned immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Example
    /// ```
    /// use selfheal::infrastructure::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(2, 2_000, 10_000);
    /// assert_eq!(policy.max_attempts(), 3);
    /// ```
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms: max_backoff_ms.max(initial_backoff_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Execute an operation with exponential backoff retry logic
    ///
    /// # Example
    /// ```no_run
    /// # use selfheal::infrastructure::retry::RetryPolicy;
    /// # use selfheal::domain::errors::CollaboratorError;
    /// # async fn example() -> Result<String, CollaboratorError> {
    /// let policy = RetryPolicy::default();
    ///
    /// let result = policy.execute(|| async {
    ///     Ok("success".to_string())
    /// }).await?;
    /// # Ok(result)
    /// # }
    /// ```
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "Collaborator call succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if self.should_retry(&err, attempt) {
                        let backoff = self.calculate_backoff(attempt);
                        warn!(
                            attempt = attempt + 1,
                            error = %err,
                            backoff_ms = backoff.as_millis() as u64,
                            "Transient collaborator failure, retrying"
                        );
                        sleep(backoff).await;
                        attempt += 1;
                    } else {
                        if attempt >= self.max_retries && err.is_transient() {
                            warn!(attempts = attempt + 1, error = %err, "Retries exhausted");
                        } else {
                            debug!(error = %err, "Permanent error, not retrying");
                        }
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Formula: min(initial_backoff * 2^attempt, max_backoff)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn should_retry(&self, error: &CollaboratorError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        error.is_transient()
    }
}

impl Default for RetryPolicy {
    /// Two retries, 2s initial backoff, 10s cap.
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
