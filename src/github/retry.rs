// Retry policy for remote requests.
// Wraps any transport with rate-limit-aware backoff; the bare client never retries.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, StatsError};

use super::transport::{ApiResponse, Transport};

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Whether a response status is worth retrying.
    ///
    /// 403 only counts when the server attached a wait hint, which is how primary and
    /// secondary rate limits show up; a plain 403 is a permissions problem.
    pub fn is_retryable(response: &ApiResponse) -> bool {
        match response.status {
            429 => true,
            403 => response.retry_after.is_some(),
            status => (500..600).contains(&status),
        }
    }

    /// Delay before retry number `attempt` (0-based), or `None` to give up.
    pub fn delay_for(&self, attempt: u32, response: &ApiResponse) -> Option<Duration> {
        if attempt >= self.max_retries || !Self::is_retryable(response) {
            return None;
        }
        Some(self.backoff(attempt, response.retry_after))
    }

    fn backoff(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = hint.unwrap_or_else(|| {
            self.base_delay
                .saturating_mul(2u32.saturating_pow(attempt))
        });
        delay.min(self.max_delay)
    }
}

/// Transport decorator applying a [`RetryPolicy`].
pub struct Retrying<X> {
    inner: X,
    policy: RetryPolicy,
}

impl<X: Transport> Retrying<X> {
    pub fn new(inner: X, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &X {
        &self.inner
    }

    fn transient(error: &StatsError) -> bool {
        matches!(error, StatsError::Api(e) if e.is_timeout() || e.is_connect())
    }
}

impl<X: Transport> Transport for Retrying<X> {
    async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.send_with_retries(url, || self.inner.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        self.send_with_retries(url, || self.inner.post_json(url, body))
            .await
    }
}

impl<X: Transport> Retrying<X> {
    async fn send_with_retries<F, Fut>(&self, url: &str, send: F) -> Result<ApiResponse>
    where
        F: Fn() -> Fut + Send,
        Fut: Future<Output = Result<ApiResponse>> + Send,
    {
        let mut attempt = 0;
        loop {
            let delay = match send().await {
                Ok(response) => match self.policy.delay_for(attempt, &response) {
                    Some(delay) => {
                        warn!(url, status = response.status, attempt, ?delay, "retrying request");
                        delay
                    }
                    None => return Ok(response),
                },
                Err(e) if Self::transient(&e) && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt, None);
                    warn!(url, error = %e, attempt, ?delay, "retrying after transport error");
                    delay
                }
                Err(e) => return Err(e),
            };
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
