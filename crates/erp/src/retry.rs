//! Bounded retry for rate-limited upstream calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ErpError, ErpResult};

/// Retry schedule for rate-limit responses.
///
/// Backoff doubles per attempt from `base_backoff` (2s, 4s, 8s with the
/// defaults). Non-rate-limit errors are never retried here.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Backoff before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Run `op`, retrying only [`ErpError::RateLimited`] per the policy.
pub async fn with_rate_limit_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> ErpResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ErpResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Err(e) if e.is_rate_limited() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                warn!(
                    attempt,
                    max = policy.max_retries,
                    delay_secs = delay.as_secs(),
                    "upstream rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
