//! Upstream error taxonomy.

use thiserror::Error;

/// Result type for upstream calls.
pub type ErpResult<T> = Result<T, ErpError>;

/// Errors from the backing ERP.
///
/// The split matters to callers: `RateLimited` is retryable (with backoff,
/// bounded) and maps to a "try again, high demand" user message; `Upstream`
/// is not retried and degrades to an empty result.
#[derive(Debug, Error)]
pub enum ErpError {
    /// The upstream signaled throttling (HTTP 429 or its own throttle code).
    #[error("upstream rate limited: {message}")]
    RateLimited { message: String },

    /// Any other HTTP, transport, or payload failure.
    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Token acquisition failed after its own retry.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ErpError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Whether bounded backoff-and-retry is worthwhile.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
