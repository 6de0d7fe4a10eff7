//! Configuration error model.

use thiserror::Error;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration-level error.
///
/// This is the one error class in the system that is allowed to propagate
/// to the top and abort startup: retrying a missing credential can never
/// succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but unusable (blank, unparseable).
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub fn missing(var: &'static str) -> Self {
        Self::Missing(var)
    }

    pub fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}
