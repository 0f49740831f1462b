//! Error types for provider calls

use std::time::Duration;
use thiserror::Error;

/// Result type for provider calls
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider failures. Every variant means the provider is unavailable for
/// this call; malformed bodies are not errors (they degrade to empty data).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{endpoint}: request timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("{endpoint}: provider returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("{endpoint}: still rate limited after {attempts} attempts")]
    RateLimitExhausted { endpoint: String, attempts: u32 },

    #[error("{endpoint}: transport error: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ProviderError {
    /// Short machine-readable classification
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::Status { .. } => "status",
            ProviderError::RateLimitExhausted { .. } => "rate_limited",
            ProviderError::Transport { .. } | ProviderError::Client(_) => "transport",
        }
    }

    pub(crate) fn from_reqwest(endpoint: &str, timeout: Duration, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProviderError::Timeout { endpoint: endpoint.to_string(), timeout }
        } else {
            ProviderError::Transport { endpoint: endpoint.to_string(), source }
        }
    }
}
