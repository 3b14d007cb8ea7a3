//! Error types for signal sources.

use pulse_traits::{ErrorKind, SignalKey};
use thiserror::Error;

/// Errors that can occur when fetching a signal from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing API key.
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    /// Provider answered HTTP 429.
    #[error("Rate limit exceeded by {0}")]
    RateLimited(String),

    /// Provider rejected the credentials.
    #[error("Authentication failed: HTTP {0}")]
    Auth(u16),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Connection, timeout or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The payload did not match the expected shape.
    #[error("Malformed payload: {0}")]
    DataFormat(String),

    /// The source has no value for this signal.
    #[error("No data available for {0}")]
    NoData(SignalKey),

    /// Environment variable error.
    #[error("Environment error: {0}")]
    Env(#[from] dotenvy::Error),
}

impl ProviderError {
    /// Coarse classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited(_) => ErrorKind::RateLimit,
            Self::MissingApiKey(_) | Self::Auth(_) | Self::Env(_) => ErrorKind::Auth,
            Self::Network(_) | Self::Status { .. } => ErrorKind::Network,
            Self::DataFormat(_) | Self::NoData(_) => ErrorKind::DataFormat,
        }
    }

    /// Whether another attempt may succeed: rate limiting and network
    /// failures only.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Network(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::DataFormat(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::DataFormat(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ProviderError::RateLimited("p".into()).is_retryable());
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(!ProviderError::Auth(401).is_retryable());
        assert!(
            !ProviderError::Status {
                status: 500,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ProviderError::DataFormat("x".into()).is_retryable());
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            ProviderError::RateLimited("p".into()).kind(),
            ErrorKind::RateLimit
        );
        assert_eq!(ProviderError::Auth(403).kind(), ErrorKind::Auth);
        assert_eq!(
            ProviderError::NoData(SignalKey::VixLevel).kind(),
            ErrorKind::DataFormat
        );
    }
}
