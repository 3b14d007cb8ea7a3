//! Error types for the Pulse engine.
//!
//! [`PulseError`] covers the failures that can escape the core: invalid
//! configuration at construction time and malformed values handed to a
//! signal. Provider and storage failures have their own error types in
//! `pulse-fetch` and `pulse-cache` and are classified with [`ErrorKind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for Pulse operations.
#[derive(Debug, Error)]
pub enum PulseError {
    /// A configuration-time invariant was violated (e.g. pillar weights
    /// that do not sum to 1.0).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A raw value had the wrong shape or was not finite.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// No signal is registered under the given key.
    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    /// Error reported by a storage substrate.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A specialized Result type for Pulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Coarse failure taxonomy shared by sources, storage and history.
///
/// `InsufficientHistory` is not an error condition; it is listed so callers
/// can report the "not yet computable" state alongside the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Provider answered HTTP 429.
    RateLimit,
    /// Provider rejected the credentials (HTTP 401/403).
    Auth,
    /// Connectivity failure or timeout.
    Network,
    /// Malformed or missing payload fields.
    DataFormat,
    /// Quota exhaustion or corruption in a storage tier.
    Storage,
    /// Fewer stored days than a query requires.
    InsufficientHistory,
}

impl ErrorKind {
    /// Stable identifier used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "RATE_LIMIT",
            Self::Auth => "AUTH",
            Self::Network => "NETWORK",
            Self::DataFormat => "DATA_FORMAT",
            Self::Storage => "STORAGE",
            Self::InsufficientHistory => "INSUFFICIENT_HISTORY",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PulseError::InvalidConfig("weights sum to 0.9".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: weights sum to 0.9");

        let err = PulseError::SignalNotFound("vix_level".to_string());
        assert_eq!(err.to_string(), "Signal not found: vix_level");
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorKind::InsufficientHistory.as_str(), "INSUFFICIENT_HISTORY");
        let json = serde_json::to_string(&ErrorKind::DataFormat).unwrap();
        assert_eq!(json, "\"DATA_FORMAT\"");
    }
}
