//! Error types for the tracechat client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire tracechat client.
///
/// Variants are structured so that the controller can decide how a failure
/// surfaces in the transcript without string matching.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TraceChatError {
    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never reached the backend (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The event stream failed after it was opened.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TraceChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an HTTP status error
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether resubmitting the same turn could plausibly succeed.
    ///
    /// The controller never retries on its own; the CLI uses this to phrase
    /// its hint to the user.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Network(_) | Self::Transport(_) => true,
            _ => false,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TraceChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TraceChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TraceChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for TraceChatError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::http(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return Self::Serialization {
                format: "JSON".to_string(),
                message: err.to_string(),
            };
        }
        Self::Network(err.to_string())
    }
}

/// Conversion from anyhow::Error (used by the CLI boundary)
impl From<anyhow::Error> for TraceChatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for TraceChatError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, TraceChatError>`.
pub type Result<T> = std::result::Result<T, TraceChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = TraceChatError::http(500, "Internal Server Error");
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
        assert_eq!(err.status(), Some(500));
        assert!(err.is_http());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TraceChatError::http(503, "busy").is_retryable());
        assert!(!TraceChatError::http(400, "bad request").is_retryable());
        assert!(TraceChatError::transport("reset").is_retryable());
        assert!(!TraceChatError::config("missing api_base").is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: TraceChatError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TraceChatError::Serialization { ref format, .. } if format == "JSON"));
    }
}
