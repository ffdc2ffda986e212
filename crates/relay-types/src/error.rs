use thiserror::Error;

/// Errors from inbound payload validation.
///
/// All variants are recoverable: the orchestrator converts them into a
/// user-visible error push, never a crash.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing or non-string 'text' field")]
    MissingText,

    #[error("message is empty")]
    Empty,

    #[error("message exceeds {0} characters")]
    TooLong(usize),

    #[error("message contains disallowed content")]
    DisallowedContent,
}

/// Errors from the durable session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("session not found")]
    NotFound,
}

/// Errors from the external generative API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("malformed request: {0}")]
    InvalidRequest(String),

    #[error("failed to parse response: {0}")]
    Deserialization(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Retryable: rate limiting, 5xx gateway/server statuses, timeouts,
    /// network failures. Auth and malformed-request errors are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited | LlmError::Timeout | LlmError::Network(_) => true,
            LlmError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Errors from pushing a message back over the transport.
#[derive(Debug, Error)]
pub enum PushError {
    /// The transport has confirmed the connection is gone. Treated as an
    /// implicit disconnect by the orchestrator.
    #[error("connection no longer exists")]
    Gone,

    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooLong(500);
        assert_eq!(err.to_string(), "message exceeds 500 characters");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            let err = LlmError::Http {
                status,
                message: String::new(),
            };
            assert!(err.is_retryable(), "HTTP {status} should be retryable");
        }
        for status in [400, 401, 403, 404, 422] {
            let err = LlmError::Http {
                status,
                message: String::new(),
            };
            assert!(!err.is_retryable(), "HTTP {status} should not be retryable");
        }
    }

    #[test]
    fn test_retryable_signals() {
        assert!(LlmError::RateLimited.is_retryable());
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Network("connection reset".to_string()).is_retryable());
        assert!(!LlmError::AuthenticationFailed.is_retryable());
        assert!(!LlmError::InvalidRequest("bad body".to_string()).is_retryable());
        assert!(!LlmError::Deserialization("truncated".to_string()).is_retryable());
    }

    #[test]
    fn test_push_error_display() {
        assert_eq!(PushError::Gone.to_string(), "connection no longer exists");
    }
}
