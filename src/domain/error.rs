//! Client Errors
//!
//! Outcome taxonomy for a single network operation. Every failure is
//! terminal for that attempt; nothing here is retried.

use thiserror::Error;

/// Common result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request could not complete
    #[error("Network error: {0}")]
    Network(String),
    /// Missing or rejected credential
    #[error("Not authorized: {0}")]
    Auth(String),
    /// The server rejected the payload
    #[error("Rejected: {0}")]
    Validation(String),
    /// Any other non-2xx response
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    /// 2xx response whose body is not what the call expects
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// Aborted because the owning screen went away
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Map a non-2xx status onto the taxonomy
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ClientError::Auth(message),
            400 | 409 | 422 => ClientError::Validation(message),
            _ => ClientError::Server { status, message },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ClientError::from_status(401, "x"), ClientError::Auth(_)));
        assert!(matches!(ClientError::from_status(403, "x"), ClientError::Auth(_)));
        assert!(matches!(ClientError::from_status(422, "x"), ClientError::Validation(_)));
        assert!(matches!(ClientError::from_status(400, "x"), ClientError::Validation(_)));
        assert_eq!(
            ClientError::from_status(503, "down"),
            ClientError::Server { status: 503, message: "down".to_string() }
        );
    }

    #[test]
    fn test_display() {
        let err = ClientError::Server { status: 500, message: "boom".into() };
        assert_eq!(err.to_string(), "Server error 500: boom");
    }
}
