//! Server error types

use pairup_core::MatchError;
use thiserror::Error;

/// Errors that can occur in the pairup server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Invalid message format
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Coordinator refused the request
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Wire code sent in `error` replies
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Bind { .. } | ServerError::Internal(_) => "internal_error",
            ServerError::WebSocket(_) => "websocket_error",
            ServerError::InvalidMessage(_) => "invalid_message",
            ServerError::Match(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_errors_keep_their_code() {
        let error = ServerError::from(MatchError::NotRegistered("a".to_string()));
        assert_eq!(error.code(), "not_registered");
        assert!(error.to_string().contains("a"));
    }

    #[test]
    fn invalid_message_code() {
        let error = ServerError::InvalidMessage("expected value".to_string());
        assert_eq!(error.code(), "invalid_message");
        assert_eq!(error.to_string(), "invalid message: expected value");
    }
}
