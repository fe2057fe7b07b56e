//! Client error types.

use ripplews_protocol::{HandshakeError, ProtocolError};
use thiserror::Error;

/// Error name the server uses to signal a rate limit.
pub const SLOW_DOWN: &str = "slowDown";

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// DNS resolution, connect, or socket-level failure. Fatal to the session.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// Frame-level violation from the peer. The session closes its transport
    /// before surfacing this.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection closed")]
    ConnectionClosed,

    /// The round trip produced no payload.
    #[error("no response received")]
    NoResponse,

    /// The peer returned something that is not a JSON result envelope.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The peer's envelope carried an application-level error.
    #[error("server error: {name} ({code}): {}", .message.as_deref().unwrap_or("no message"))]
    Remote {
        name: String,
        code: i64,
        message: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns whether this is the server's rate-limit signal, which the call
    /// layer retries internally.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClientError::Remote { name, .. } if name == SLOW_DOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        let err = ClientError::Remote {
            name: SLOW_DOWN.to_string(),
            code: 1,
            message: None,
        };
        assert!(err.is_rate_limited());

        let err = ClientError::Remote {
            name: "actNotFound".to_string(),
            code: 14,
            message: Some("Account not found.".to_string()),
        };
        assert!(!err.is_rate_limited());
        assert!(err.to_string().contains("actNotFound"));
        assert!(err.to_string().contains("14"));

        assert!(!ClientError::NoResponse.is_rate_limited());
    }
}
