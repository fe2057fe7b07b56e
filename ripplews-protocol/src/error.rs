//! Protocol and handshake error types.

use thiserror::Error;

/// Frame-level errors that can occur while encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("reserved bits set in frame header: {0:#05b}")]
    ReservedBits(u8),

    #[error("unknown opcode: {0:#x}")]
    UnknownOpcode(u8),

    #[error("declared payload length exceeds the 63-bit range: {0}")]
    FrameTooLarge(u64),

    #[error("invalid UTF-8 in text payload")]
    InvalidUtf8,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the opening handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("HTTP status line is not well-formed: {0:?}")]
    MalformedStatusLine(String),

    #[error("HTTP header is not well-formed: {0:?}")]
    MalformedHeader(String),

    #[error(
        "handshake has failed, the server did not return a valid response: {reason}\n\nClient:\n    {request}\nServer:\n    {response}"
    )]
    Rejected {
        reason: String,
        request: String,
        response: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_embeds_both_sides() {
        let err = HandshakeError::Rejected {
            reason: "expected status 101, got 200".to_string(),
            request: "GET / HTTP/1.1".to_string(),
            response: "HTTP/1.1 200 OK".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GET / HTTP/1.1"));
        assert!(msg.contains("HTTP/1.1 200 OK"));
        assert!(msg.contains("101"));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::UnknownOpcode(0x7);
        assert!(err.to_string().contains("0x7"));

        let err = ProtocolError::FrameTooLarge(u64::MAX);
        assert!(err.to_string().contains("63-bit"));
    }
}
