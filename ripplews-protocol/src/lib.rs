//! # ripplews-protocol
//!
//! WebSocket wire protocol for ripplews (RFC 6455, client role).
//!
//! This crate provides:
//! - Frame encoding with client-side masking and all three payload-length forms
//! - Incremental frame decoding from any `Read` source
//! - Opening-handshake request building, accept derivation, and response validation
//!
//! No socket I/O happens here; the transport lives in `ripplews-client`.

pub mod error;
pub mod frame;
pub mod handshake;

pub use error::{HandshakeError, ProtocolError};
pub use frame::{Frame, Opcode};

/// GUID appended to the client key when deriving `Sec-WebSocket-Accept`
/// (RFC 6455 §4.2.2).
pub const RFC6455_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// WebSocket protocol version sent during the opening handshake.
pub const WEBSOCKET_VERSION: u8 = 13;

/// Default port for secure WebSocket endpoints.
pub const DEFAULT_PORT: u16 = 443;
