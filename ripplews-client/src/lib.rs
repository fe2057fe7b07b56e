//! # ripplews-client
//!
//! Synchronous WebSocket client for ripple JSON-RPC servers.
//!
//! This crate provides:
//! - Blocking connection management with lazy connect on first use
//! - The RFC 6455 opening handshake and text-frame transport
//! - `call(command, params)` with automatic slow-down retry
//! - Optional TLS via rustls

pub mod client;
pub mod connection;
pub mod error;
pub mod stream;
pub mod tls;

pub use client::{Client, RetryPolicy};
pub use connection::{Connection, ConnectionConfig, TlsClientConfig};
pub use error::ClientError;
