//! Connection management: lazy connect, opening handshake, and the
//! one-request-at-a-time send/receive discipline.

use crate::error::ClientError;
use crate::stream::ClientStream;
use crate::tls::{create_insecure_tls_config, create_tls_config};
use rand::RngCore;
use ripplews_protocol::frame::Frame;
use ripplews_protocol::{handshake, ProtocolError, DEFAULT_PORT};
use rustls::pki_types::ServerName;
use rustls::{ClientConnection, StreamOwned};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

/// Size of the single bounded read for the handshake response.
const HANDSHAKE_READ_SIZE: usize = 2048;

/// TLS options for a connection.
#[derive(Debug, Clone, Default)]
pub struct TlsClientConfig {
    /// Path to PEM-encoded CA certificate(s) for server verification.
    /// If None, the bundled webpki roots are used.
    pub ca_cert_path: Option<PathBuf>,
    /// Skip server certificate verification (INSECURE - development only).
    pub insecure: bool,
    /// Server name for SNI (defaults to the endpoint host).
    pub server_name: Option<String>,
}

impl TlsClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }
}

/// Connection configuration. Immutable once the connection is built.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Wrap the stream in TLS.
    pub secure: bool,
    /// Connection timeout. Reads after connect block without a timeout.
    pub connect_timeout: Duration,
    /// TLS options, used when `secure` is set.
    pub tls: TlsClientConfig,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            secure: true,
            connect_timeout: Duration::from_secs(10),
            tls: TlsClientConfig::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsClientConfig) -> Self {
        self.tls = tls;
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("s1.ripple.com")
    }
}

/// Session state. The transition out of `Unconnected` happens at most once;
/// after `Closed` the connection is done and callers build a new one.
enum ConnectionState {
    Unconnected,
    Connected(ClientStream),
    Closed,
}

/// A synchronous WebSocket connection carrying one request at a time.
///
/// The socket is established lazily on first use. Exactly one request may be
/// outstanding: `send` writes a single text frame and blocks until one frame
/// arrives in reply or the peer closes the stream.
pub struct Connection {
    config: ConnectionConfig,
    state: ConnectionState,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Unconnected,
        }
    }

    /// Returns whether the connection is established.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Opens the transport and performs the opening handshake.
    ///
    /// Idempotent when already connected. On any failure the session stays
    /// unconnected and the error propagates; there is no retry at this layer.
    /// A closed session cannot be reopened.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        match self.state {
            ConnectionState::Connected(_) => return Ok(()),
            ConnectionState::Closed => return Err(ClientError::ConnectionClosed),
            ConnectionState::Unconnected => {}
        }

        let mut stream = self.open_stream()?;
        self.negotiate(&mut stream)?;
        self.state = ConnectionState::Connected(stream);
        Ok(())
    }

    /// Resolves the host and opens a blocking plain or TLS stream.
    fn open_stream(&self) -> Result<ClientStream, ClientError> {
        tracing::debug!("Connecting to {}:{}...", self.config.host, self.config.port);

        let addr = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                ClientError::Transport(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses for {}", self.config.host),
                ))
            })?;

        let tcp = TcpStream::connect_timeout(&addr, self.config.connect_timeout)?;
        tcp.set_nodelay(true).ok();
        tcp.set_nonblocking(false)?;
        // confirm the peer actually accepted the connection
        tcp.peer_addr()?;

        tracing::debug!("TCP connected");

        if !self.config.secure {
            return Ok(ClientStream::Plain { stream: tcp });
        }

        let tls_config = if self.config.tls.insecure {
            tracing::warn!("Using insecure TLS (certificate verification disabled)");
            create_insecure_tls_config()
        } else {
            create_tls_config(&self.config.tls)?
        };

        let server_name_str = self
            .config
            .tls
            .server_name
            .clone()
            .unwrap_or_else(|| self.config.host.clone());
        let server_name = ServerName::try_from(server_name_str.clone())
            .map_err(|_| ClientError::TlsConfig(format!("invalid server name: {}", server_name_str)))?;

        let conn = ClientConnection::new(tls_config, server_name)
            .map_err(|e| ClientError::TlsHandshake(e.to_string()))?;

        tracing::debug!("TLS stream ready");
        Ok(ClientStream::Tls {
            stream: StreamOwned::new(conn, tcp),
        })
    }

    /// Runs the RFC 6455 opening handshake on a fresh stream. The key and the
    /// derived accept value are scoped to this one attempt.
    fn negotiate(&self, stream: &mut ClientStream) -> Result<(), ClientError> {
        let mut seed = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut seed);
        let key = handshake::client_key(seed);
        let expected = handshake::accept_for_key(&key);

        let request = handshake::build_request(&self.config.host, &key);
        stream.write_all(request.as_bytes())?;
        stream.flush()?;

        // a single bounded read is sufficient for the 101 response
        let mut buf = vec![0u8; HANDSHAKE_READ_SIZE];
        let n = stream.read(&mut buf)?;
        let raw = String::from_utf8_lossy(&buf[..n]).into_owned();

        let response = handshake::HttpResponse::parse(&raw)?;
        handshake::validate_response(&response, &expected, &request, &raw)?;

        tracing::debug!("WebSocket handshake complete");
        Ok(())
    }

    /// Sends `text` as a single masked text frame and blocks for one frame in
    /// reply. Connects lazily on first use.
    ///
    /// Returns `Ok(None)` when the peer has closed the connection. A
    /// frame-level violation closes the transport before the error
    /// propagates.
    pub fn send(&mut self, text: &str) -> Result<Option<String>, ClientError> {
        self.connect()?;
        let stream = match &mut self.state {
            ConnectionState::Connected(stream) => stream,
            _ => return Err(ClientError::ConnectionClosed),
        };

        let mut mask_key = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut mask_key);
        let encoded = Frame::text(text.as_bytes().to_vec()).encode(mask_key);

        tracing::debug!("Sending text frame ({} bytes)", encoded.len());
        stream.write_all(&encoded)?;
        stream.flush()?;

        match Frame::read_from(stream) {
            Ok(Some(frame)) => {
                tracing::debug!(
                    "Received {:?} frame ({} bytes)",
                    frame.opcode,
                    frame.payload.len()
                );
                let text = String::from_utf8(frame.payload.to_vec())
                    .map_err(|_| ClientError::Protocol(ProtocolError::InvalidUtf8))?;
                Ok(Some(text))
            }
            Ok(None) => {
                tracing::debug!("Connection closed by peer");
                Ok(None)
            }
            Err(e) => {
                // the frame stream is unrecoverable; drop the transport
                self.close();
                Err(e.into())
            }
        }
    }

    /// Releases the transport. The session is terminal afterwards; subsequent
    /// use requires a new connection.
    pub fn close(&mut self) {
        if let ConnectionState::Connected(stream) = &self.state {
            tracing::debug!("Closing connection");
            let _ = stream.shutdown();
        }
        self.state = ConnectionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "s1.ripple.com");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.secure);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builders() {
        let config = ConnectionConfig::new("localhost")
            .with_port(8080)
            .with_secure(false)
            .with_connect_timeout(Duration::from_secs(2));
        assert_eq!(config.port, 8080);
        assert!(!config.secure);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_new_connection_is_unconnected() {
        let conn = Connection::new(ConnectionConfig::default());
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_closed_connection_stays_closed() {
        let mut conn = Connection::new(ConnectionConfig::default());
        conn.close();
        assert!(!conn.is_connected());
        assert!(matches!(
            conn.connect(),
            Err(ClientError::ConnectionClosed)
        ));
        assert!(matches!(
            conn.send("{}"),
            Err(ClientError::ConnectionClosed)
        ));
    }
}
