//! Client stream abstraction for TLS and plain TCP.

use rustls::{ClientConnection, StreamOwned};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A client stream that can be either plain TCP or TLS.
pub enum ClientStream {
    Plain { stream: TcpStream },
    Tls { stream: StreamOwned<ClientConnection, TcpStream> },
}

impl ClientStream {
    /// Returns whether this stream is TLS-encrypted.
    pub fn is_tls(&self) -> bool {
        matches!(self, ClientStream::Tls { .. })
    }

    /// Shuts down the underlying socket in both directions.
    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            ClientStream::Plain { stream } => stream.shutdown(Shutdown::Both),
            ClientStream::Tls { stream } => stream.sock.shutdown(Shutdown::Both),
        }
    }
}

impl Read for ClientStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain { stream } => stream.read(buf),
            ClientStream::Tls { stream } => stream.read(buf),
        }
    }
}

impl Write for ClientStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain { stream } => stream.write(buf),
            ClientStream::Tls { stream } => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ClientStream::Plain { stream } => stream.flush(),
            ClientStream::Tls { stream } => stream.flush(),
        }
    }
}
