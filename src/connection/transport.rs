//! Transport abstraction (plain TCP or TLS over TCP)

use super::tls::TlsStream;
use crate::platform::{read_full, write_full, SocketHandle};
use std::io;

/// Byte transport underneath the framing layer.
///
/// Plain and encrypted connections share this contract, so the client is the
/// same whichever backend produced the stream.
pub trait SecureTransport {
    /// Read until `buf` is full or the peer closes.
    ///
    /// Returns the number of bytes read; a short count means the peer closed.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `buf`
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Tear down the session and the socket. Safe to call more than once.
    fn close(&mut self);

    /// Whether bytes are encrypted on the wire
    fn is_encrypted(&self) -> bool;
}

/// Transport produced by [`TcpConnector`](super::TcpConnector)
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    /// Plain TCP connection
    Plain(SocketHandle),
    /// TLS-encrypted TCP connection
    Tls(TlsStream),
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Plain(_) => f.write_str("Transport::Plain(SocketHandle)"),
            Transport::Tls(_) => f.write_str("Transport::Tls(TlsStream)"),
        }
    }
}

impl SecureTransport for Transport {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(socket) => socket.recv(buf),
            Transport::Tls(stream) => read_full(stream, buf),
        }
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Transport::Plain(socket) => socket.send(buf),
            Transport::Tls(stream) => write_full(stream, buf),
        }
    }

    fn close(&mut self) {
        match self {
            Transport::Plain(socket) => socket.close(),
            Transport::Tls(stream) => {
                if stream.sock.is_valid() {
                    stream.conn.send_close_notify();
                    // Best effort: the peer may already be gone
                    let _ = stream.conn.complete_io(&mut stream.sock);
                }
                stream.sock.close();
            }
        }
    }

    fn is_encrypted(&self) -> bool {
        matches!(self, Transport::Tls(_))
    }
}

impl<T: SecureTransport + ?Sized> SecureTransport for Box<T> {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).send(buf)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_encrypted(&self) -> bool {
        (**self).is_encrypted()
    }
}
