//! Socket handle and byte-level I/O loops

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Owned TCP socket that is either open or invalid.
///
/// Opening never returns an error: failures are logged and produce an invalid
/// handle, which the caller discovers through [`is_valid`](Self::is_valid) or
/// through `NotConnected` errors on I/O.
#[derive(Debug, Default)]
pub struct SocketHandle {
    stream: Option<TcpStream>,
}

impl SocketHandle {
    /// A handle that owns no socket
    pub fn invalid() -> Self {
        Self { stream: None }
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Resolve `host`, connect within `connect_timeout`, and prepare the socket for
    /// blocking framed I/O.
    ///
    /// The socket ends up in blocking mode with `TCP_NODELAY` set and read/write
    /// timeouts of `io_timeout` (`None` blocks indefinitely).
    pub fn open(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        io_timeout: Option<Duration>,
    ) -> Self {
        match resolve_ipv4(host, port) {
            Ok(addr) => Self::open_addr(addr, connect_timeout, io_timeout),
            Err(e) => {
                tracing::warn!(host, port, error = %e, "host resolution failed");
                Self::invalid()
            }
        }
    }

    /// Connect to an already resolved address, see [`open`](Self::open).
    pub fn open_addr(
        addr: SocketAddrV4,
        connect_timeout: Duration,
        io_timeout: Option<Duration>,
    ) -> Self {
        match try_open(addr, connect_timeout, io_timeout) {
            Ok(stream) => {
                tracing::debug!(%addr, "socket connected");
                Self::from_stream(stream)
            }
            Err(e) => {
                tracing::warn!(%addr, error = %e, "open connection failed");
                Self::invalid()
            }
        }
    }

    /// Check whether the handle owns an open socket
    pub fn is_valid(&self) -> bool {
        self.stream.is_some()
    }

    /// Shut down and close the socket. Safe to call on an invalid handle.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Read until `buf` is full or the peer closes.
    ///
    /// Returns the number of bytes read; a count below `buf.len()` means the peer
    /// closed the connection. Real errors are returned as `Err`.
    pub fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_full(self, buf)
    }

    /// Write all of `buf`
    pub fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        write_full(self, buf)
    }

    /// Toggle blocking mode
    pub fn set_blocking(&self, blocking: bool) -> io::Result<()> {
        self.stream()?.set_nonblocking(!blocking)
    }

    /// Apply the same read and write timeout
    pub fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        apply_timeouts(self.stream()?, timeout)
    }

    /// Remote address, if connected
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    fn stream(&self) -> io::Result<&TcpStream> {
        self.stream.as_ref().ok_or_else(not_connected)
    }

    fn stream_mut(&mut self) -> io::Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(not_connected)
    }
}

impl Read for SocketHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for SocketHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream_mut()?.flush()
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.close();
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "socket is not connected")
}

fn try_open(
    addr: SocketAddrV4,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    // Non-blocking connect polled up to the timeout
    socket.connect_timeout(&SockAddr::from(addr), connect_timeout)?;
    socket.set_nonblocking(false)?;

    let stream: TcpStream = socket.into();
    stream.set_nodelay(true)?;
    apply_timeouts(&stream, io_timeout)?;
    Ok(stream)
}

fn apply_timeouts(stream: &TcpStream, timeout: Option<Duration>) -> io::Result<()> {
    // A zero duration is rejected by the OS; treat it as "no timeout"
    let timeout = timeout.filter(|t| !t.is_zero());
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)
}

/// Resolve `host` to its first IPv4 address.
///
/// IPv4 literals are parsed directly; anything else goes through the system resolver.
pub fn resolve_ipv4(host: &str, port: u16) -> io::Result<SocketAddrV4> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(SocketAddrV4::new(ip, port));
    }

    (host, port)
        .to_socket_addrs()?
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no IPv4 address for host '{}'", host),
            )
        })
}

/// Read until `buf` is full, the reader reports end of stream, or an error occurs.
///
/// `Interrupted` is retried. Returns the number of bytes read.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Write every byte of `buf`, then flush.
///
/// A single `write` may accept only part of the buffer; this loops until done.
/// `Interrupted` is retried and a zero-length write is `WriteZero`.
pub fn write_full<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    loop {
        match writer.flush() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
