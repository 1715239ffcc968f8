//! Connection establishment

use super::tls::TlsConfig;
use super::transport::{SecureTransport, Transport};
use crate::platform::{resolve_ipv4, SocketHandle};
use crate::protocol::constants::DEFAULT_CONNECT_TIMEOUT;
use crate::{Error, Result};
use std::time::Duration;

/// Remote endpoint of a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IPv4 literal
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Produces ready-to-use transports.
///
/// A returned transport is fully established: for TLS that means the handshake
/// completed and the server certificate was verified. Anything less is an error.
pub trait Connector {
    /// Transport type produced by this connector
    type Transport: SecureTransport;

    /// Open a new transport to `endpoint`
    fn connect(&mut self, endpoint: &Endpoint) -> Result<Self::Transport>;

    /// Whether produced transports are encrypted
    fn is_encrypted(&self) -> bool {
        false
    }
}

/// Connector for plain TCP, optionally wrapped in TLS
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
    tls: Option<TlsConfig>,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            tls: None,
        }
    }
}

impl TcpConnector {
    /// Create a plain TCP connector
    ///
    /// A zero `connect_timeout` selects the default.
    pub fn new(connect_timeout: Duration, io_timeout: Option<Duration>) -> Self {
        let connect_timeout = if connect_timeout.is_zero() {
            DEFAULT_CONNECT_TIMEOUT
        } else {
            connect_timeout
        };
        Self {
            connect_timeout,
            io_timeout,
            tls: None,
        }
    }

    /// Wrap every connection in TLS
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// TCP connect timeout
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Socket read/write timeout
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout
    }

    /// TLS configuration, if encryption is enabled
    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }
}

impl Connector for TcpConnector {
    type Transport = Transport;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<Transport> {
        let addr = resolve_ipv4(&endpoint.host, endpoint.port).map_err(|e| {
            tracing::warn!(host = %endpoint.host, error = %e, "host resolution failed");
            Error::Resolve {
                host: endpoint.host.clone(),
            }
        })?;

        let socket = SocketHandle::open_addr(addr, self.connect_timeout, self.io_timeout);
        if !socket.is_valid() {
            return Err(Error::Connect {
                host: endpoint.host.clone(),
                port: endpoint.port,
            });
        }

        match &self.tls {
            None => Ok(Transport::Plain(socket)),
            Some(tls) => tls.handshake(socket, &endpoint.host).map(Transport::Tls),
        }
    }

    fn is_encrypted(&self) -> bool {
        self.tls.is_some()
    }
}
