//! Error types for framewire

use std::io;
use thiserror::Error;

/// Main error type for framewire operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Host name could not be resolved to an IPv4 address
    #[error("could not resolve host '{host}'")]
    Resolve {
        /// Host that failed to resolve
        host: String,
    },

    /// TCP connect failed or timed out
    #[error("could not connect to {host}:{port}")]
    Connect {
        /// Remote host
        host: String,
        /// Remote port
        port: u16,
    },

    /// TLS context or session could not be created
    #[error("TLS setup failed: {0}")]
    TlsSetup(String),

    /// TLS handshake did not complete before the socket timeout
    #[error("TLS handshake timed out")]
    TlsTimeout,

    /// TLS handshake rejected by either side
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    /// Server certificate not trusted by the configured root
    #[error("server identity verification failed: {0}")]
    CertificateUntrusted(String),

    /// Established connection dropped mid-stream
    #[error("connection lost: {source}")]
    ConnectionLost {
        /// Underlying transport failure
        #[source]
        source: io::Error,
    },

    /// Peer announced a message larger than the configured maximum
    #[error("message of {len} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Declared length
        len: u64,
        /// Configured maximum
        max: usize,
    },

    /// Invalid connection state transition
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a transport failure observed on an established connection
    pub fn connection_lost(source: io::Error) -> Self {
        Error::ConnectionLost { source }
    }

    /// Check if this error belongs to the connection rather than the caller's input.
    ///
    /// Retriable errors clear once connectivity is restored; the next operation
    /// on the client reconnects.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::Resolve { .. }
                | Error::Connect { .. }
                | Error::TlsTimeout
                | Error::ConnectionLost { .. }
        )
    }

    /// Check if the error came from the TLS layer
    pub fn is_tls(&self) -> bool {
        matches!(
            self,
            Error::TlsSetup(_)
                | Error::TlsTimeout
                | Error::TlsHandshake(_)
                | Error::CertificateUntrusted(_)
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Resolve { .. } => "resolve",
            Error::Connect { .. } => "connect",
            Error::TlsSetup(_) => "tls_setup",
            Error::TlsTimeout => "tls_timeout",
            Error::TlsHandshake(_) => "tls_handshake",
            Error::CertificateUntrusted(_) => "certificate_untrusted",
            Error::ConnectionLost { .. } => "connection_lost",
            Error::FrameTooLarge { .. } => "frame_too_large",
            Error::InvalidState { .. } => "invalid_state",
        }
    }
}
