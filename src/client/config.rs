//! Client configuration

use crate::connection::TlsConfig;
use crate::protocol::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_MESSAGE_LENGTH};
use crate::protocol::LengthPrefix;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the client does when a connection fails.
///
/// In both modes the failed connection is torn down and the next operation
/// reconnects; the policy only decides whether the caller sees the failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    /// Return the failure as `Err`
    #[default]
    Throw,
    /// Swallow the failure; the operation reports `false` / `None`
    Silent,
}

impl std::fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Throw => write!(f, "throw"),
            Self::Silent => write!(f, "silent"),
        }
    }
}

impl std::str::FromStr for RetryPolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "throw" => Ok(Self::Throw),
            "silent" => Ok(Self::Silent),
            _ => Err(Error::Config(format!(
                "invalid retry policy '{}': expected throw or silent",
                s
            ))),
        }
    }
}

/// Client configuration
///
/// Use `ClientConfig::builder()` to set timeouts, TLS, and wire options.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote host name or IPv4 literal
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Failure propagation mode (default: throw)
    pub retry_policy: RetryPolicy,
    /// TLS settings; `None` means plain TCP
    pub tls: Option<TlsConfig>,
    /// TCP connect timeout (default: 5 seconds)
    pub connect_timeout: Duration,
    /// Socket read/write timeout (default: the connect timeout; `None` blocks indefinitely)
    pub io_timeout: Option<Duration>,
    /// Length prefix format (default: u64 little-endian)
    pub length_prefix: LengthPrefix,
    /// Largest payload accepted from the peer (default: 1 GiB)
    pub max_message_len: usize,
    /// Log connection lifecycle events at info level instead of debug
    pub debug: bool,
}

impl ClientConfig {
    /// Create new configuration with defaults
    ///
    /// # Defaults
    ///
    /// - `retry_policy`: `Throw`
    /// - `tls`: None
    /// - `connect_timeout`: 5 seconds
    /// - `io_timeout`: 5 seconds
    /// - `length_prefix`: `U64Le`
    /// - `max_message_len`: 1 GiB
    /// - `debug`: false
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::builder(host, port).build()
    }

    /// Create a builder for advanced configuration
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = ClientConfig::builder("127.0.0.1", 9000)
    ///     .retry_policy(RetryPolicy::Silent)
    ///     .connect_timeout(Duration::from_secs(2))
    ///     .build();
    /// ```
    pub fn builder(host: impl Into<String>, port: u16) -> ClientConfigBuilder {
        ClientConfigBuilder {
            host: host.into(),
            port,
            retry_policy: RetryPolicy::default(),
            tls: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: None,
            io_timeout_set: false,
            length_prefix: LengthPrefix::default(),
            max_message_len: DEFAULT_MAX_MESSAGE_LENGTH,
            debug: false,
        }
    }

    /// Whether connections are encrypted
    pub fn uses_tls(&self) -> bool {
        self.tls.is_some()
    }
}

/// Builder for creating `ClientConfig`
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    host: String,
    port: u16,
    retry_policy: RetryPolicy,
    tls: Option<TlsConfig>,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
    io_timeout_set: bool,
    length_prefix: LengthPrefix,
    max_message_len: usize,
    debug: bool,
}

impl ClientConfigBuilder {
    /// Set the failure propagation mode
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Enable TLS with the given configuration
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Set TCP connection timeout
    ///
    /// Default: 5 seconds. Also used as the I/O timeout unless one is set.
    /// A zero duration selects the default.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = if duration.is_zero() {
            DEFAULT_CONNECT_TIMEOUT
        } else {
            duration
        };
        self
    }

    /// Set socket read/write timeout
    ///
    /// `None` lets reads block until the peer sends data.
    pub fn io_timeout(mut self, duration: Option<Duration>) -> Self {
        self.io_timeout = duration;
        self.io_timeout_set = true;
        self
    }

    /// Set the length prefix format
    pub fn length_prefix(mut self, prefix: LengthPrefix) -> Self {
        self.length_prefix = prefix;
        self
    }

    /// Set the largest payload accepted from the peer
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    /// Log connection lifecycle events at info level
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        let io_timeout = if self.io_timeout_set {
            self.io_timeout
        } else {
            Some(self.connect_timeout)
        };

        ClientConfig {
            host: self.host,
            port: self.port,
            retry_policy: self.retry_policy,
            tls: self.tls,
            connect_timeout: self.connect_timeout,
            io_timeout,
            length_prefix: self.length_prefix,
            max_message_len: self.max_message_len,
            debug: self.debug,
        }
    }
}
