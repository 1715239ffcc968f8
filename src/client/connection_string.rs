//! Connection string parsing
//!
//! Supports formats:
//! * tcp://host:port[?params]
//! * tls://host:port?rootcert=/path/to/ca.pem[&sni=name][&params]
//!
//! Parameters: `retry=throw|silent`, `connect_timeout_ms` (0 selects the
//! default), `io_timeout_ms` (0 disables), `prefix=u64le|native`, `max_message_len`, `debug=true|false`,
//! `sni`, `rootcert`.

use super::config::{ClientConfig, RetryPolicy};
use crate::connection::TlsConfig;
use crate::protocol::LengthPrefix;
use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// Parsed connection info
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Transport type
    pub transport: TransportType,
    /// Host name or IPv4 literal
    pub host: String,
    /// Port
    pub port: u16,
    /// Failure propagation mode
    pub retry_policy: Option<RetryPolicy>,
    /// Connect timeout
    pub connect_timeout: Option<Duration>,
    /// I/O timeout (`Some(None)` = explicitly disabled)
    pub io_timeout: Option<Option<Duration>>,
    /// Length prefix format
    pub length_prefix: Option<LengthPrefix>,
    /// Largest accepted payload
    pub max_message_len: Option<usize>,
    /// Lifecycle logging at info level
    pub debug: bool,
    /// SNI override (from sni param)
    pub sni: Option<String>,
    /// Path to the root CA certificate (from rootcert param)
    pub rootcert: Option<String>,
}

/// Transport type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    /// Plain TCP
    Tcp,
    /// TLS 1.3 over TCP
    Tls,
}

/// Extract a query parameter value from a query string
fn parse_query_param(query_string: &str, param: &str) -> Option<String> {
    if query_string.is_empty() {
        return None;
    }

    let query = query_string.trim_start_matches('?');

    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == param {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Parse a typed query parameter, reporting the parameter name on failure
fn parse_typed_param<T: FromStr>(query_string: &str, param: &str) -> Result<Option<T>> {
    match parse_query_param(query_string, param) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid value for {}: '{}'", param, raw))),
    }
}

impl ConnectionInfo {
    /// Parse connection string
    pub fn parse(s: &str) -> Result<Self> {
        let (transport, rest) = if let Some(rest) = s.strip_prefix("tcp://") {
            (TransportType::Tcp, rest)
        } else if let Some(rest) = s.strip_prefix("tls://") {
            (TransportType::Tls, rest)
        } else {
            return Err(Error::Config(
                "connection string must start with tcp:// or tls://".into(),
            ));
        };

        let (host_port, query_string) = match rest.find('?') {
            Some(q_pos) => rest.split_at(q_pos),
            None => (rest, ""),
        };

        let (host, port) = host_port
            .rsplit_once(':')
            .ok_or_else(|| Error::Config("connection string requires host:port".into()))?;
        if host.is_empty() {
            return Err(Error::Config("connection string requires a host".into()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("invalid port '{}'", port)))?;

        let retry_policy = parse_query_param(query_string, "retry")
            .map(|p| p.parse::<RetryPolicy>())
            .transpose()?;
        let length_prefix = parse_query_param(query_string, "prefix")
            .map(|p| p.parse::<LengthPrefix>())
            .transpose()?;
        let connect_timeout =
            parse_typed_param::<u64>(query_string, "connect_timeout_ms")?.map(Duration::from_millis);
        let io_timeout = parse_typed_param::<u64>(query_string, "io_timeout_ms")?
            .map(|ms| (ms > 0).then(|| Duration::from_millis(ms)));
        let max_message_len = parse_typed_param::<usize>(query_string, "max_message_len")?;
        let debug = parse_typed_param::<bool>(query_string, "debug")?.unwrap_or(false);

        let sni = parse_query_param(query_string, "sni");
        let rootcert = parse_query_param(query_string, "rootcert");

        if transport == TransportType::Tls && rootcert.is_none() {
            return Err(Error::Config(
                "tls:// connection string requires rootcert".into(),
            ));
        }

        Ok(Self {
            transport,
            host: host.to_string(),
            port,
            retry_policy,
            connect_timeout,
            io_timeout,
            length_prefix,
            max_message_len,
            debug,
            sni,
            rootcert,
        })
    }

    /// Build a `TlsConfig` from parsed connection parameters.
    ///
    /// Returns `None` for `tcp://`. Reads the root certificate file.
    pub fn to_tls_config(&self) -> Result<Option<TlsConfig>> {
        if self.transport == TransportType::Tcp {
            return Ok(None);
        }

        let mut builder = TlsConfig::builder();
        if let Some(ref path) = self.rootcert {
            builder = builder.root_cert_path(path);
        }
        if let Some(ref name) = self.sni {
            builder = builder.server_name(name);
        }

        Ok(Some(builder.build()?))
    }

    /// Convert to ClientConfig
    pub fn to_config(&self) -> Result<ClientConfig> {
        let mut builder = ClientConfig::builder(&self.host, self.port).debug(self.debug);

        if let Some(policy) = self.retry_policy {
            builder = builder.retry_policy(policy);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.io_timeout {
            builder = builder.io_timeout(timeout);
        }
        if let Some(prefix) = self.length_prefix {
            builder = builder.length_prefix(prefix);
        }
        if let Some(len) = self.max_message_len {
            builder = builder.max_message_len(len);
        }
        if let Some(tls) = self.to_tls_config()? {
            builder = builder.tls(tls);
        }

        Ok(builder.build())
    }
}
