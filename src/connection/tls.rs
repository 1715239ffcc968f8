//! TLS configuration and handshake.
//!
//! Connections are TLS 1.3 only and trust exactly the root certificates the
//! caller supplies. System roots are never consulted.

use crate::platform::SocketHandle;
use crate::{Error, Result};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use rustls_pemfile::Item;
use std::fs;
use std::io;
use std::sync::Arc;

/// Encrypted stream over a platform socket
pub type TlsStream = StreamOwned<ClientConnection, SocketHandle>;

/// TLS configuration for encrypted connections.
///
/// # Examples
///
/// ```ignore
/// use framewire::connection::TlsConfig;
///
/// let tls = TlsConfig::builder()
///     .root_cert_pem(include_bytes!("ca.pem").to_vec())
///     .build()?;
///
/// // Root certificate on disk, SNI different from the dialled host
/// let tls = TlsConfig::builder()
///     .root_cert_path("/etc/framewire/ca.pem")
///     .server_name("relay.example.com")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct TlsConfig {
    /// Where the root certificate came from, for diagnostics
    root_source: String,
    /// Name sent through SNI and verified against the certificate (None = dialled host)
    server_name: Option<String>,
    /// Compiled rustls ClientConfig
    client_config: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Create a new TLS configuration builder.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// Get the rustls ClientConfig for this TLS configuration.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// SNI override, if configured
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Perform the client handshake over an open socket.
    ///
    /// The handshake is driven to completion, the server certificate chain is
    /// verified against the configured roots, and the encrypted stream is returned.
    /// On any failure the socket is closed and no application data has been sent.
    pub fn handshake(&self, mut socket: SocketHandle, host: &str) -> Result<TlsStream> {
        let name = parse_server_name(self.server_name.as_deref().unwrap_or(host))?;
        let server_name = rustls_pki_types::ServerName::try_from(name)
            .map_err(|_| Error::Config(format!("Invalid hostname for TLS: {}", host)))?;

        let mut conn = ClientConnection::new(self.client_config(), server_name)
            .map_err(|e| Error::TlsSetup(e.to_string()))?;

        while conn.is_handshaking() {
            if let Err(e) = conn.complete_io(&mut socket) {
                socket.close();
                return Err(classify_handshake_error(e));
            }
        }

        if conn.peer_certificates().map_or(true, |certs| certs.is_empty()) {
            socket.close();
            return Err(Error::CertificateUntrusted(
                "server presented no certificate".into(),
            ));
        }

        tracing::debug!(
            host,
            version = ?conn.protocol_version(),
            "TLS handshake complete"
        );
        Ok(StreamOwned::new(conn, socket))
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("root_source", &self.root_source)
            .field("server_name", &self.server_name)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Map a handshake I/O failure to the matching error kind.
///
/// Socket timeouts become [`Error::TlsTimeout`], certificate problems become
/// [`Error::CertificateUntrusted`], everything else is a rejected handshake.
fn classify_handshake_error(err: io::Error) -> Error {
    if matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    ) {
        return Error::TlsTimeout;
    }

    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        Some(rustls::Error::InvalidCertificate(reason)) => {
            Error::CertificateUntrusted(format!("{:?}", reason))
        }
        Some(other) => Error::TlsHandshake(other.to_string()),
        None => Error::TlsHandshake(err.to_string()),
    }
}

/// Where the builder reads the root certificate from
#[derive(Debug, Clone)]
enum RootSource {
    Pem(Vec<u8>),
    Path(String),
}

/// Builder for TLS configuration.
#[derive(Debug, Default)]
pub struct TlsConfigBuilder {
    root: Option<RootSource>,
    server_name: Option<String>,
}

impl TlsConfigBuilder {
    /// Trust the root certificate(s) in this PEM buffer.
    pub fn root_cert_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root = Some(RootSource::Pem(pem.into()));
        self
    }

    /// Trust the root certificate(s) in this PEM file, read at build time.
    pub fn root_cert_path(mut self, path: impl Into<String>) -> Self {
        self.root = Some(RootSource::Path(path.into()));
        self
    }

    /// Send this name through SNI instead of the dialled host.
    ///
    /// Useful when connecting to an IP address whose certificate names a host.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Build the TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no root certificate was supplied
    /// - the certificate file cannot be read
    /// - the PEM contains no usable certificate
    pub fn build(self) -> Result<TlsConfig> {
        let (pem, root_source) = match self.root {
            Some(RootSource::Pem(pem)) => (pem, "in-memory PEM".to_string()),
            Some(RootSource::Path(path)) => {
                let pem = fs::read(&path).map_err(|e| {
                    Error::Config(format!(
                        "Failed to read root certificate file '{}': {}",
                        path, e
                    ))
                })?;
                (pem, format!("'{}'", path))
            }
            None => {
                return Err(Error::Config(
                    "TLS requires a root certificate".to_string(),
                ))
            }
        };

        if let Some(name) = &self.server_name {
            parse_server_name(name)?;
        }

        let root_store = load_root_store(&pem, &root_source)?;

        let client_config = Arc::new(
            ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS13])
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );

        Ok(TlsConfig {
            root_source,
            server_name: self.server_name,
            client_config,
        })
    }
}

/// Load every certificate in a PEM buffer into an in-memory trust store.
fn load_root_store(pem: &[u8], source: &str) -> Result<RootCertStore> {
    let mut reader = io::Cursor::new(pem);
    let mut root_store = RootCertStore::empty();
    let mut found_certs = 0;

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::X509Certificate(cert))) => {
                root_store.add(cert).map_err(|e| {
                    Error::Config(format!("Rejected root certificate from {}: {}", source, e))
                })?;
                found_certs += 1;
            }
            Ok(Some(_)) => {
                // Skip non-certificate items (private keys, etc.)
            }
            Ok(None) => break,
            Err(_) => {
                return Err(Error::Config(format!(
                    "Failed to parse root certificate from {}",
                    source
                )));
            }
        }
    }

    if found_certs == 0 {
        return Err(Error::Config(format!(
            "No valid certificates found in {}",
            source
        )));
    }

    Ok(root_store)
}

/// Parse server name from hostname for TLS SNI (Server Name Indication).
///
/// # Errors
///
/// Returns an error if the hostname is empty, too long, or has characters that
/// cannot appear in a DNS name or IPv4 literal.
pub fn parse_server_name(hostname: &str) -> Result<String> {
    // Remove trailing dot if present
    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    if !hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    Ok(hostname.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca_pem() -> String {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("generate certificate")
            .cert
            .pem()
    }

    #[test]
    fn test_builder_requires_root() {
        let err = TlsConfig::builder().build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_with_pem() {
        let tls = TlsConfig::builder()
            .root_cert_pem(ca_pem())
            .build()
            .expect("Failed to build TLS config");
        assert!(tls.server_name().is_none());
        assert!(tls.client_config().alpn_protocols.is_empty());
    }

    #[test]
    fn test_builder_rejects_garbage_pem() {
        let err = TlsConfig::builder()
            .root_cert_pem(b"not a certificate".to_vec())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("No valid certificates"));
    }

    #[test]
    fn test_builder_reads_root_from_file() {
        let path = std::env::temp_dir().join(format!("framewire-ca-{}.pem", std::process::id()));
        fs::write(&path, ca_pem()).unwrap();

        let tls = TlsConfig::builder()
            .root_cert_path(path.to_string_lossy().to_string())
            .server_name("relay.example.com")
            .build();
        let _ = fs::remove_file(&path);

        let tls = tls.expect("Failed to build TLS config");
        assert_eq!(tls.server_name(), Some("relay.example.com"));
    }

    #[test]
    fn test_builder_missing_file() {
        let err = TlsConfig::builder()
            .root_cert_path("/nonexistent/framewire/ca.pem")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read root certificate file"));
    }

    #[test]
    fn test_builder_rejects_bad_server_name() {
        let err = TlsConfig::builder()
            .root_cert_pem(ca_pem())
            .server_name("bad host")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_server_name_valid() {
        assert!(parse_server_name("localhost").is_ok());
        assert!(parse_server_name("example.com").is_ok());
        assert!(parse_server_name("127.0.0.1").is_ok());
    }

    #[test]
    fn test_parse_server_name_trailing_dot() {
        assert_eq!(parse_server_name("example.com.").unwrap(), "example.com");
    }

    #[test]
    fn test_parse_server_name_invalid() {
        assert!(parse_server_name("").is_err());
        assert!(parse_server_name("example.com:9000").is_err());
        assert!(parse_server_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn test_classify_timeout() {
        let err = classify_handshake_error(io::Error::new(io::ErrorKind::WouldBlock, "timed out"));
        assert!(matches!(err, Error::TlsTimeout));
    }

    #[test]
    fn test_classify_untrusted_certificate() {
        let inner = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let err = classify_handshake_error(io::Error::new(io::ErrorKind::InvalidData, inner));
        assert!(matches!(err, Error::CertificateUntrusted(_)));
    }

    #[test]
    fn test_classify_rejected_handshake() {
        let inner = rustls::Error::AlertReceived(rustls::AlertDescription::HandshakeFailure);
        let err = classify_handshake_error(io::Error::new(io::ErrorKind::InvalidData, inner));
        assert!(matches!(err, Error::TlsHandshake(_)));

        let eof = classify_handshake_error(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(eof, Error::TlsHandshake(_)));
    }

    #[test]
    fn test_tls_config_debug() {
        let tls = TlsConfig::builder()
            .root_cert_pem(ca_pem())
            .build()
            .expect("Failed to build TLS config");

        let debug_str = format!("{:?}", tls);
        assert!(debug_str.contains("TlsConfig"));
        assert!(debug_str.contains("in-memory PEM"));
    }
}
