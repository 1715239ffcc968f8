//! framewire: length-prefixed message transport over TCP and TLS 1.3
//!
//! Each message on the wire is a length prefix (64-bit little-endian by default)
//! followed by exactly that many payload bytes. A payload consisting of the
//! single byte `0x00` stands for the empty message.
//!
//! The client connects lazily and reconnects after a failure on the next
//! operation. A [`RetryPolicy`] decides whether failures surface as `Err`
//! (`Throw`) or are absorbed (`Silent`).
//!
//! # Examples
//!
//! ```no_run
//! # fn example() -> framewire::Result<()> {
//! use framewire::{ClientConfig, RetryPolicy, TlsConfig, TransportClient};
//!
//! // Plain TCP
//! let mut client = TransportClient::connect(ClientConfig::new("127.0.0.1", 9000))?;
//! client.send_message(b"ping")?;
//! if let Some(reply) = client.receive_message()? {
//!     println!("{} bytes", reply.len());
//! }
//!
//! // TLS 1.3 with a private root certificate
//! let tls = TlsConfig::builder()
//!     .root_cert_path("/etc/framewire/ca.pem")
//!     .build()?;
//! let config = ClientConfig::builder("relay.example.com", 4433)
//!     .tls(tls)
//!     .retry_policy(RetryPolicy::Silent)
//!     .build();
//! let mut secure = TransportClient::new(config);
//! secure.send_batch(&[b"head", b"body"])?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod platform;
pub mod protocol;

pub use client::{ClientConfig, ClientConfigBuilder, Direction, RetryPolicy, TransportClient};
pub use connection::{ConnectionState, Connector, SecureTransport, TcpConnector, TlsConfig};
pub use error::{Error, Result};
pub use protocol::LengthPrefix;
