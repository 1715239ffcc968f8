//! Connection management
//!
//! This module handles:
//! * Transport abstraction (plain TCP vs TLS over TCP)
//! * Connection establishment through pluggable connectors
//! * State machine enforcement
//! * TLS configuration and handshake

mod connector;
mod state;
mod tls;
mod transport;

pub use connector::{Connector, Endpoint, TcpConnector};
pub use state::ConnectionState;
pub use tls::{parse_server_name, TlsConfig, TlsConfigBuilder, TlsStream};
pub use transport::{SecureTransport, Transport};
