//! High-level client API

pub mod config;
pub mod connection_string;
mod transport_client;

pub use config::{ClientConfig, ClientConfigBuilder, RetryPolicy};
pub use connection_string::{ConnectionInfo, TransportType};
pub use transport_client::{Direction, TransportClient};
