//! Label keys and values shared by framewire metrics

/// Label key: transport kind
pub const TRANSPORT: &str = "transport";

/// Label key: error category
pub const CATEGORY: &str = "category";

/// Label key: operation direction
pub const DIRECTION: &str = "direction";

/// Plain TCP transport
pub const TRANSPORT_PLAIN: &str = "plain";

/// TLS over TCP transport
pub const TRANSPORT_TLS: &str = "tls";

/// Outgoing data
pub const DIRECTION_SEND: &str = "send";

/// Incoming data
pub const DIRECTION_RECEIVE: &str = "receive";

/// Pick the transport label for a connection
pub fn transport(encrypted: bool) -> &'static str {
    if encrypted {
        TRANSPORT_TLS
    } else {
        TRANSPORT_PLAIN
    }
}
