//! Histogram metrics

use super::labels;

/// Time spent establishing a connection, handshake included
pub fn connect_duration(transport: &'static str, duration_ms: u64) {
    metrics::histogram!("framewire_connect_duration_ms", labels::TRANSPORT => transport)
        .record(duration_ms as f64);
}

/// Size of a message payload
pub fn message_size(direction: &'static str, bytes: usize) {
    metrics::histogram!("framewire_message_size_bytes", labels::DIRECTION => direction)
        .record(bytes as f64);
}
