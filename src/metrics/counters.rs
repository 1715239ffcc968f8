//! Counter metrics

use super::labels;

/// A connection attempt started
pub fn connect_attempted(transport: &'static str) {
    metrics::counter!("framewire_connect_attempts_total", labels::TRANSPORT => transport)
        .increment(1);
}

/// A connection attempt finished with a usable transport
pub fn connection_established(transport: &'static str) {
    metrics::counter!(
        "framewire_connections_established_total",
        labels::TRANSPORT => transport
    )
    .increment(1);
}

/// A connection attempt failed
pub fn connect_failed(transport: &'static str, category: &'static str) {
    metrics::counter!(
        "framewire_connect_failures_total",
        labels::TRANSPORT => transport,
        labels::CATEGORY => category
    )
    .increment(1);
}

/// An established connection was torn down after a failure
pub fn connection_lost(direction: &'static str, category: &'static str) {
    metrics::counter!(
        "framewire_connections_lost_total",
        labels::DIRECTION => direction,
        labels::CATEGORY => category
    )
    .increment(1);
}

/// A complete message was written
pub fn message_sent(bytes: usize) {
    metrics::counter!("framewire_messages_sent_total").increment(1);
    metrics::counter!("framewire_bytes_sent_total").increment(bytes as u64);
}

/// A complete message was read
pub fn message_received(bytes: usize) {
    metrics::counter!("framewire_messages_received_total").increment(1);
    metrics::counter!("framewire_bytes_received_total").increment(bytes as u64);
}
