//! Protocol constants

use std::time::Duration;

/// Widest supported length prefix (u64)
pub const MAX_PREFIX_WIDTH: usize = 8;

/// Default upper bound on a received payload (1 GiB).
///
/// A declared length above the bound is rejected before allocation.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 1_073_741_824;

/// One-byte payload that stands for the empty message
pub const NULL_SENTINEL: &[u8] = &[0];

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
