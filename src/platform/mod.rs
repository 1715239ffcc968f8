//! Platform socket shim
//!
//! Hides OS socket lifecycle details (resolution, connect with timeout,
//! blocking mode, socket timeouts, looping reads and writes) behind one
//! handle type so the layers above stay platform-agnostic.

mod socket;

pub use socket::{read_full, resolve_ipv4, write_full, SocketHandle};
