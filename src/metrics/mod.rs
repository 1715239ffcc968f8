//! Metrics for framewire
//!
//! Recorded through the `metrics` facade; install any recorder to collect them.
//! Without a recorder every call is a no-op.

pub mod counters;
pub mod histograms;
pub mod labels;
