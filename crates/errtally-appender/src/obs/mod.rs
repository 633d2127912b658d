//! Self-observation for the publish loop.
//!
//! Plain atomics, read by tests and by hosts that want to surface how the
//! publisher itself is doing (dropped batches, failed deliveries).

pub mod stats;

pub use stats::{PublisherStats, StatsSnapshot};
