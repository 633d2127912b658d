//! Appender facade and its `tracing` adapter.
//!
//! The facade is the composition point: severity filter, fingerprint,
//! registry lookup on the counting path, and start/stop of the shared
//! publisher and its own heartbeat.

mod facade;
mod layer;

pub use facade::{ErrorCountAppender, ERRORS_METRIC_GROUP};
pub use layer::ErrorCountLayer;
