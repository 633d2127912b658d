//! Publisher lifecycle and the sink capability it drives.
//!
//! One [`Publisher`] per process owns the periodic push of every registry
//! counter to the sink. Sinks are opaque `publish(batch)` capabilities; the
//! backend wire protocol lives behind [`SinkConnector`].

mod pipeline;
pub mod publisher;
pub mod sink;

pub use publisher::{Publisher, StartOutcome};
pub use sink::{MetricSink, SinkConnector, TracingSink, TracingSinkConnector};
