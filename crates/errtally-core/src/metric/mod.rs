//! Counters, the counter registry, and the snapshot shape handed to sinks.

mod counter;
mod registry;
mod snapshot;

pub use counter::{Counter, CounterKey, CounterTags};
pub use registry::CounterRegistry;
pub use snapshot::{Snapshot, SnapshotValue};
