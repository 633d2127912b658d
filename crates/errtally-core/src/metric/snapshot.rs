use std::fmt;
use std::sync::Arc;

use crate::fingerprint::Fingerprint;
use crate::metric::counter::{CounterKey, CounterTags};

/// Exported value of one counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotValue {
    /// Cumulative count since process start.
    Count(i64),
    /// Per-second rate over the interval since the last delivered snapshot.
    Rate(f64),
}

impl fmt::Display for SnapshotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotValue::Count(v) => write!(f, "{v}"),
            SnapshotValue::Rate(v) => write!(f, "{v}"),
        }
    }
}

/// Point-in-time view of one counter, as handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub subsystem: Arc<str>,
    pub owner: Arc<str>,
    pub fingerprint: Fingerprint,
    /// Rendered form of `fingerprint`, used as the metric path segment.
    pub fingerprint_key: String,
    pub severity: Arc<str>,
    pub value: SnapshotValue,
}

impl Snapshot {
    /// Dotted metric path: `owner.subsystem.fingerprint_key.severity`.
    pub fn metric_path(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.owner, self.subsystem, self.fingerprint_key, self.severity
        )
    }

    /// Registry identity of the counter this snapshot was taken from.
    pub fn counter_key(&self) -> CounterKey {
        CounterKey::new(
            CounterTags::new(Arc::clone(&self.subsystem), Arc::clone(&self.owner)),
            self.fingerprint.clone(),
        )
    }

    pub fn count(&self) -> Option<i64> {
        match self.value {
            SnapshotValue::Count(v) => Some(v),
            SnapshotValue::Rate(_) => None,
        }
    }
}
