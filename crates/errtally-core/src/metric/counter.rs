use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::fingerprint::Fingerprint;
use crate::metric::snapshot::{Snapshot, SnapshotValue};

/// Tags shared by every counter an appender creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterTags {
    pub subsystem: Arc<str>,
    pub owner: Arc<str>,
}

impl CounterTags {
    pub fn new(subsystem: impl Into<Arc<str>>, owner: impl Into<Arc<str>>) -> Self {
        Self {
            subsystem: subsystem.into(),
            owner: owner.into(),
        }
    }
}

/// Registry identity of a counter: the creating appender's tags plus the call
/// site. Two appenders logging from the same line keep separate counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub tags: CounterTags,
    pub fingerprint: Fingerprint,
}

impl CounterKey {
    pub fn new(tags: CounterTags, fingerprint: Fingerprint) -> Self {
        Self { tags, fingerprint }
    }
}

/// One call site's count. Shared by reference between the registry, the
/// counting path, and the publish loop.
#[derive(Debug)]
pub struct Counter {
    key: CounterKey,
    severity: Arc<str>,
    value: AtomicI64,
}

impl Counter {
    pub fn new(tags: CounterTags, fingerprint: Fingerprint, severity: impl Into<Arc<str>>) -> Self {
        Self {
            key: CounterKey::new(tags, fingerprint),
            severity: severity.into(),
            value: AtomicI64::new(0),
        }
    }

    /// Increment by 1.
    pub fn increment(&self) {
        self.add(1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, v: i64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    /// Overwrite the value. Used by sentinel counters that carry a constant.
    pub fn set(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn key(&self) -> &CounterKey {
        &self.key
    }

    pub fn tags(&self) -> &CounterTags {
        &self.key.tags
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.key.fingerprint
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            subsystem: Arc::clone(&self.key.tags.subsystem),
            owner: Arc::clone(&self.key.tags.owner),
            fingerprint: self.key.fingerprint.clone(),
            fingerprint_key: self.key.fingerprint.key(),
            severity: Arc::clone(&self.severity),
            value: SnapshotValue::Count(self.value()),
        }
    }
}
