use std::sync::Arc;

use dashmap::DashMap;

use crate::metric::counter::{Counter, CounterKey};
use crate::metric::snapshot::Snapshot;

/// Counter registry: `(tags, fingerprint) -> Counter`.
///
/// Append-only for the life of the process. Construct once at the
/// composition root and share via `Arc`; appenders with different tags
/// sharing one registry never touch each other's counters.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: DashMap<CounterKey, Arc<Counter>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    /// Resolve the counter for `key`, building it with `factory` if absent.
    ///
    /// Insertion happens under the shard lock of `key`, so racing callers all
    /// get the one installed counter and `factory` runs at most once per key.
    pub fn get_or_create<F>(&self, key: &CounterKey, factory: F) -> Arc<Counter>
    where
        F: FnOnce() -> Counter,
    {
        if let Some(existing) = self.counters.get(key) {
            return Arc::clone(existing.value());
        }

        let entry = self.counters.entry(key.clone()).or_insert_with(|| {
            let counter = factory();
            debug_assert_eq!(counter.key(), key);
            Arc::new(counter)
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, key: &CounterKey) -> Option<Arc<Counter>> {
        self.counters.get(key).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Read every counter, ordered by subsystem, owner, then key. Values are
    /// loaded one by one; increments racing with the read show up in the
    /// next snapshot.
    pub fn snapshot(&self) -> Vec<Snapshot> {
        let mut out: Vec<Snapshot> = self.counters.iter().map(|r| r.value().snapshot()).collect();
        out.sort_by(|a, b| {
            (&a.subsystem, &a.owner, &a.fingerprint_key, a.fingerprint.qualified_name()).cmp(&(
                &b.subsystem,
                &b.owner,
                &b.fingerprint_key,
                b.fingerprint.qualified_name(),
            ))
        });
        out
    }
}
