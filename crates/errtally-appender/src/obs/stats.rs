use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PublisherStats {
    ticks: AtomicU64,
    batches_dropped: AtomicU64,
    deliveries: AtomicU64,
    delivery_failures: AtomicU64,
}

/// Point-in-time copy of [`PublisherStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub batches_dropped: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
}

impl PublisherStats {
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_batch(&self) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}
