//! Collector and writer tasks behind a running publisher.
//!
//! The collector ticks every poll interval, captures a [`Batch`] from the
//! registry and hands it to the writer over a bounded queue. The writer owns
//! the sink, so all network I/O stays on that one task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use errtally_core::{CounterKey, CounterRegistry, Snapshot, SnapshotValue};

use crate::obs::PublisherStats;
use crate::publish::sink::MetricSink;

/// Registry contents captured on one tick.
#[derive(Debug, Clone)]
pub(crate) struct Batch {
    pub captured_at: Instant,
    pub snapshots: Vec<Snapshot>,
}

pub(crate) fn spawn_collector(
    handle: &Handle,
    registry: Arc<CounterRegistry>,
    stats: Arc<PublisherStats>,
    period: Duration,
    tx: mpsc::Sender<Batch>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    handle.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                _ = ticker.tick() => {
                    stats.record_tick();
                    let batch = Batch {
                        captured_at: Instant::now(),
                        snapshots: registry.snapshot(),
                    };
                    match tx.try_send(batch) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            stats.record_dropped_batch();
                            tracing::warn!("publish queue full, dropping batch");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => break,
                    }
                }
            }
        }
    })
}

pub(crate) fn spawn_writer(
    handle: &Handle,
    mut sink: Box<dyn MetricSink>,
    mut rx: mpsc::Receiver<Batch>,
    send_as_rate: bool,
    started_at: Instant,
    stats: Arc<PublisherStats>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    handle.spawn(async move {
        let mut rates = RateTracker::new(started_at);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                next = rx.recv() => {
                    let Some(batch) = next else { break; };
                    let out = if send_as_rate {
                        rates.to_rates(&batch)
                    } else {
                        batch.snapshots.clone()
                    };

                    match sink.publish(&out).await {
                        Ok(()) => {
                            stats.record_delivery();
                            rates.commit(&batch);
                        }
                        Err(e) => {
                            stats.record_delivery_failure();
                            tracing::warn!(error = %e, counters = out.len(), "publish failed, retrying next tick");
                        }
                    }
                }
            }
        }

        if let Err(e) = sink.close().await {
            tracing::warn!(error = %e, "closing sink failed");
        }
    })
}

/// Per-second rates relative to the last delivered batch.
///
/// Baselines are keyed by the same identity as the registry and only move on
/// successful delivery, so a failed tick is folded into the next one instead
/// of being lost.
#[derive(Debug)]
pub(crate) struct RateTracker {
    last_at: Instant,
    last_values: HashMap<CounterKey, i64>,
}

impl RateTracker {
    pub fn new(started_at: Instant) -> Self {
        Self {
            last_at: started_at,
            last_values: HashMap::new(),
        }
    }

    pub fn to_rates(&self, batch: &Batch) -> Vec<Snapshot> {
        let secs = batch
            .captured_at
            .saturating_duration_since(self.last_at)
            .as_secs_f64();

        batch
            .snapshots
            .iter()
            .map(|s| {
                let mut out = s.clone();
                if let SnapshotValue::Count(v) = s.value {
                    let prev = self.last_values.get(&s.counter_key()).copied().unwrap_or(0);
                    let rate = if secs > 0.0 { (v - prev) as f64 / secs } else { 0.0 };
                    out.value = SnapshotValue::Rate(rate);
                }
                out
            })
            .collect()
    }

    pub fn commit(&mut self, batch: &Batch) {
        self.last_at = batch.captured_at;
        for s in &batch.snapshots {
            if let SnapshotValue::Count(v) = s.value {
                self.last_values.insert(s.counter_key(), v);
            }
        }
    }
}
