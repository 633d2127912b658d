//! Liveness signal.
//!
//! A heartbeat writes a fixed value to its own counter on a fixed cadence, so
//! a backend can tell "no errors" apart from "appender is gone". Each
//! appender owns one heartbeat; it is never shared.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Level;

use errtally_core::error::{Result, TallyError};
use errtally_core::{Counter, CounterKey, CounterRegistry, CounterTags, Fingerprint};

use crate::config::HeartbeatConfig;

/// Fingerprint of the heartbeat counter: this module and the line below.
pub fn heartbeat_fingerprint() -> Fingerprint {
    Fingerprint::new(module_path!(), line!())
}

pub struct Heartbeat {
    registry: Arc<CounterRegistry>,
    key: CounterKey,
    cfg: HeartbeatConfig,
    task: Mutex<Option<JoinHandle<()>>>,
    ticks: Arc<AtomicU64>,
}

impl Heartbeat {
    pub fn new(registry: Arc<CounterRegistry>, tags: CounterTags, cfg: HeartbeatConfig) -> Self {
        Self {
            registry,
            key: CounterKey::new(tags, heartbeat_fingerprint()),
            cfg,
            task: Mutex::new(None),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule the periodic task. Returns `Ok(false)` if already scheduled.
    ///
    /// The claim and the spawn happen under the task lock, so a racing `stop`
    /// either sees the new timer or runs entirely before it. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) -> Result<bool> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| TallyError::NoRuntime)?;

        let mut slot = self.slot();
        if slot.is_some() {
            tracing::debug!(subsystem = %self.key.tags.subsystem, "heartbeat already scheduled");
            return Ok(false);
        }

        *slot = Some(handle.spawn(run(
            Arc::clone(&self.registry),
            self.key.clone(),
            self.cfg.value,
            self.cfg.initial_delay(),
            self.cfg.interval(),
            Arc::clone(&self.ticks),
        )));
        drop(slot);

        tracing::info!(
            subsystem = %self.key.tags.subsystem,
            interval_seconds = self.cfg.interval_seconds,
            "heartbeat started"
        );
        Ok(true)
    }

    /// Cancel pending and future ticks. Safe to call repeatedly or before
    /// `start`.
    pub fn stop(&self) {
        let Some(task) = self.slot().take() else {
            return;
        };
        task.abort();
        tracing::info!(subsystem = %self.key.tags.subsystem, "heartbeat stopped");
    }

    pub fn is_scheduled(&self) -> bool {
        self.slot().is_some()
    }

    /// Registry key of this heartbeat's counter.
    pub fn counter_key(&self) -> &CounterKey {
        &self.key
    }

    /// Ticks executed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(task) = self.slot().take() {
            task.abort();
        }
    }
}

async fn run(
    registry: Arc<CounterRegistry>,
    key: CounterKey,
    value: i64,
    initial_delay: Duration,
    period: Duration,
    ticks: Arc<AtomicU64>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        emit(&registry, &key, value);
        ticks.fetch_add(1, Ordering::Relaxed);
    }
}

fn emit(registry: &CounterRegistry, key: &CounterKey, value: i64) {
    registry
        .get_or_create(key, || {
            Counter::new(key.tags.clone(), key.fingerprint.clone(), Level::ERROR.as_str())
        })
        .set(value);
}
