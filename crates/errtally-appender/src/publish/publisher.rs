use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use errtally_core::error::{Result, TallyError};
use errtally_core::CounterRegistry;

use crate::config::PublisherConfig;
use crate::obs::{PublisherStats, StatsSnapshot};
use crate::publish::pipeline::{spawn_collector, spawn_writer};
use crate::publish::sink::SinkConnector;

/// How long `stop` waits for each publish task before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Result of [`Publisher::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// This call started the loop.
    Started,
    /// A loop was already running (or being started or stopped); nothing
    /// changed.
    AlreadyRunning,
    /// A `stop` arrived while this call was connecting. The sink was closed
    /// and no loop was installed.
    Cancelled,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    collector: JoinHandle<()>,
    writer: JoinHandle<()>,
    address: String,
}

/// Publisher slot. Every transition happens under the slot lock, which is
/// never held across an await.
enum Slot {
    Idle,
    /// Claimed by a `start` that is still connecting.
    Starting { cancelled: bool },
    Running(RunningLoop),
    /// Shutdown signalled; a `stop` is joining the tasks.
    Stopping,
}

/// Owns the single publish loop of a process.
///
/// Construct once at the composition root and share via `Arc` with every
/// appender. Any number of `start` calls, concurrent or not, leave exactly one
/// loop and one sink connection running. Dropping the publisher signals its
/// tasks to exit.
pub struct Publisher {
    registry: Arc<CounterRegistry>,
    connector: Arc<dyn SinkConnector>,
    slot: Mutex<Slot>,
    stats: Arc<PublisherStats>,
}

impl Publisher {
    pub fn new(registry: Arc<CounterRegistry>, connector: Arc<dyn SinkConnector>) -> Self {
        Self {
            registry,
            connector,
            slot: Mutex::new(Slot::Idle),
            stats: Arc::new(PublisherStats::default()),
        }
    }

    /// Start the publish loop unless one is already running.
    ///
    /// Config is validated before claiming the slot. If the connector fails
    /// the claim is released so a later call can retry. A `stop` that lands
    /// while connecting wins: the fresh sink is closed and
    /// [`StartOutcome::Cancelled`] returned. Must be called from within a
    /// tokio runtime.
    pub async fn start(&self, cfg: &PublisherConfig) -> Result<StartOutcome> {
        cfg.validate()?;
        let handle = Handle::try_current().map_err(|_| TallyError::NoRuntime)?;

        {
            let mut slot = self.slot();
            if !matches!(*slot, Slot::Idle) {
                tracing::debug!(address = %cfg.address(), "publisher already running");
                return Ok(StartOutcome::AlreadyRunning);
            }
            *slot = Slot::Starting { cancelled: false };
        }
        let claim = StartingClaim { publisher: self };

        let mut sink = match self.connector.connect(cfg).await {
            Ok(sink) => sink,
            Err(e) => {
                drop(claim);
                tracing::warn!(address = %cfg.address(), error = %e, "sink connect failed");
                return Err(e);
            }
        };

        {
            let mut slot = self.slot();
            if let Slot::Starting { cancelled: false } = *slot {
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let (batch_tx, batch_rx) = mpsc::channel(cfg.queue_size);

                let collector = spawn_collector(
                    &handle,
                    Arc::clone(&self.registry),
                    Arc::clone(&self.stats),
                    cfg.poll_interval(),
                    batch_tx,
                    shutdown_rx.clone(),
                );
                let writer = spawn_writer(
                    &handle,
                    sink,
                    batch_rx,
                    cfg.send_as_rate,
                    Instant::now(),
                    Arc::clone(&self.stats),
                    shutdown_rx,
                );

                *slot = Slot::Running(RunningLoop {
                    shutdown: shutdown_tx,
                    collector,
                    writer,
                    address: cfg.address(),
                });
                drop(slot);

                tracing::info!(
                    address = %cfg.address(),
                    poll_interval_seconds = cfg.poll_interval_seconds,
                    queue_size = cfg.queue_size,
                    send_as_rate = cfg.send_as_rate,
                    "publisher started"
                );
                return Ok(StartOutcome::Started);
            }
        }
        drop(claim);

        if let Err(e) = sink.close().await {
            tracing::warn!(error = %e, "closing sink failed");
        }
        tracing::info!(address = %cfg.address(), "publisher start cancelled by stop");
        Ok(StartOutcome::Cancelled)
    }

    /// Cancel the loop and close the sink. No-op when not running.
    ///
    /// No tick starts after this returns. A delivery already in flight gets
    /// a grace period to finish. A `start` still connecting is cancelled.
    pub async fn stop(&self) {
        let running = {
            let mut slot = self.slot();
            match std::mem::replace(&mut *slot, Slot::Stopping) {
                Slot::Running(running) => {
                    let _ = running.shutdown.send(true);
                    running
                }
                Slot::Starting { .. } => {
                    *slot = Slot::Starting { cancelled: true };
                    tracing::debug!("publisher stop cancels the pending start");
                    return;
                }
                idle_or_stopping => {
                    *slot = idle_or_stopping;
                    tracing::debug!("publisher not running");
                    return;
                }
            }
        };

        let RunningLoop {
            shutdown: _shutdown,
            collector,
            writer,
            address,
        } = running;
        join_with_grace(collector).await;
        join_with_grace(writer).await;

        *self.slot() = Slot::Idle;
        tracing::info!(%address, "publisher stopped");
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.slot(), Slot::Running(_))
    }

    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases a `Starting` claim when `start` fails or its future is dropped
/// mid-connect.
struct StartingClaim<'a> {
    publisher: &'a Publisher,
}

impl Drop for StartingClaim<'_> {
    fn drop(&mut self) {
        let mut slot = self.publisher.slot();
        if matches!(*slot, Slot::Starting { .. }) {
            *slot = Slot::Idle;
        }
    }
}

async fn join_with_grace(mut handle: JoinHandle<()>) {
    if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
        tracing::warn!("publish task did not stop in time, aborting");
        handle.abort();
    }
}
