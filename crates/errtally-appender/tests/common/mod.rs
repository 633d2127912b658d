#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use errtally_appender::config::PublisherConfig;
use errtally_appender::{MetricSink, SinkConnector};
use errtally_core::error::{Result, TallyError};
use errtally_core::Snapshot;

/// Everything the recording sinks saw, shared with the test.
#[derive(Default)]
pub struct SinkLog {
    batches: Mutex<Vec<Vec<Snapshot>>>,
    pub closed: AtomicUsize,
    /// Number of upcoming publishes that fail.
    pub fail_next: AtomicUsize,
    publish_delay: Mutex<Option<Duration>>,
}

impl SinkLog {
    pub fn batches(&self) -> Vec<Vec<Snapshot>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn last_batch(&self) -> Option<Vec<Snapshot>> {
        self.batches.lock().unwrap().last().cloned()
    }

    pub fn set_publish_delay(&self, d: Duration) {
        *self.publish_delay.lock().unwrap() = Some(d);
    }
}

pub struct RecordingConnector {
    pub connects: AtomicUsize,
    pub fail_connect: AtomicBool,
    connect_delay: Mutex<Option<Duration>>,
    pub log: Arc<SinkLog>,
}

impl RecordingConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connects: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            connect_delay: Mutex::new(None),
            log: Arc::new(SinkLog::default()),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn set_connect_delay(&self, d: Duration) {
        *self.connect_delay.lock().unwrap() = Some(d);
    }
}

#[async_trait]
impl SinkConnector for RecordingConnector {
    async fn connect(&self, cfg: &PublisherConfig) -> Result<Box<dyn MetricSink>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        // give racing starters a chance to run while this one connects
        let delay = *self.connect_delay.lock().unwrap();
        match delay {
            Some(d) => tokio::time::sleep(d).await,
            None => tokio::task::yield_now().await,
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(TallyError::Transport(format!("connection refused: {}", cfg.address())));
        }
        Ok(Box::new(RecordingSink {
            log: Arc::clone(&self.log),
        }))
    }
}

pub struct RecordingSink {
    log: Arc<SinkLog>,
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn publish(&mut self, batch: &[Snapshot]) -> Result<()> {
        let delay = *self.log.publish_delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        let failed = self
            .log
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(TallyError::Transport("broken pipe".into()));
        }

        self.log.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn publisher_config(poll_interval_seconds: u64) -> PublisherConfig {
    PublisherConfig {
        host: "metrics.test".into(),
        port: 2003,
        poll_interval_seconds,
        queue_size: 4,
        send_as_rate: false,
    }
}
