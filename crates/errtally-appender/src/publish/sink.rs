use async_trait::async_trait;

use errtally_core::error::Result;
use errtally_core::Snapshot;

use crate::config::PublisherConfig;

/// An open connection to a metrics backend. Owned by the publish loop's
/// writer task; never touched from application threads.
#[async_trait]
pub trait MetricSink: Send {
    /// Deliver one batch. An error leaves counters untouched; the next tick
    /// sends cumulative values again.
    async fn publish(&mut self, batch: &[Snapshot]) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Opens sink connections. Called once per running transition of the
/// publisher.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    async fn connect(&self, cfg: &PublisherConfig) -> Result<Box<dyn MetricSink>>;
}

/// Connector for [`TracingSink`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSinkConnector;

#[async_trait]
impl SinkConnector for TracingSinkConnector {
    async fn connect(&self, cfg: &PublisherConfig) -> Result<Box<dyn MetricSink>> {
        Ok(Box::new(TracingSink {
            address: cfg.address(),
        }))
    }
}

/// Writes every snapshot as a `debug` event on target `errtally::sink`.
/// Useful in development and as a stand-in when no backend is wired.
#[derive(Debug)]
pub struct TracingSink {
    address: String,
}

#[async_trait]
impl MetricSink for TracingSink {
    async fn publish(&mut self, batch: &[Snapshot]) -> Result<()> {
        for s in batch {
            tracing::debug!(
                target: "errtally::sink",
                address = %self.address,
                metric = %s.metric_path(),
                value = %s.value,
                "snapshot"
            );
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        tracing::debug!(target: "errtally::sink", address = %self.address, "sink closed");
        Ok(())
    }
}
