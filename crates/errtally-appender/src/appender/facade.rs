use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::Level;

use errtally_core::error::Result;
use errtally_core::{
    CallerFrame, Counter, CounterKey, CounterRegistry, CounterTags, Fingerprint, SeverityFilter,
};

use crate::appender::ErrorCountLayer;
use crate::config::{PublisherConfig, TallyConfig};
use crate::heartbeat::Heartbeat;
use crate::publish::Publisher;

/// Owner tag of every counter an appender creates.
pub const ERRORS_METRIC_GROUP: &str = "errors";

/// Counts error events per call site and drives the publisher and heartbeat
/// lifecycles.
///
/// Cheap to clone; clones share state. Several appenders may share one
/// [`Publisher`]; each owns its own heartbeat.
#[derive(Clone)]
pub struct ErrorCountAppender {
    inner: Arc<AppenderInner>,
}

struct AppenderInner {
    enabled: bool,
    publisher_cfg: PublisherConfig,
    heartbeat_enabled: bool,
    filter: SeverityFilter,
    tags: CounterTags,
    registry: Arc<CounterRegistry>,
    publisher: Arc<Publisher>,
    heartbeat: Heartbeat,
    started: AtomicBool,
}

impl ErrorCountAppender {
    /// Build an appender counting into `publisher`'s registry.
    pub fn new(cfg: &TallyConfig, publisher: Arc<Publisher>) -> Result<Self> {
        cfg.validate()?;

        let registry = Arc::clone(publisher.registry());
        let tags = CounterTags::new(cfg.appender.subsystem.as_str(), ERRORS_METRIC_GROUP);
        let heartbeat = Heartbeat::new(Arc::clone(&registry), tags.clone(), cfg.heartbeat.clone());

        Ok(Self {
            inner: Arc::new(AppenderInner {
                enabled: cfg.appender.enabled,
                publisher_cfg: cfg.publisher.clone(),
                heartbeat_enabled: cfg.heartbeat.enabled,
                filter: cfg.appender.severity_filter()?,
                tags,
                registry,
                publisher,
                heartbeat,
                started: AtomicBool::new(false),
            }),
        })
    }

    /// Start the shared publisher (if enabled) and this appender's heartbeat.
    ///
    /// A publisher already started by another appender is left as is.
    pub async fn start(&self) -> Result<()> {
        let inner = &self.inner;

        if inner.enabled {
            inner.publisher.start(&inner.publisher_cfg).await?;
        } else {
            tracing::debug!(subsystem = %inner.tags.subsystem, "publishing disabled");
        }

        if inner.heartbeat_enabled {
            inner.heartbeat.start()?;
        }

        inner.started.store(true, Ordering::Release);
        tracing::info!(subsystem = %inner.tags.subsystem, "appender started");
        Ok(())
    }

    /// Stop counting, stop the heartbeat, and stop the shared publisher.
    pub async fn stop(&self) {
        let inner = &self.inner;
        inner.started.store(false, Ordering::Release);
        inner.heartbeat.stop();
        inner.publisher.stop().await;
        tracing::info!(subsystem = %inner.tags.subsystem, "appender stopped");
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Counting path. Never blocks on I/O and never fails.
    pub fn on_event(&self, level: &Level, frame: CallerFrame<'_>) {
        let inner = &self.inner;
        if !inner.started.load(Ordering::Acquire) || !inner.filter.is_eligible(level) {
            return;
        }

        let key = CounterKey::new(inner.tags.clone(), Fingerprint::from(frame));
        inner
            .registry
            .get_or_create(&key, || {
                Counter::new(key.tags.clone(), key.fingerprint.clone(), level.as_str())
            })
            .increment();
    }

    pub fn layer(&self) -> ErrorCountLayer {
        ErrorCountLayer::new(self.clone())
    }

    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.inner.registry
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.inner.heartbeat
    }
}
