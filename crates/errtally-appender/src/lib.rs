//! errtally appender library entry.
//!
//! Counts error log events per call site and pushes the counts to a metrics
//! sink on a fixed interval, alongside a heartbeat counter. Wiring:
//!
//! ```no_run
//! # async fn wire() -> errtally_core::Result<()> {
//! use std::sync::Arc;
//! use tracing_subscriber::prelude::*;
//! use errtally_appender::{config, ErrorCountAppender, Publisher, TracingSinkConnector};
//! use errtally_core::CounterRegistry;
//!
//! let cfg = config::load_from_file("errtally.yaml")?;
//! let registry = Arc::new(CounterRegistry::new());
//! let publisher = Arc::new(Publisher::new(registry, Arc::new(TracingSinkConnector)));
//!
//! let appender = ErrorCountAppender::new(&cfg, publisher)?;
//! appender.start().await?;
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(appender.layer())
//!     .init();
//! # Ok(())
//! # }
//! ```

pub mod appender;
pub mod config;
pub mod heartbeat;
pub mod obs;
pub mod publish;

pub use appender::{ErrorCountAppender, ErrorCountLayer, ERRORS_METRIC_GROUP};
pub use heartbeat::Heartbeat;
pub use publish::{MetricSink, Publisher, SinkConnector, StartOutcome, TracingSink, TracingSinkConnector};
