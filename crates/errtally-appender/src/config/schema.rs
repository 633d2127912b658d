use std::time::Duration;

use serde::Deserialize;

use errtally_core::error::{Result, TallyError};
use errtally_core::SeverityFilter;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    pub version: u32,

    #[serde(default)]
    pub appender: AppenderSection,

    #[serde(default)]
    pub publisher: PublisherConfig,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

impl TallyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::UnsupportedVersion);
        }

        self.appender.validate()?;
        self.publisher.validate()?;
        self.heartbeat.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppenderSection {
    /// When false the publisher is never started; the heartbeat still runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_subsystem")]
    pub subsystem: String,

    #[serde(default = "default_counted_levels")]
    pub counted_levels: Vec<String>,
}

impl Default for AppenderSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            subsystem: default_subsystem(),
            counted_levels: default_counted_levels(),
        }
    }
}

impl AppenderSection {
    pub fn validate(&self) -> Result<()> {
        if self.subsystem.is_empty() {
            return Err(TallyError::Config("appender.subsystem must not be empty".into()));
        }
        if self
            .subsystem
            .chars()
            .any(|c| c == '.' || c.is_whitespace())
        {
            return Err(TallyError::Config(
                "appender.subsystem must be a single path segment (no '.' or whitespace)".into(),
            ));
        }
        self.severity_filter().map(|_| ())
    }

    pub fn severity_filter(&self) -> Result<SeverityFilter> {
        SeverityFilter::from_names(&self.counted_levels)
    }
}

/// Settings for the shared publish loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u32,

    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    #[serde(default)]
    pub send_as_rate: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            poll_interval_seconds: default_poll_interval_seconds(),
            queue_size: default_queue_size(),
            send_as_rate: false,
        }
    }
}

impl PublisherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() || self.host.chars().any(char::is_whitespace) {
            return Err(TallyError::Config(
                "publisher.host must be a non-empty host name without whitespace".into(),
            ));
        }
        if !(1..=65535).contains(&self.port) {
            return Err(TallyError::Config(
                "publisher.port must be between 1 and 65535".into(),
            ));
        }
        if self.poll_interval_seconds == 0 {
            return Err(TallyError::Config(
                "publisher.poll_interval_seconds must be at least 1".into(),
            ));
        }
        if self.queue_size == 0 {
            return Err(TallyError::Config(
                "publisher.queue_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// `host:port`, for connectors and logs.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_heartbeat_interval_seconds")]
    pub interval_seconds: u64,

    #[serde(default)]
    pub initial_delay_seconds: u64,

    /// Constant written to the heartbeat counter on every tick.
    #[serde(default)]
    pub value: i64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_seconds: default_heartbeat_interval_seconds(),
            initial_delay_seconds: 0,
            value: 0,
        }
    }
}

impl HeartbeatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_seconds == 0 {
            return Err(TallyError::Config(
                "heartbeat.interval_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }
}

fn default_enabled() -> bool {
    true
}
fn default_subsystem() -> String {
    "errors".into()
}
fn default_counted_levels() -> Vec<String> {
    vec!["ERROR".into()]
}
fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u32 {
    2003
}
fn default_poll_interval_seconds() -> u64 {
    60
}
fn default_queue_size() -> usize {
    10
}
fn default_heartbeat_interval_seconds() -> u64 {
    60
}
