//! Shared error type across errtally crates.

use thiserror::Error;

/// Stable, machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration (bad yaml, out-of-range value).
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Sink connect / publish / close failed.
    Transport,
    /// A scheduler was started outside a tokio runtime.
    NoRuntime,
}

impl ErrorKind {
    /// String representation used in logs and assertions.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::NoRuntime => "NO_RUNTIME",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and appender.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("transport: {0}")]
    Transport(String),
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl TallyError {
    /// Map the error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TallyError::Config(_) => ErrorKind::Config,
            TallyError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            TallyError::Transport(_) => ErrorKind::Transport,
            TallyError::NoRuntime => ErrorKind::NoRuntime,
        }
    }

    /// Transport errors are retried on the next publish tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, TallyError::Transport(_))
    }
}
