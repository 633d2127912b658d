//! errtally core: runtime-free primitives for counting error call sites.
//!
//! This crate defines the call-site fingerprint, the severity filter, the
//! counter registry and the snapshot shape handed to sinks. It carries no
//! async runtime so the counting path can be driven from any thread.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! The counting path never fails; everything else surfaces as
//! `TallyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod fingerprint;
pub mod metric;
pub mod severity;

/// Shared result type.
pub use error::{Result, TallyError};
pub use fingerprint::{CallerFrame, Fingerprint};
pub use metric::{Counter, CounterKey, CounterRegistry, CounterTags, Snapshot, SnapshotValue};
pub use severity::SeverityFilter;
