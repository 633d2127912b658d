//! Top-level facade crate for errtally.
//!
//! Re-exports core types and the appender library so users can depend on a single crate.

pub mod core {
    pub use errtally_core::*;
}

pub mod appender {
    pub use errtally_appender::*;
}
