//! Call-site identity.
//!
//! A fingerprint is the literal pair (qualified name, line). It is used as the
//! registry key as-is; it is never reduced to a hash first, so two call sites
//! can only share a counter when their canonical names are equal.

use std::fmt;
use std::sync::Arc;

/// Source location of a log event as reported by the logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerFrame<'a> {
    pub qualified_name: &'a str,
    pub line: u32,
}

impl<'a> CallerFrame<'a> {
    pub fn new(qualified_name: &'a str, line: u32) -> Self {
        Self { qualified_name, line }
    }
}

/// Immutable identity of one call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    qualified_name: Arc<str>,
    line: u32,
}

impl Fingerprint {
    pub fn new(qualified_name: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            line,
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Canonical key, safe as a single metric path segment.
    ///
    /// `crate::module.Type` at line 42 renders as `crate-module-Type-42`. The
    /// line is always the last `-` separated segment.
    pub fn key(&self) -> String {
        format!("{}-{}", canonical_name(&self.qualified_name), self.line)
    }
}

impl From<CallerFrame<'_>> for Fingerprint {
    fn from(frame: CallerFrame<'_>) -> Self {
        Fingerprint::new(frame.qualified_name, frame.line)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Replace path separators (`::` and `.`) with `-`.
pub fn canonical_name(qualified_name: &str) -> String {
    qualified_name.replace("::", "-").replace('.', "-")
}
