//! Severity filter: which log levels get counted.

use std::str::FromStr;

use tracing::Level;

use crate::error::{Result, TallyError};

/// Decides whether an event's level is counted.
///
/// The default counts `ERROR` only. Additional tiers must be listed
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityFilter {
    tiers: Vec<Level>,
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self {
            tiers: vec![Level::ERROR],
        }
    }
}

impl SeverityFilter {
    pub fn new(tiers: impl IntoIterator<Item = Level>) -> Self {
        let mut tiers: Vec<Level> = tiers.into_iter().collect();
        tiers.sort();
        tiers.dedup();
        Self { tiers }
    }

    /// Build from level names such as `"ERROR"` or `"warn"`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(TallyError::Config(
                "counted_levels must not be empty".into(),
            ));
        }
        let mut tiers = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let level = Level::from_str(name)
                .map_err(|_| TallyError::Config(format!("unknown log level: {name}")))?;
            tiers.push(level);
        }
        Ok(Self::new(tiers))
    }

    pub fn is_eligible(&self, level: &Level) -> bool {
        self.tiers.contains(level)
    }

    pub fn tiers(&self) -> &[Level] {
        &self.tiers
    }
}
