use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Audit log configuration - controls whether decisions are recorded and how many are kept
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Record gate decisions in the in-memory audit log
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Capacity of the log; the oldest entries are evicted once full
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    defaults::DEFAULT_MAX_AUDIT_ENTRIES
}

impl AuditConfig {
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_entries: default_max_entries(),
        }
    }
}
