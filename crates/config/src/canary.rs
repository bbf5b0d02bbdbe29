use serde::{Deserialize, Serialize};

/// Configuration for the lock deadlock canary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanaryConfig {
    /// How often each watched key is probed.
    pub check_interval_ms: u64,

    /// How long a probe may wait for the lock before the process is stopped.
    pub deadlock_bound_ms: u64,

    /// Lock keys to watch from startup.
    pub keys: Vec<String>,
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 10 * 60 * 1_000,
            deadlock_bound_ms: 10 * 60 * 1_000,
            keys: Vec::new(),
        }
    }
}
