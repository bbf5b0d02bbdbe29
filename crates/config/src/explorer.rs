use serde::{Deserialize, Serialize};

/// Configuration for the explorer client and the activity scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Overrides the network's default explorer endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Transfers requested per page.
    pub page_size: u32,

    /// Minimum time between two requests from the same scanner.
    pub rate_floor_ms: u64,

    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,

    /// Retries of a whole scan after the first attempt fails.
    pub max_retries: u16,

    /// Wait between scan attempts.
    pub retry_delay_ms: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: 100,
            rate_floor_ms: 1_000,
            request_timeout_ms: 60_000,
            max_retries: 6,
            retry_delay_ms: 60_000,
        }
    }
}
