use cswatch_primitives::network::NetworkMode;
use serde::{Deserialize, Serialize};

use crate::{canary::CanaryConfig, explorer::ExplorerConfig};

/// Default value for `deadline_ms` in [`ProviderConfig`].
const DEFAULT_PROVIDER_DEADLINE_MS: u64 = 60_000;

/// Settings for code that calls out to chain providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Hard bound on a single provider call.
    #[serde(default = "default_provider_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_provider_deadline_ms() -> u64 {
    DEFAULT_PROVIDER_DEADLINE_MS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_PROVIDER_DEADLINE_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Selects both the address version byte and the default explorer.
    #[serde(default)]
    pub network: NetworkMode,

    #[serde(default)]
    pub explorer: ExplorerConfig,

    #[serde(default)]
    pub canary: CanaryConfig,

    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Config {
    /// Explorer endpoint to use, honoring an explicit override.
    pub fn explorer_url(&self) -> &str {
        self.explorer
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_explorer_url())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_load() {
        let config_string = r#"
            network = "testnet"

            [explorer]
            base_url = "http://localhost:3000"
            page_size = 50
            rate_floor_ms = 250
            max_retries = 2
            retry_delay_ms = 1000

            [canary]
            check_interval_ms = 60000
            deadlock_bound_ms = 120000
            keys = ["transfers", "claims"]

            [provider]
            deadline_ms = 30000
        "#;

        let config = toml::from_str::<Config>(config_string);
        assert!(
            config.is_ok(),
            "should be able to load TOML config but got: {:?}",
            config.err()
        );
        let config = config.unwrap();

        assert_eq!(config.network, NetworkMode::Testnet);
        assert_eq!(config.explorer_url(), "http://localhost:3000");
        assert_eq!(config.explorer.page_size, 50);
        // not given, falls back
        assert_eq!(config.explorer.request_timeout_ms, 60_000);
        assert_eq!(config.canary.keys, vec!["transfers", "claims"]);
        assert_eq!(config.provider.deadline_ms, 30_000);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = toml::from_str::<Config>("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.network, NetworkMode::Mainnet);
        assert_eq!(config.explorer_url(), NetworkMode::Mainnet.default_explorer_url());
        assert_eq!(config.explorer.page_size, 100);
        assert_eq!(config.explorer.rate_floor_ms, 1_000);
        assert_eq!(config.explorer.max_retries, 6);
        assert_eq!(config.explorer.retry_delay_ms, 60_000);
        assert_eq!(config.canary.check_interval_ms, 600_000);
        assert_eq!(config.canary.deadlock_bound_ms, 600_000);
        assert_eq!(config.provider.deadline_ms, 60_000);
    }

    #[test]
    fn test_testnet_switches_explorer() {
        let config = toml::from_str::<Config>(r#"network = "testnet""#).unwrap();
        assert_eq!(config.explorer_url(), NetworkMode::Testnet.default_explorer_url());
    }
}
