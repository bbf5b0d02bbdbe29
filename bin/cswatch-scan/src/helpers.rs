use std::{fs, path::Path, time::Duration};

use cswatch_config::{canary::CanaryConfig, Config};
use format_serde_error::SerdeError;
use tracing::*;

use crate::{
    args::{apply_override, parse_override, Args},
    errors::{ConfigError, InitError},
};

/// Loads the config file if given, falls back to defaults otherwise, and
/// applies overrides from the command line on top.
pub fn get_config(args: &Args) -> Result<Config, InitError> {
    let base = match args.config.as_deref() {
        Some(path) => load_configuration(path)?,
        None => {
            debug!("no config file given, using defaults");
            Config::default()
        }
    };

    Ok(apply_overrides(base, &args.get_overrides())?)
}

fn load_configuration(path: &Path) -> Result<Config, InitError> {
    let config_str = fs::read_to_string(path)?;
    let conf =
        toml::from_str::<Config>(&config_str).map_err(|err| SerdeError::new(config_str, err))?;
    Ok(conf)
}

fn apply_overrides(config: Config, overrides: &[String]) -> Result<Config, ConfigError> {
    if overrides.is_empty() {
        return Ok(config);
    }

    let mut toml = toml::Value::try_from(&config)?;
    let table = toml
        .as_table_mut()
        .ok_or_else(|| ConfigError::TraverseNonTableAt("<root>".to_string()))?;

    for o in overrides {
        let (path, val) = parse_override(o)?;
        apply_override(&path, val, table)?;
    }

    Ok(toml.try_into()?)
}

pub fn canary_config(config: &CanaryConfig) -> cswatch_lockwatch::CanaryConfig {
    cswatch_lockwatch::CanaryConfig {
        check_interval: Duration::from_millis(config.check_interval_ms),
        deadlock_bound: Duration::from_millis(config.deadlock_bound_ms),
    }
}

/// Lock key held for the duration of a scan of `address`.
pub fn scan_lock_key(address: &impl std::fmt::Display) -> String {
    format!("scan:{address}")
}

#[cfg(test)]
mod tests {
    use cswatch_primitives::network::NetworkMode;

    use super::*;

    #[test]
    fn test_apply_overrides_on_partial_file() {
        let config: Config = toml::from_str("network = \"mainnet\"").unwrap();
        let overrides = vec![
            "network=testnet".to_string(),
            "explorer.rate_floor_ms=250".to_string(),
        ];

        let config = apply_overrides(config, &overrides).unwrap();
        assert_eq!(config.network, NetworkMode::Testnet);
        assert_eq!(config.explorer.rate_floor_ms, 250);
        assert_eq!(config.explorer.page_size, 100);
    }

    #[test]
    fn test_canary_config_conversion() {
        let cfg = canary_config(&CanaryConfig {
            check_interval_ms: 1_500,
            deadlock_bound_ms: 250,
            keys: vec![],
        });
        assert_eq!(cfg.check_interval, Duration::from_millis(1_500));
        assert_eq!(cfg.deadlock_bound, Duration::from_millis(250));
    }
}
