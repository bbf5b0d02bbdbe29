use std::path::PathBuf;

use argh::FromArgs;
use cswatch_primitives::address::Address;
use toml::value::Table;

use crate::errors::ConfigError;

#[derive(Debug, Clone, FromArgs)]
#[argh(description = "Lists the native-chain blocks an address has transfer activity in")]
pub struct Args {
    // Config non-overriding args
    #[argh(option, short = 'c', description = "path to configuration")]
    pub config: Option<PathBuf>,

    /// Address whose activity is scanned, as 0x-prefixed hex.
    #[argh(option, description = "address to scan")]
    pub address: Address,

    /// Heights below this are dropped from the result and end paging early.
    #[argh(option, description = "lowest block height of interest")]
    pub from_block: Option<u64>,

    /// Lock keys the deadlock canary probes on top of those in the config.
    #[argh(option, description = "lock key to watch for deadlocks")]
    pub watch: Vec<String>,

    // Config overriding args
    #[argh(switch, description = "use the test network")]
    pub testnet: bool,

    #[argh(option, description = "explorer base url")]
    pub explorer_url: Option<String>,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o explorer.page_size=50 -o canary.check_interval_ms=1000`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Get strings of overrides gathered from args.
    pub fn get_overrides(&self) -> Vec<String> {
        let mut overrides = self.overrides.clone();
        overrides.extend_from_slice(&self.get_direct_overrides());
        overrides
    }

    /// Overrides passed directly as args and not as overrides.
    fn get_direct_overrides(&self) -> Vec<String> {
        let mut overrides = Vec::new();
        if self.testnet {
            overrides.push("network=testnet".to_string());
        }
        if let Some(url) = &self.explorer_url {
            overrides.push(format!("explorer.base_url={url}"));
        }
        overrides
    }
}

type Override = (String, toml::Value);

/// Parses an override. This first splits the string by '=' to get key and
/// value and then splits the key by '.' which is the update path.
pub fn parse_override(override_str: &str) -> Result<Override, ConfigError> {
    let (key, value_str) = override_str
        .split_once('=')
        .ok_or(ConfigError::InvalidOverride(override_str.to_string()))?;
    Ok((key.to_string(), parse_value(value_str)))
}

/// Apply override to config.
pub fn apply_override(
    path: &str,
    value: toml::Value,
    table: &mut Table,
) -> Result<(), ConfigError> {
    match path.split_once('.') {
        None => {
            table.insert(path.to_string(), value);
            Ok(())
        }
        Some((key, rest)) => {
            if let Some(t) = table.get_mut(key).and_then(|v| v.as_table_mut()) {
                apply_override(rest, value, t)
            } else if table.contains_key(key) {
                Err(ConfigError::TraverseNonTableAt(key.to_string()))
            } else {
                Err(ConfigError::MissingKey(key.to_string()))
            }
        }
    }
}

/// Parses a string into a toml value. First tries as `i64`, then as `bool` and
/// then defaults to `String`.
fn parse_value(str_value: &str) -> toml::Value {
    str_value
        .parse::<i64>()
        .map(toml::Value::Integer)
        .or_else(|_| str_value.parse::<bool>().map(toml::Value::Boolean))
        .unwrap_or_else(|_| toml::Value::String(str_value.to_string()))
}

#[cfg(test)]
mod test {
    use cswatch_config::Config;
    use cswatch_primitives::network::NetworkMode;

    use super::*;

    fn args_with(overrides: Vec<&str>) -> Args {
        Args {
            config: None,
            address: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap(),
            from_block: None,
            watch: Vec::new(),
            testnet: true,
            explorer_url: Some("http://localhost:8080".to_string()),
            overrides: overrides.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_apply_override() {
        let config = Config::default();
        let mut toml = toml::Value::try_from(&config).unwrap();
        let table = toml.as_table_mut().unwrap();
        let args = args_with(vec![
            "explorer.page_size=50",
            "explorer.max_retries=2",
            "canary.check_interval_ms=1000",
            "provider.deadline_ms=5000",
        ]);

        let overrides = args
            .get_overrides()
            .into_iter()
            .map(|x| parse_override(&x).unwrap());

        for (path, val) in overrides {
            apply_override(&path, val, table).unwrap();
        }

        let new_config: Config = toml.try_into().unwrap();

        assert_eq!(new_config.network, NetworkMode::Testnet);
        assert_eq!(new_config.explorer.page_size, 50);
        assert_eq!(new_config.explorer.max_retries, 2);
        assert_eq!(new_config.canary.check_interval_ms, 1000);
        assert_eq!(new_config.provider.deadline_ms, 5000);
        assert_eq!(new_config.explorer_url(), "http://localhost:8080");
    }

    #[test]
    fn test_override_errors() {
        assert!(matches!(
            parse_override("explorer.page_size"),
            Err(ConfigError::InvalidOverride(_))
        ));

        let mut toml = toml::Value::try_from(Config::default()).unwrap();
        let table = toml.as_table_mut().unwrap();

        let err = apply_override("nope.key", toml::Value::Integer(1), table).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(k) if k == "nope"));

        let err = apply_override("network.key", toml::Value::Integer(1), table).unwrap_err();
        assert!(matches!(err, ConfigError::TraverseNonTableAt(k) if k == "network"));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), toml::Value::Integer(42));
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(
            parse_value("https://api.example"),
            toml::Value::String("https://api.example".to_string())
        );
    }
}
