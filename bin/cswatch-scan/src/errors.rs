use format_serde_error::SerdeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    MalformedConfig(#[from] SerdeError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Override string is not of the form `key=value`.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),

    #[error("expected table at '{0}'")]
    TraverseNonTableAt(String),

    #[error("missing key: '{0}'")]
    MissingKey(String),

    #[error("config does not deserialize after overrides: {0}")]
    Rebuild(#[from] toml::de::Error),

    #[error("config does not serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
}
