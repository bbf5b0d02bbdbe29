//! Watchdog discovery configuration, as read from the TOML config file.

pub mod canary;
pub mod config;
pub mod explorer;

pub use config::{Config, ProviderConfig};
