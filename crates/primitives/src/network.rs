use std::fmt;

use serde::{Deserialize, Serialize};

/// SS58 version of the production network.
pub const MAINNET_SS58_PREFIX: u16 = 71;

/// SS58 version of the test network.
pub const TESTNET_SS58_PREFIX: u16 = 72;

pub const MAINNET_EXPLORER_URL: &str = "https://api.3dpscan.io";
pub const TESTNET_EXPLORER_URL: &str = "https://test-api.3dpscan.io";

/// Which native network the watchdog talks to.
///
/// This is the only place the address version byte and the explorer endpoint
/// are chosen, so the two can't drift apart. A wrong version byte doesn't
/// error anywhere, it just asks the indexer about somebody else's account.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    #[default]
    Mainnet,
    Testnet,
}

impl NetworkMode {
    pub fn from_is_testnet(is_testnet: bool) -> Self {
        if is_testnet {
            Self::Testnet
        } else {
            Self::Mainnet
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, Self::Testnet)
    }

    pub fn ss58_prefix(&self) -> u16 {
        match self {
            Self::Mainnet => MAINNET_SS58_PREFIX,
            Self::Testnet => TESTNET_SS58_PREFIX,
        }
    }

    pub fn default_explorer_url(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_EXPLORER_URL,
            Self::Testnet => TESTNET_EXPLORER_URL,
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}
