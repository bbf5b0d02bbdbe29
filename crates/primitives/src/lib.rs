//! Primitive types shared by the watchdog discovery crates.
//!
//! The bridge contracts and the bot speak in 20-byte EVM addresses while the
//! native chain (and its activity indexer) speaks in 32-byte account ids
//! rendered as SS58 text. Everything needed to move between the two lives here.

pub mod address;
pub mod errors;
pub mod lookup;
pub mod network;
pub mod ss58;

pub mod prelude {
    pub use crate::address::{Address, CanonicalAccountId};
    pub use crate::errors::AddressError;
    pub use crate::network::NetworkMode;
    pub use crate::ss58::NetworkTextAddress;
}
