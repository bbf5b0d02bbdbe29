//! Discovers which native-chain blocks an address has transfer activity in,
//! by paging through the block explorer's transfer index.

pub mod client;
pub mod error;
pub mod scanner;
pub mod types;

pub use client::{DeadlineBound, ExplorerClient, TransferIndex};
pub use error::{ExplorerError, ScanError};
pub use scanner::{ActivityScanner, ScannerConfig};
