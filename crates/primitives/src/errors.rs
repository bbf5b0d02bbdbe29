use thiserror::Error;

use crate::network::NetworkMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("invalid base58: {0}")]
    Base58(String),

    #[error("ss58 checksum mismatch")]
    Checksum,

    #[error("ss58 prefix {got} does not belong to {mode}")]
    WrongNetwork { got: u16, mode: NetworkMode },

    #[error("ss58 address is not a 32-byte account id")]
    NotAnAccountId,
}
