//! SS58 text encoding of native account ids.

use std::fmt;

use bitcoin::base58;
use blake2::{digest::Output, Blake2b512, Digest};

use crate::{address::CanonicalAccountId, errors::AddressError, network::NetworkMode};

const CHECKSUM_PREIMAGE_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

/// An account id in the native chain's human readable form.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NetworkTextAddress(String);

impl NetworkTextAddress {
    /// Encodes `id` with the version byte of `mode`.
    pub fn from_account_id(id: &CanonicalAccountId, mode: NetworkMode) -> Self {
        let mut buf = encode_prefix(mode.ss58_prefix());
        buf.extend_from_slice(id.as_bytes());
        let sum = checksum(&buf);
        buf.extend_from_slice(&sum[..CHECKSUM_LEN]);
        Self(base58::encode(&buf))
    }

    /// Decodes a text address, checking its checksum and that it was encoded
    /// for `mode`.
    pub fn parse(text: &str, mode: NetworkMode) -> Result<CanonicalAccountId, AddressError> {
        let raw = base58::decode(text).map_err(|e| AddressError::Base58(e.to_string()))?;
        let (prefix, prefix_len) = decode_prefix(&raw)?;

        if raw.len() != prefix_len + CanonicalAccountId::LEN + CHECKSUM_LEN {
            return Err(AddressError::NotAnAccountId);
        }

        let (body, sum) = raw.split_at(raw.len() - CHECKSUM_LEN);
        if &checksum(body)[..CHECKSUM_LEN] != sum {
            return Err(AddressError::Checksum);
        }

        if prefix != mode.ss58_prefix() {
            return Err(AddressError::WrongNetwork { got: prefix, mode });
        }

        let mut id = [0; CanonicalAccountId::LEN];
        id.copy_from_slice(&body[prefix_len..]);
        Ok(CanonicalAccountId::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkTextAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetworkTextAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn checksum(body: &[u8]) -> Output<Blake2b512> {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREIMAGE_PREFIX);
    hasher.update(body);
    hasher.finalize()
}

/// Identifiers below 64 take one byte, everything up to 16383 takes two.
fn encode_prefix(ident: u16) -> Vec<u8> {
    debug_assert!(ident < 16_384, "ss58: prefix out of range");
    if ident < 64 {
        return vec![ident as u8];
    }
    let first = (((ident & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000;
    let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
    vec![first, second]
}

fn decode_prefix(raw: &[u8]) -> Result<(u16, usize), AddressError> {
    match raw {
        [b0, ..] if *b0 < 64 => Ok((*b0 as u16, 1)),
        [b0, b1, ..] if *b0 < 128 => {
            let lower = ((b0 & 0b0011_1111) << 2) | (b1 >> 6);
            let upper = b1 & 0b0011_1111;
            Ok(((lower as u16) | ((upper as u16) << 8), 2))
        }
        _ => Err(AddressError::NotAnAccountId),
    }
}
