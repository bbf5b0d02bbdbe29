use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::AddressError;

/// Number of zero bytes the native chain puts in front of an EVM address to
/// get its account id.
const ACCOUNT_ID_PAD: usize = 12;

/// A 20-byte EVM-style account address.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Builds an address from a slice that the caller already knows to be 20
    /// bytes long.
    ///
    /// # Panics
    ///
    /// If `bytes` is not exactly 20 bytes. Anything else is a bug upstream.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let buf: [u8; 20] = bytes
            .try_into()
            .unwrap_or_else(|_| panic!("address: expected 20 bytes, got {}", bytes.len()));
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Left-pads the address with zeros into the native chain's account space.
    pub fn to_canonical_account_id(&self) -> CanonicalAccountId {
        let mut buf = [0; CanonicalAccountId::LEN];
        buf[ACCOUNT_ID_PAD..].copy_from_slice(&self.0);
        CanonicalAccountId(buf)
    }
}

impl From<[u8; 20]> for Address {
    fn from(value: [u8; 20]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s).map_err(|e| AddressError::Hex(e.to_string()))?;
        let buf: [u8; 20] = raw.as_slice().try_into().map_err(|_| AddressError::Length {
            expected: Self::LEN,
            got: raw.len(),
        })?;
        Ok(Self(buf))
    }
}

/// A 32-byte native account id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CanonicalAccountId([u8; 32]);

impl CanonicalAccountId {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the EVM address this id was derived from, if it is a padded one.
    pub fn to_evm_address(&self) -> Option<Address> {
        let (pad, rest) = self.0.split_at(ACCOUNT_ID_PAD);
        if pad.iter().any(|b| *b != 0) {
            return None;
        }
        Some(Address::from_slice(rest))
    }
}

impl From<Address> for CanonicalAccountId {
    fn from(value: Address) -> Self {
        value.to_canonical_account_id()
    }
}

impl fmt::Debug for CanonicalAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_is_left_padded() {
        let addr = Address::new([0xab; 20]);
        let id = addr.to_canonical_account_id();

        assert_eq!(id.as_bytes().len(), 32);
        assert_eq!(&id.as_bytes()[..12], &[0u8; 12]);
        assert_eq!(&id.as_bytes()[12..], addr.as_bytes());
        assert_eq!(id.to_evm_address(), Some(addr));
    }

    #[test]
    fn test_canonical_id_keeps_leading_zero_bytes() {
        let mut raw = [0u8; 20];
        raw[19] = 1;
        let id = Address::new(raw).to_canonical_account_id();

        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(id, CanonicalAccountId::new(expected));
    }

    #[test]
    fn test_native_id_without_padding_has_no_evm_form() {
        let id = CanonicalAccountId::new([7; 32]);
        assert_eq!(id.to_evm_address(), None);
    }

    #[test]
    fn test_parse_address() {
        let addr: Address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
        assert_eq!(addr.as_bytes()[0], 0xd8);
        assert_eq!(
            addr.to_string(),
            "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
        );

        let err = "0x1234".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            AddressError::Length {
                expected: 20,
                got: 2
            }
        );
        assert!(matches!("0xzz".parse::<Address>(), Err(AddressError::Hex(_))));
    }

    #[test]
    #[should_panic(expected = "expected 20 bytes")]
    fn test_from_slice_rejects_bad_length() {
        Address::from_slice(&[0; 32]);
    }

    #[test]
    fn test_address_serde_as_hex_string() {
        let addr = Address::new([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
