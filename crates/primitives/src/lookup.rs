//! Small lookup tables the watchdog's callers consult around a scan.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::*;

use crate::{
    address::{Address, CanonicalAccountId},
    errors::AddressError,
    network::NetworkMode,
    ss58::NetworkTextAddress,
};

/// Deployed contract addresses keyed by the contract version that produced
/// them.
#[derive(Clone, Debug, Default)]
pub struct ContractVersions {
    by_version: BTreeMap<String, Address>,
}

impl ContractVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `address` under `version`, returning the address it replaced.
    pub fn insert(&mut self, version: impl Into<String>, address: Address) -> Option<Address> {
        self.by_version.insert(version.into(), address)
    }

    pub fn address_of(&self, version: &str) -> Option<Address> {
        self.by_version.get(version).copied()
    }

    /// Finds which version an address was deployed as.
    pub fn version_of(&self, address: &Address) -> Option<&str> {
        self.by_version
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(v, _)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_version.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_version.is_empty()
    }
}

impl FromIterator<(String, Address)> for ContractVersions {
    fn from_iter<T: IntoIterator<Item = (String, Address)>>(iter: T) -> Self {
        Self {
            by_version: iter.into_iter().collect(),
        }
    }
}

/// Association between a native agent account and the EVM address it acts
/// for.
pub trait AddressBook: Send + Sync {
    fn evm_address_of(&self, agent: &CanonicalAccountId) -> Option<Address>;

    fn agent_of(&self, evm: &Address) -> Option<CanonicalAccountId>;

    fn associate(&self, agent: CanonicalAccountId, evm: Address);

    /// Associates an agent given in its network text form. The text must
    /// carry the version byte of `mode`.
    fn associate_native(
        &self,
        agent: &str,
        mode: NetworkMode,
        evm: Address,
    ) -> Result<CanonicalAccountId, AddressError> {
        let id = NetworkTextAddress::parse(agent, mode)?;
        self.associate(id, evm);
        Ok(id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAddressBook {
    inner: RwLock<BookMaps>,
}

#[derive(Debug, Default)]
struct BookMaps {
    to_evm: HashMap<CanonicalAccountId, Address>,
    to_agent: HashMap<Address, CanonicalAccountId>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddressBook for InMemoryAddressBook {
    fn evm_address_of(&self, agent: &CanonicalAccountId) -> Option<Address> {
        self.inner.read().to_evm.get(agent).copied()
    }

    fn agent_of(&self, evm: &Address) -> Option<CanonicalAccountId> {
        self.inner.read().to_agent.get(evm).copied()
    }

    fn associate(&self, agent: CanonicalAccountId, evm: Address) {
        let mut maps = self.inner.write();

        // Keep both directions one-to-one.
        if let Some(old_evm) = maps.to_evm.insert(agent, evm) {
            if old_evm != evm {
                debug!(?agent, %old_evm, %evm, "replacing agent association");
                maps.to_agent.remove(&old_evm);
            }
        }
        if let Some(old_agent) = maps.to_agent.insert(evm, agent) {
            if old_agent != agent {
                maps.to_evm.remove(&old_agent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_lookup_both_ways() {
        let v1 = Address::new([1; 20]);
        let v2 = Address::new([2; 20]);
        let versions: ContractVersions = [("v1".to_string(), v1), ("v1.1".to_string(), v2)]
            .into_iter()
            .collect();

        assert_eq!(versions.address_of("v1.1"), Some(v2));
        assert_eq!(versions.version_of(&v1), Some("v1"));
        assert_eq!(versions.version_of(&Address::new([3; 20])), None);
        assert_eq!(versions.len(), 2);
    }

    #[test]
    fn test_address_book_stays_one_to_one() {
        let book = InMemoryAddressBook::new();
        let agent = CanonicalAccountId::new([9; 32]);
        let first = Address::new([1; 20]);
        let second = Address::new([2; 20]);

        book.associate(agent, first);
        assert_eq!(book.evm_address_of(&agent), Some(first));
        assert_eq!(book.agent_of(&first), Some(agent));

        book.associate(agent, second);
        assert_eq!(book.evm_address_of(&agent), Some(second));
        assert_eq!(book.agent_of(&first), None);
        assert_eq!(book.agent_of(&second), Some(agent));
    }

    #[test]
    fn test_associate_native_agent_text() {
        let book = InMemoryAddressBook::new();
        let evm = Address::new([5; 20]);
        let agent = CanonicalAccountId::new([9; 32]);
        let text = NetworkTextAddress::from_account_id(&agent, NetworkMode::Testnet);

        let err = book
            .associate_native(text.as_str(), NetworkMode::Mainnet, evm)
            .unwrap_err();
        assert_eq!(
            err,
            AddressError::WrongNetwork {
                got: 72,
                mode: NetworkMode::Mainnet
            }
        );
        assert_eq!(book.agent_of(&evm), None);

        let id = book
            .associate_native(text.as_str(), NetworkMode::Testnet, evm)
            .unwrap();
        assert_eq!(id, agent);
        assert_eq!(book.evm_address_of(&agent), Some(evm));
    }
}
