use crate::address::IpAddress;
use crate::error::{CidrError, Result};
use crate::network::IpNetwork;
use crate::prefix::{split_cidr, IpAddressAndPrefix};
use std::fmt::{Display, Error, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// A host address bound to the network it lives in.
///
/// The network is shared, not copied: interfaces created from the same
/// `Arc<IpNetwork>` point at one instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpInterface {
    address: IpAddress,
    prefix: u8,
    network: Arc<IpNetwork>,
}

impl IpInterface {
    /// Derives the network leniently from `address` and `prefix`.
    pub fn new(address: IpAddress, prefix: u8) -> Result<IpInterface> {
        let network = IpNetwork::new_lenient(&address, prefix)?;
        Ok(IpInterface::associate(address, Arc::new(network)))
    }

    /// Binds `address` to an existing network without re-deriving it.
    pub fn in_network(address: IpAddress, network: &Arc<IpNetwork>) -> Result<IpInterface> {
        if !network.contains_address(&address) {
            return Err(CidrError::AddressOutsideNetwork(
                address.to_string(),
                network.to_string(),
            ));
        }
        Ok(IpInterface::associate(address, Arc::clone(network)))
    }

    pub(crate) fn associate(address: IpAddress, network: Arc<IpNetwork>) -> IpInterface {
        debug_assert!(network.contains_address(&address));
        IpInterface {
            address,
            prefix: network.prefix(),
            network,
        }
    }

    /// One interface per assignable host of `network`, all sharing it.
    pub fn hosts(network: &Arc<IpNetwork>) -> impl Iterator<Item = IpInterface> {
        let shared = Arc::clone(network);
        network
            .assignable_host_range()
            .map(move |a| IpInterface::associate(a, Arc::clone(&shared)))
    }

    pub fn shared_network(&self) -> &Arc<IpNetwork> {
        &self.network
    }

    pub fn with_netmask(&self) -> String {
        format!("{}/{}", self.address, self.netmask())
    }
}

impl IpAddressAndPrefix for IpInterface {
    fn address(&self) -> &IpAddress {
        &self.address
    }

    fn prefix(&self) -> u8 {
        self.prefix
    }

    fn network(&self) -> &IpNetwork {
        &self.network
    }
}

impl FromStr for IpInterface {
    type Err = CidrError;
    fn from_str(s: &str) -> Result<Self> {
        let (address, prefix) = split_cidr(s)?;
        IpInterface::new(address, prefix)
    }
}

impl Display for IpInterface {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        Display::fmt(&self.address, f)?;
        write!(f, "/{}", self.prefix)
    }
}
