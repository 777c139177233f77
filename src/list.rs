use crate::address::IpAddress;
use crate::error::{CidrError, Result};
use crate::network::IpNetwork;
use crate::prefix::IpAddressAndPrefix;
use crate::uint::FixedWidthUint;
use log::trace;
use std::collections::BTreeMap;
use std::fmt::{Display, Error, Formatter};
use std::iter::FromIterator;

/// A set of disjoint networks kept in address order. Inserting absorbs
/// covered networks and merges sibling halves into their supernet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpNetworkList {
    inner: BTreeMap<IpAddress, IpNetwork>,
}

impl Display for IpNetworkList {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        for v in self.inner.values() {
            writeln!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl IpNetworkList {
    pub fn new() -> Self {
        IpNetworkList {
            inner: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNetwork> {
        self.inner.values()
    }

    pub fn into_vec(self) -> Vec<IpNetwork> {
        self.inner.into_iter().map(|(_, v)| v).collect()
    }

    pub fn insert(&mut self, mut network: IpNetwork) {
        loop {
            // Entries are disjoint, so only the closest lower key can cover us.
            if let Some((_, v)) = self.inner.range(..=network.address().clone()).next_back() {
                if v.contains_network(&network) {
                    trace!("{} already covered by {}", network, v);
                    return;
                }
            }
            let covered: Vec<IpAddress> = self
                .inner
                .range(network.address().clone()..=network.last_address())
                .map(|(k, _)| k.clone())
                .collect();
            for k in covered {
                trace!("{} absorbs {}", network, k);
                self.inner.remove(&k);
            }
            if let Some(sibling) = network.sibling() {
                if self.inner.get(sibling.address()) == Some(&sibling) {
                    self.inner.remove(sibling.address());
                    if let Some(merged) = network.merge(&sibling) {
                        trace!("{} merges with {} into {}", network, sibling, merged);
                        network = merged;
                        continue;
                    }
                }
            }
            self.inner.insert(network.address().clone(), network);
            break;
        }
    }

    /// The fewest networks that exactly cover `first..=last`.
    pub fn summarize_range(first: &IpAddress, last: &IpAddress) -> Result<Self> {
        if first.family() != last.family() {
            return Err(CidrError::FamilyMismatch);
        }
        if first > last {
            return Err(CidrError::InvalidNetwork(format!("{} - {}", first, last)));
        }
        let family = first.family();
        let bits = family.bit_width() as u32;
        let one = FixedWidthUint::one(family);
        let mut list = IpNetworkList::new();
        let mut start = first.clone();
        loop {
            let span = last
                .to_uint()
                .checked_sub(start.to_uint())
                .and_then(|d| d.checked_add(one))
                .ok_or_else(|| CidrError::InvalidNetwork(format!("{} - {}", start, last)))?;
            let host_bits = start
                .to_uint()
                .trailing_zeros()
                .min(bits)
                .min(span.bit_length() - 1);
            let network = IpNetwork::new(start, (bits - host_bits) as u8)?;
            let end = network.last_address();
            list.insert(network);
            if &end == last {
                return Ok(list);
            }
            start = end
                .checked_add(1)
                .ok_or_else(|| CidrError::InvalidNetwork(end.to_string()))?;
        }
    }
}

impl Extend<IpNetwork> for IpNetworkList {
    fn extend<I: IntoIterator<Item = IpNetwork>>(&mut self, iter: I) {
        for n in iter {
            self.insert(n);
        }
    }
}

impl FromIterator<IpNetwork> for IpNetworkList {
    fn from_iter<I: IntoIterator<Item = IpNetwork>>(iter: I) -> Self {
        let mut list = IpNetworkList::new();
        list.extend(iter);
        list
    }
}

impl IntoIterator for IpNetworkList {
    type Item = IpNetwork;
    type IntoIter = std::vec::IntoIter<IpNetwork>;
    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

/// Collapses `networks` into the smallest equivalent set, in address order.
pub fn collapse<I: IntoIterator<Item = IpNetwork>>(networks: I) -> Vec<IpNetwork> {
    networks.into_iter().collect::<IpNetworkList>().into_vec()
}
