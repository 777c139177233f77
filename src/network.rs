use crate::address::IpAddress;
use crate::bytes;
use crate::error::{CidrError, Result};
use crate::family::Family;
use crate::list::IpNetworkList;
use crate::prefix::{split_cidr, IpAddressAndPrefix};
use crate::uint::FixedWidthUint;
use log::debug;
use std::fmt::{Display, Error, Formatter};
use std::ops::Add;
use std::str::FromStr;

/// A CIDR block: a network address and a prefix length.
///
/// The address always equals itself masked by the netmask. Ordering is by
/// address, then by prefix with the shorter prefix first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpNetwork {
    address: IpAddress,
    prefix: u8,
    netmask: IpAddress,
}

/// Unwraps a value whose absence would mean the network invariant is broken.
fn must<T>(value: Option<T>, what: &str) -> T {
    match value {
        Some(v) => v,
        None => panic!("IpNetwork invariant violated: {}", what),
    }
}

impl IpNetwork {
    /// Strict construction: fails with [`CidrError::HostBitsSet`] unless
    /// `address` is already the network address for `prefix`.
    pub fn new(address: IpAddress, prefix: u8) -> Result<IpNetwork> {
        let netmask = netmask_for(&address, prefix)?;
        let mut masked = address.clone();
        if masked.mask(&netmask)? != 0 {
            debug!("Rejected {}/{}: host bits set", address, prefix);
            return Err(CidrError::HostBitsSet(format!("{}/{}", address, prefix)));
        }
        Ok(IpNetwork::assemble(masked, prefix, netmask))
    }

    /// Lenient construction from a borrowed address: the address is copied
    /// and the copy is masked down to the network address.
    pub fn new_lenient(address: &IpAddress, prefix: u8) -> Result<IpNetwork> {
        IpNetwork::new_lenient_owned(address.clone(), prefix)
    }

    /// Lenient construction that consumes `address` and masks it in place;
    /// the caller's buffer becomes the network address without a copy.
    pub fn new_lenient_owned(mut address: IpAddress, prefix: u8) -> Result<IpNetwork> {
        let netmask = netmask_for(&address, prefix)?;
        address.mask(&netmask)?;
        Ok(IpNetwork::assemble(address, prefix, netmask))
    }

    /// Parses `address/prefix`, masking away any host bits.
    pub fn parse_lenient(s: &str) -> Result<IpNetwork> {
        let (address, prefix) = split_cidr(s)?;
        IpNetwork::new_lenient_owned(address, prefix)
    }

    fn assemble(address: IpAddress, prefix: u8, netmask: IpAddress) -> IpNetwork {
        debug_assert_eq!(
            address.and(&netmask).ok().as_ref(),
            Some(&address),
            "IpNetwork invariant violated: address is not its own network address"
        );
        IpNetwork {
            address,
            prefix,
            netmask,
        }
    }

    pub(crate) fn netmask_ref(&self) -> &IpAddress {
        &self.netmask
    }

    pub fn contains_address(&self, address: &IpAddress) -> bool {
        address.and(&self.netmask).map_or(false, |a| a == self.address)
    }

    pub fn contains_network(&self, other: &IpNetwork) -> bool {
        self.prefix <= other.prefix
            && other
                .address
                .and(&self.netmask)
                .map_or(false, |a| a == self.address)
    }

    /// `other` covers all of `self`.
    pub fn is_subnet_of(&self, other: &IpNetwork) -> bool {
        self.family() == other.family()
            && self.prefix >= other.prefix
            && self
                .address
                .and(&other.netmask)
                .map_or(false, |a| a == other.address)
    }

    /// `self` covers all of `other`.
    pub fn is_supernet_of(&self, other: &IpNetwork) -> bool {
        other.is_subnet_of(self)
    }

    pub fn overlaps(&self, other: &IpNetwork) -> bool {
        self.contains_network(other) || other.contains_network(self)
    }

    /// The two blocks touch end to start with no gap and no overlap.
    pub fn is_adjacent_to(&self, other: &IpNetwork) -> bool {
        if self.family() != other.family() || self.overlaps(other) {
            return false;
        }
        let (low, high) = if self < other {
            (self, other)
        } else {
            (other, self)
        };
        match low.last_address().checked_add(1) {
            Some(next) => next == high.address,
            None => false,
        }
    }

    /// Equal prefixes, adjacent, and together exactly one block one bit
    /// shorter.
    pub fn can_merge_with(&self, other: &IpNetwork) -> bool {
        if self.prefix != other.prefix || self.prefix == 0 || !self.is_adjacent_to(other) {
            return false;
        }
        let low = if self < other { self } else { other };
        let mut parent = low.address.clone();
        parent.mask_prefix(self.prefix - 1).is_ok() && parent == low.address
    }

    /// The supernet covering both blocks, or `None` if they cannot merge.
    pub fn merge(&self, other: &IpNetwork) -> Option<IpNetwork> {
        if !self.can_merge_with(other) {
            return None;
        }
        let low = if self < other { self } else { other };
        IpNetwork::new(low.address.clone(), self.prefix - 1).ok()
    }

    /// Number of addresses in the block; 2^32 or 2^128 for a `/0`.
    pub fn size(&self) -> FixedWidthUint {
        FixedWidthUint::power_of_two(self.family(), self.host_bits())
    }

    pub fn num_addresses(&self) -> FixedWidthUint {
        self.size()
    }

    fn host_bits(&self) -> u8 {
        self.family().bit_width() - self.prefix
    }

    pub fn network_address(&self) -> &IpAddress {
        &self.address
    }

    pub fn last_address(&self) -> IpAddress {
        must(
            self.address.or(&self.host_mask()).ok(),
            "address and host mask share a family",
        )
    }

    /// IPv4 directed broadcast; none for `/31`, `/32` and any IPv6 network.
    pub fn broadcast_address(&self) -> Option<IpAddress> {
        match self.family() {
            Family::V4 if self.prefix < 31 => Some(self.last_address()),
            _ => None,
        }
    }

    /// Every address from the network address to the last address.
    pub fn address_space(&self) -> AddressRange {
        AddressRange::new(self.address.clone(), self.last_address())
    }

    /// Host addresses: the single address of a host route, both ends of a
    /// point-to-point link, otherwise the block without its network address
    /// and, for IPv4, without its broadcast address.
    pub fn assignable_host_range(&self) -> AddressRange {
        let first = if self.host_bits() <= 1 {
            self.address.clone()
        } else {
            must(self.address.checked_add(1), "block has more than two addresses")
        };
        AddressRange::new(first, self.last_assignable_host())
    }

    pub fn first_assignable_host(&self) -> IpAddress {
        match self.family() {
            Family::V4 if self.host_bits() > 1 => {
                must(self.address.checked_add(1), "block has more than two addresses")
            }
            _ => self.address.clone(),
        }
    }

    pub fn last_assignable_host(&self) -> IpAddress {
        let last = self.last_address();
        match self.family() {
            Family::V4 if self.host_bits() > 1 => {
                must(last.checked_sub(1), "block has more than two addresses")
            }
            _ => last,
        }
    }

    /// The block one bit shorter containing this one; `None` for `/0`.
    pub fn supernet(&self) -> Option<IpNetwork> {
        if self.prefix == 0 {
            return None;
        }
        IpNetwork::new_lenient(&self.address, self.prefix - 1).ok()
    }

    /// The other half of [`IpNetwork::supernet`].
    pub fn sibling(&self) -> Option<IpNetwork> {
        let parent = self.supernet()?;
        let address = if parent.address == self.address {
            self.last_address().checked_add(1)?
        } else {
            parent.address
        };
        IpNetwork::new(address, self.prefix).ok()
    }

    /// The block of `new_prefix` containing this one.
    pub fn supernet_to(&self, new_prefix: u8) -> Result<IpNetwork> {
        if new_prefix > self.prefix {
            return Err(CidrError::WrongPrefixDirection {
                from: self.prefix,
                to: new_prefix,
            });
        }
        IpNetwork::new_lenient(&self.address, new_prefix)
    }

    /// Lazily splits the block into consecutive blocks of `new_prefix`.
    pub fn subnets(&self, new_prefix: u8) -> Result<Subnets> {
        if new_prefix < self.prefix {
            return Err(CidrError::WrongPrefixDirection {
                from: self.prefix,
                to: new_prefix,
            });
        }
        Ok(Subnets {
            next: Some(IpNetwork::new(self.address.clone(), new_prefix)?),
            last: self.last_address(),
        })
    }

    /// The addresses both blocks share. Two CIDR blocks are either nested or
    /// disjoint, so the overlap is always the smaller block.
    pub fn intersection(&self, other: &IpNetwork) -> Option<IpNetwork> {
        if self.contains_network(other) {
            Some(other.clone())
        } else if other.contains_network(self) {
            Some(self.clone())
        } else {
            None
        }
    }

    /// The fewest blocks covering this one with `other` taken out, in
    /// address order. Empty when `other` covers all of `self`.
    pub fn exclude(&self, other: &IpNetwork) -> Vec<IpNetwork> {
        if !self.overlaps(other) {
            return vec![self.clone()];
        }
        let last = self.last_address();
        let other_last = other.last_address();
        let mut out = Vec::new();
        if other.address > self.address {
            let end = must(other.address.checked_sub(1), "other starts above self");
            out.extend(must(
                IpNetworkList::summarize_range(&self.address, &end).ok(),
                "range inside self",
            ));
        }
        if other_last < last {
            let start = must(other_last.checked_add(1), "other ends below self");
            out.extend(must(
                IpNetworkList::summarize_range(&start, &last).ok(),
                "range inside self",
            ));
        }
        out
    }

    /// RFC 5280 iPAddress form: address octets followed by netmask octets.
    pub fn to_x509_bytes(&self) -> Vec<u8> {
        let mut out = self.address.octets().to_vec();
        out.extend_from_slice(self.netmask.octets());
        out
    }

    /// Accepts a bare address (full-width network) or address plus
    /// contiguous netmask; host bits in the address are masked away.
    pub fn from_x509_bytes(data: &[u8]) -> Result<IpNetwork> {
        match data.len() {
            4 | 16 => {
                let address = IpAddress::from_bytes(data)?;
                let prefix = address.family().bit_width();
                IpNetwork::new(address, prefix)
            }
            8 | 32 => {
                let (address, mask) = data.split_at(data.len() / 2);
                let prefix = bytes::netmask_to_prefix(mask)?;
                IpNetwork::new_lenient_owned(IpAddress::from_bytes(address)?, prefix)
            }
            len => Err(CidrError::InvalidLength { len }),
        }
    }

    pub fn with_netmask(&self) -> String {
        format!("{}/{}", self.address, self.netmask)
    }

    pub fn with_hostmask(&self) -> String {
        format!("{}/{}", self.address, self.host_mask())
    }
}

fn netmask_for(address: &IpAddress, prefix: u8) -> Result<IpAddress> {
    let max = address.family().bit_width();
    if prefix > max {
        return Err(CidrError::PrefixOutOfRange {
            prefix: prefix as u32,
            max,
        });
    }
    IpAddress::netmask(address.family(), prefix)
}

impl IpAddressAndPrefix for IpNetwork {
    fn address(&self) -> &IpAddress {
        &self.address
    }

    fn prefix(&self) -> u8 {
        self.prefix
    }

    fn network(&self) -> &IpNetwork {
        self
    }
}

/// Merges two sibling blocks; `None` when [`IpNetwork::can_merge_with`]
/// does not hold.
impl<'a> Add<&'a IpNetwork> for &'a IpNetwork {
    type Output = Option<IpNetwork>;
    fn add(self, rhs: &'a IpNetwork) -> Option<IpNetwork> {
        self.merge(rhs)
    }
}

/// Strict: host bits in the text are rejected.
impl FromStr for IpNetwork {
    type Err = CidrError;
    fn from_str(s: &str) -> Result<Self> {
        let (address, prefix) = split_cidr(s)?;
        IpNetwork::new(address, prefix)
    }
}

impl Display for IpNetwork {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        Display::fmt(&self.address, f)?;
        write!(f, "/{}", self.prefix)
    }
}

/// Inclusive, lazily generated run of addresses.
///
/// Each call on the network starts a fresh run from its current state. A
/// run ends at its last address but may hold up to 2^128 addresses; bound
/// it with `take` before collecting.
#[derive(Debug, Clone)]
pub struct AddressRange {
    next: Option<IpAddress>,
    last: IpAddress,
}

impl AddressRange {
    fn new(first: IpAddress, last: IpAddress) -> AddressRange {
        let next = if first <= last { Some(first) } else { None };
        AddressRange { next, last }
    }
}

impl Iterator for AddressRange {
    type Item = IpAddress;

    fn next(&mut self) -> Option<IpAddress> {
        let current = self.next.take()?;
        if current != self.last {
            self.next = current.checked_add(1);
        }
        Some(current)
    }
}

/// Consecutive equal-sized blocks covering a parent network.
#[derive(Debug, Clone)]
pub struct Subnets {
    next: Option<IpNetwork>,
    last: IpAddress,
}

impl Iterator for Subnets {
    type Item = IpNetwork;

    fn next(&mut self) -> Option<IpNetwork> {
        let current = self.next.take()?;
        let end = current.last_address();
        if end != self.last {
            self.next = end
                .checked_add(1)
                .and_then(|a| IpNetwork::new(a, current.prefix).ok());
        }
        Some(current)
    }
}
