use crate::address::IpAddress;
use crate::bytes;
use crate::error::{CidrError, Result};
use crate::family::Family;
use crate::network::IpNetwork;
use crate::special::{self, SpecialRange};
use log::debug;

/// An address paired with a prefix length. Implemented by [`IpNetwork`]
/// and [`crate::IpInterface`]; every range predicate answers for the
/// network the value belongs to.
pub trait IpAddressAndPrefix {
    fn address(&self) -> &IpAddress;

    fn prefix(&self) -> u8;

    /// The network this value belongs to (itself, for a network).
    fn network(&self) -> &IpNetwork;

    fn family(&self) -> Family {
        self.address().family()
    }

    fn netmask(&self) -> IpAddress {
        self.network().netmask_ref().clone()
    }

    fn host_mask(&self) -> IpAddress {
        self.netmask().invert()
    }

    fn is_in(&self, kind: SpecialRange) -> bool {
        special::network_in(kind, self.network())
    }

    fn is_unspecified(&self) -> bool {
        self.is_in(SpecialRange::Unspecified)
    }

    fn is_loopback(&self) -> bool {
        self.is_in(SpecialRange::Loopback)
    }

    fn is_link_local(&self) -> bool {
        self.is_in(SpecialRange::LinkLocal)
    }

    fn is_multicast(&self) -> bool {
        self.is_in(SpecialRange::Multicast)
    }

    fn is_private(&self) -> bool {
        self.is_in(SpecialRange::Private)
    }

    fn is_documentation(&self) -> bool {
        self.is_in(SpecialRange::Documentation)
    }

    fn is_reserved(&self) -> bool {
        self.is_in(SpecialRange::Reserved)
    }

    fn is_unique_local(&self) -> bool {
        self.is_in(SpecialRange::UniqueLocal)
    }

    fn is_site_local(&self) -> bool {
        self.is_in(SpecialRange::SiteLocal)
    }

    fn is_discard(&self) -> bool {
        self.is_in(SpecialRange::Discard)
    }
}

/// Splits `address[/prefix]`. The prefix may be decimal or, for IPv4, a
/// dotted netmask or hostmask; without one the prefix is the full bit width.
pub(crate) fn split_cidr(s: &str) -> Result<(IpAddress, u8)> {
    let mut it = s.splitn(2, '/');
    let address: IpAddress = it.next().unwrap_or_default().parse()?;
    let prefix = match it.next() {
        None => address.family().bit_width(),
        Some(p) => parse_prefix(p, address.family()).map_err(|e| {
            debug!("Rejected prefix in {:?}: {}", s, e);
            e
        })?,
    };
    Ok((address, prefix))
}

fn parse_prefix(p: &str, family: Family) -> Result<u8> {
    let max = family.bit_width();
    if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) {
        let prefix: u32 = p
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(p.to_owned()))?;
        if prefix > max as u32 {
            return Err(CidrError::PrefixOutOfRange { prefix, max });
        }
        return Ok(prefix as u8);
    }
    if family == Family::V4 && p.contains('.') {
        let mask: IpAddress = p
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(p.to_owned()))?;
        // A netmask first, then a hostmask (`0.0.0.255` is /24).
        return bytes::netmask_to_prefix(mask.octets())
            .or_else(|_| bytes::netmask_to_prefix(&bytes::invert(mask.octets())));
    }
    Err(CidrError::InvalidPrefix(p.to_owned()))
}
