//! Well-known address ranges.

use crate::address::IpAddress;
use crate::family::Family;
use crate::network::IpNetwork;
use crate::prefix::IpAddressAndPrefix;
use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialRange {
    Unspecified,
    Loopback,
    LinkLocal,
    Multicast,
    /// RFC 1918 for IPv4, unique-local `fc00::/7` for IPv6.
    Private,
    Documentation,
    Reserved,
    /// IPv6 only.
    UniqueLocal,
    /// IPv6 only, deprecated by RFC 3879.
    SiteLocal,
    /// IPv6 only, RFC 6666.
    Discard,
}

fn networks(literals: &[&str]) -> Vec<IpNetwork> {
    literals
        .iter()
        .map(|s| s.parse().expect("Not possible"))
        .collect()
}

lazy_static! {
    static ref V4_UNSPECIFIED: Vec<IpNetwork> = networks(&["0.0.0.0/32"]);
    static ref V4_LOOPBACK: Vec<IpNetwork> = networks(&["127.0.0.0/8"]);
    static ref V4_LINK_LOCAL: Vec<IpNetwork> = networks(&["169.254.0.0/16"]);
    static ref V4_MULTICAST: Vec<IpNetwork> = networks(&["224.0.0.0/4"]);
    static ref V4_PRIVATE: Vec<IpNetwork> =
        networks(&["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"]);
    static ref V4_DOCUMENTATION: Vec<IpNetwork> =
        networks(&["192.0.2.0/24", "198.51.100.0/24", "203.0.113.0/24"]);
    static ref V4_RESERVED: Vec<IpNetwork> = networks(&["240.0.0.0/4"]);
    static ref V6_UNSPECIFIED: Vec<IpNetwork> = networks(&["::/128"]);
    static ref V6_LOOPBACK: Vec<IpNetwork> = networks(&["::1/128"]);
    static ref V6_LINK_LOCAL: Vec<IpNetwork> = networks(&["fe80::/10"]);
    static ref V6_MULTICAST: Vec<IpNetwork> = networks(&["ff00::/8"]);
    static ref V6_UNIQUE_LOCAL: Vec<IpNetwork> = networks(&["fc00::/7"]);
    static ref V6_SITE_LOCAL: Vec<IpNetwork> = networks(&["fec0::/10"]);
    static ref V6_DOCUMENTATION: Vec<IpNetwork> = networks(&["2001:db8::/32"]);
    static ref V6_DISCARD: Vec<IpNetwork> = networks(&["100::/64"]);
    static ref V6_RESERVED: Vec<IpNetwork> = networks(&[
        "::/8", "100::/8", "200::/7", "400::/6", "800::/5", "1000::/4", "4000::/3", "6000::/3",
        "8000::/3", "a000::/3", "c000::/3", "e000::/4", "f000::/5", "f800::/6", "fe00::/9",
    ]);
}

/// The networks making up `kind` for `family`; empty when the family has
/// no such range.
pub fn ranges(kind: SpecialRange, family: Family) -> &'static [IpNetwork] {
    use SpecialRange::*;
    match (family, kind) {
        (Family::V4, Unspecified) => V4_UNSPECIFIED.as_slice(),
        (Family::V4, Loopback) => V4_LOOPBACK.as_slice(),
        (Family::V4, LinkLocal) => V4_LINK_LOCAL.as_slice(),
        (Family::V4, Multicast) => V4_MULTICAST.as_slice(),
        (Family::V4, Private) => V4_PRIVATE.as_slice(),
        (Family::V4, Documentation) => V4_DOCUMENTATION.as_slice(),
        (Family::V4, Reserved) => V4_RESERVED.as_slice(),
        (Family::V4, UniqueLocal) | (Family::V4, SiteLocal) | (Family::V4, Discard) => &[],
        (Family::V6, Unspecified) => V6_UNSPECIFIED.as_slice(),
        (Family::V6, Loopback) => V6_LOOPBACK.as_slice(),
        (Family::V6, LinkLocal) => V6_LINK_LOCAL.as_slice(),
        (Family::V6, Multicast) => V6_MULTICAST.as_slice(),
        (Family::V6, Private) | (Family::V6, UniqueLocal) => V6_UNIQUE_LOCAL.as_slice(),
        (Family::V6, SiteLocal) => V6_SITE_LOCAL.as_slice(),
        (Family::V6, Documentation) => V6_DOCUMENTATION.as_slice(),
        (Family::V6, Discard) => V6_DISCARD.as_slice(),
        (Family::V6, Reserved) => V6_RESERVED.as_slice(),
    }
}

pub(crate) fn address_in(kind: SpecialRange, address: &IpAddress) -> bool {
    ranges(kind, address.family())
        .iter()
        .any(|r| r.contains_address(address))
}

/// True when the whole of `network` lies inside one of the ranges.
pub(crate) fn network_in(kind: SpecialRange, network: &IpNetwork) -> bool {
    ranges(kind, network.family())
        .iter()
        .any(|r| r.contains_network(network))
}
