use crate::bytes;
use crate::error::{CidrError, Result};
use crate::family::Family;
use crate::special::{self, SpecialRange};
use crate::uint::{FixedWidthUint, U129, U33};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Display, Error, Formatter};
use std::str::FromStr;

lazy_static! {
    static ref IPV4: Regex = Regex::new(
        r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])$"
    )
    .expect("Not possible");
    static ref HEXTET: Regex = Regex::new(r"^[0-9a-fA-F]{1,4}$").expect("Not possible");
}

/// An IPv4 or IPv6 address held as big-endian octets.
///
/// Ordering puts every IPv4 address before every IPv6 address; within a
/// family addresses compare as unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IpAddress {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl IpAddress {
    pub fn from_bytes(bytes: &[u8]) -> Result<IpAddress> {
        let mut address = match Family::from_octet_count(bytes.len()) {
            Some(Family::V4) => IpAddress::V4([0; 4]),
            Some(Family::V6) => IpAddress::V6([0; 16]),
            None => return Err(CidrError::InvalidLength { len: bytes.len() }),
        };
        address.octets_mut().copy_from_slice(bytes);
        Ok(address)
    }

    /// The contiguous mask of `prefix` leading ones.
    pub fn netmask(family: Family, prefix: u8) -> Result<IpAddress> {
        IpAddress::from_bytes(&bytes::prefix_to_netmask(prefix, family.octet_count())?)
    }

    pub fn family(&self) -> Family {
        match self {
            IpAddress::V4(_) => Family::V4,
            IpAddress::V6(_) => Family::V6,
        }
    }

    pub fn octets(&self) -> &[u8] {
        match self {
            IpAddress::V4(o) => o,
            IpAddress::V6(o) => o,
        }
    }

    fn octets_mut(&mut self) -> &mut [u8] {
        match self {
            IpAddress::V4(o) => o,
            IpAddress::V6(o) => o,
        }
    }

    pub fn to_uint(&self) -> FixedWidthUint {
        match self {
            IpAddress::V4(o) => FixedWidthUint::V4(U33::from(u32::from_be_bytes(*o))),
            IpAddress::V6(o) => FixedWidthUint::V6(U129::from_u128(u128::from_be_bytes(*o))),
        }
    }

    /// `None` when the value needs the extra bit, which no address has.
    pub fn from_uint(value: FixedWidthUint) -> Option<IpAddress> {
        let bytes = value.to_be_bytes();
        if bytes.len() != value.family().octet_count() {
            return None;
        }
        IpAddress::from_bytes(&bytes).ok()
    }

    /// Drops the extra bit.
    fn from_uint_truncated(value: FixedWidthUint) -> IpAddress {
        match value {
            FixedWidthUint::V4(v) => IpAddress::V4((v.value() as u32).to_be_bytes()),
            FixedWidthUint::V6(v) => IpAddress::V6(v.low_u128().to_be_bytes()),
        }
    }

    /// ANDs `netmask` into this address in place and returns the number of
    /// bits that were cleared.
    pub fn mask(&mut self, netmask: &IpAddress) -> Result<u32> {
        if self.family() != netmask.family() {
            return Err(CidrError::FamilyMismatch);
        }
        bytes::and_in_place(self.octets_mut(), netmask.octets())
    }

    pub fn mask_prefix(&mut self, prefix: u8) -> Result<u32> {
        let netmask = IpAddress::netmask(self.family(), prefix)?;
        self.mask(&netmask)
    }

    /// `None` if the result leaves the address space.
    pub fn checked_add(&self, n: u128) -> Option<IpAddress> {
        let n = FixedWidthUint::from_u128(self.family(), n)?;
        IpAddress::from_uint(self.to_uint().checked_add(n)?)
    }

    /// `None` if the result would be below zero.
    pub fn checked_sub(&self, n: u128) -> Option<IpAddress> {
        let n = FixedWidthUint::from_u128(self.family(), n)?;
        IpAddress::from_uint(self.to_uint().checked_sub(n)?)
    }

    fn zip(&self, other: &IpAddress, op: fn(&[u8], &[u8]) -> Result<Vec<u8>>) -> Result<IpAddress> {
        if self.family() != other.family() {
            return Err(CidrError::FamilyMismatch);
        }
        IpAddress::from_bytes(&op(self.octets(), other.octets())?)
    }

    pub fn and(&self, other: &IpAddress) -> Result<IpAddress> {
        self.zip(other, bytes::and)
    }

    pub fn or(&self, other: &IpAddress) -> Result<IpAddress> {
        self.zip(other, bytes::or)
    }

    pub fn xor(&self, other: &IpAddress) -> Result<IpAddress> {
        self.zip(other, bytes::xor)
    }

    pub fn invert(&self) -> IpAddress {
        IpAddress::from_uint_truncated(self.to_uint().invert())
    }

    /// Logical shift left; bits shifted past the address width are lost.
    pub fn shl(&self, n: u32) -> Result<IpAddress> {
        Ok(IpAddress::from_uint_truncated(self.to_uint().shl(n)?))
    }

    pub fn shr(&self, n: u32) -> Result<IpAddress> {
        Ok(IpAddress::from_uint_truncated(self.to_uint().shr(n)?))
    }

    /// `::ffff:a.b.c.d`
    pub fn is_ipv4_mapped(&self) -> bool {
        match self {
            IpAddress::V4(_) => false,
            IpAddress::V6(o) => o[..10].iter().all(|b| *b == 0) && o[10] == 0xFF && o[11] == 0xFF,
        }
    }

    pub fn to_ipv4_mapped(&self) -> Option<IpAddress> {
        if !self.is_ipv4_mapped() {
            return None;
        }
        let o = self.octets();
        Some(IpAddress::V4([o[12], o[13], o[14], o[15]]))
    }

    pub fn to_ipv6_mapped(&self) -> IpAddress {
        match self {
            IpAddress::V4(o) => {
                let mut v6 = [0u8; 16];
                v6[10] = 0xFF;
                v6[11] = 0xFF;
                v6[12..].copy_from_slice(o);
                IpAddress::V6(v6)
            }
            IpAddress::V6(_) => self.clone(),
        }
    }

    pub fn is_unspecified(&self) -> bool {
        special::address_in(SpecialRange::Unspecified, self)
    }

    pub fn is_loopback(&self) -> bool {
        special::address_in(SpecialRange::Loopback, self)
    }

    pub fn is_link_local(&self) -> bool {
        special::address_in(SpecialRange::LinkLocal, self)
    }

    pub fn is_multicast(&self) -> bool {
        special::address_in(SpecialRange::Multicast, self)
    }

    pub fn is_private(&self) -> bool {
        special::address_in(SpecialRange::Private, self)
    }

    pub fn is_reserved(&self) -> bool {
        special::address_in(SpecialRange::Reserved, self)
    }

    pub fn is_documentation(&self) -> bool {
        special::address_in(SpecialRange::Documentation, self)
    }

    /// Every segment at full width, no `::` compression.
    pub fn to_expanded_string(&self) -> String {
        match self {
            IpAddress::V4(_) => self.to_string(),
            IpAddress::V6(_) => hextets(self.octets())
                .iter()
                .map(|h| format!("{:04x}", h))
                .collect::<Vec<_>>()
                .join(":"),
        }
    }
}

fn hextets(octets: &[u8]) -> Vec<u16> {
    octets
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

fn join_hex(segments: &[u16]) -> String {
    segments
        .iter()
        .map(|h| format!("{:x}", h))
        .collect::<Vec<_>>()
        .join(":")
}

/// RFC 5952: lowercase, no leading zeros, the leftmost longest run of two
/// or more zero hextets becomes `::`.
fn format_v6(address: &IpAddress) -> String {
    let o = address.octets();
    if address.is_ipv4_mapped() {
        return format!("::ffff:{}.{}.{}.{}", o[12], o[13], o[14], o[15]);
    }
    let segments = hextets(o);
    let (mut best_start, mut best_len) = (0, 0);
    let (mut run_start, mut run_len) = (0, 0);
    for (i, s) in segments.iter().enumerate() {
        if *s != 0 {
            run_len = 0;
            continue;
        }
        if run_len == 0 {
            run_start = i;
        }
        run_len += 1;
        if run_len > best_len {
            best_start = run_start;
            best_len = run_len;
        }
    }
    if best_len < 2 {
        return join_hex(&segments);
    }
    format!(
        "{}::{}",
        join_hex(&segments[..best_start]),
        join_hex(&segments[best_start + best_len..])
    )
}

fn parse_v4(s: &str) -> Option<[u8; 4]> {
    let caps = IPV4.captures(s)?;
    let mut out = [0u8; 4];
    for (i, o) in out.iter_mut().enumerate() {
        *o = caps.get(i + 1)?.as_str().parse().ok()?;
    }
    Some(out)
}

fn parse_v6(s: &str) -> Option<[u8; 16]> {
    let mut parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 3 {
        return None;
    }
    let tail = if parts.last()?.contains('.') {
        Some(parse_v4(parts.pop()?)?)
    } else {
        None
    };
    let mut segments: Vec<Option<u16>> = Vec::with_capacity(9);
    for p in parts {
        if p.is_empty() {
            segments.push(None);
        } else if HEXTET.is_match(p) {
            segments.push(Some(u16::from_str_radix(p, 16).ok()?));
        } else {
            return None;
        }
    }
    if let Some(v4) = tail {
        segments.push(Some(u16::from_be_bytes([v4[0], v4[1]])));
        segments.push(Some(u16::from_be_bytes([v4[2], v4[3]])));
    }
    let n = segments.len();
    if n > 9 {
        return None;
    }

    // Only an interior empty part marks `::`; leading and trailing empty
    // parts are legal only as half of it.
    let mut skip = None;
    for (i, s) in segments.iter().enumerate().take(n - 1).skip(1) {
        if s.is_none() {
            if skip.is_some() {
                return None;
            }
            skip = Some(i);
        }
    }
    let (head, tail) = match skip {
        Some(i) => {
            let mut head = i;
            let mut tail = n - i - 1;
            if segments[0].is_none() {
                head -= 1;
                if head != 0 {
                    return None;
                }
            }
            if segments[n - 1].is_none() {
                tail -= 1;
                if tail != 0 {
                    return None;
                }
            }
            if head + tail > 7 {
                return None;
            }
            (head, tail)
        }
        None => {
            if n != 8 {
                return None;
            }
            (8, 0)
        }
    };

    let mut out = [0u8; 16];
    let mut put = |index: usize, value: u16| {
        out[index * 2..index * 2 + 2].copy_from_slice(&value.to_be_bytes())
    };
    for i in 0..head {
        put(i, segments[i]?);
    }
    for j in 0..tail {
        put(8 - tail + j, segments[n - tail + j]?);
    }
    Some(out)
}

impl FromStr for IpAddress {
    type Err = CidrError;
    fn from_str(s: &str) -> Result<Self> {
        let parsed = if s.contains(Family::V6.separator()) {
            parse_v6(s).map(IpAddress::V6)
        } else {
            parse_v4(s).map(IpAddress::V4)
        };
        parsed.ok_or_else(|| {
            debug!("Rejected address {:?}", s);
            CidrError::InvalidAddress(s.to_owned())
        })
    }
}

/// Canonical form; the alternate flag (`{:#}`) prints the expanded form.
impl Display for IpAddress {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match self {
            IpAddress::V4(o) => write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3]),
            IpAddress::V6(_) if f.alternate() => write!(f, "{}", self.to_expanded_string()),
            IpAddress::V6(_) => write!(f, "{}", format_v6(self)),
        }
    }
}

impl Ord for IpAddress {
    fn cmp(&self, other: &IpAddress) -> Ordering {
        self.family()
            .cmp(&other.family())
            .then_with(|| bytes::compare_unsigned_be(self.octets(), other.octets()))
    }
}

impl PartialOrd for IpAddress {
    fn partial_cmp(&self, other: &IpAddress) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn ip(s: &str) -> IpAddress {
        s.parse().unwrap()
    }

    #[test]
    fn parse_ipv4() {
        assert_eq!(IpAddress::V4([192, 168, 0, 1]), ip("192.168.0.1"));
        assert_eq!(IpAddress::V4([255, 255, 255, 255]), ip("255.255.255.255"));
        for bad in &[
            "1.2.3",
            "1.2.3.256",
            "01.2.3.4",
            "1.2.3.4.5",
            "",
            "1.2.3.4 ",
            "a.b.c.d",
            "1..2.3",
        ] {
            assert!(bad.parse::<IpAddress>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn parse_ipv6() {
        let mut loopback = [0u8; 16];
        loopback[15] = 1;
        assert_eq!(IpAddress::V6(loopback), ip("::1"));
        assert_eq!(IpAddress::V6([0; 16]), ip("::"));
        assert_eq!(ip("2001:db8::1"), ip("2001:0DB8:0:0:0:0:0:1"));
        assert_eq!(ip("::ffff:c000:201"), ip("::ffff:192.0.2.1"));
        assert_eq!(ip("1:2:3:4:5:6:102:304"), ip("1:2:3:4:5:6:1.2.3.4"));
        assert_eq!(ip("1:2:3:4:5:6:7:0"), ip("1:2:3:4:5:6:7::"));
        assert_eq!(ip("0:2:3:4:5:6:7:8"), ip("::2:3:4:5:6:7:8"));
        for bad in &[
            ":1::2",
            "1::2::3",
            ":::",
            "1:2:3:4:5:6:7:8:9",
            "1:2:3:4::5:6:7:8",
            "1:2:3:4:5:6:7",
            "12345::",
            "g::",
            "::1.2.3",
            "1:2:3:4:5:6:7:1.2.3.4",
            "1:",
            "fe80::1%eth0",
            "1:2:3:4:5:6:7:8:",
        ] {
            assert!(bad.parse::<IpAddress>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn canonical_format() {
        let cases = [
            ("2001:db8::1", "2001:db8::1"),
            ("2001:0db8:0000:0000:0000:0000:0000:0001", "2001:db8::1"),
            ("2001:db8:0:0:1:0:0:1", "2001:db8::1:0:0:1"),
            ("2001:db8:0:1:1:1:1:1", "2001:db8:0:1:1:1:1:1"),
            ("2001:0:0:1:0:0:0:1", "2001:0:0:1::1"),
            ("1::", "1::"),
            ("::", "::"),
            ("FE80::A", "fe80::a"),
            ("::ffff:c000:0201", "::ffff:192.0.2.1"),
            ("::192.0.2.1", "::c000:201"),
        ];
        for (input, expected) in &cases {
            assert_eq!(*expected, ip(input).to_string());
        }
    }

    #[test]
    fn expanded_format() {
        assert_eq!(
            "2001:0db8:0000:0000:0000:0000:0000:0001",
            ip("2001:db8::1").to_expanded_string()
        );
        assert_eq!("0000:0000:0000:0000:0000:0000:0000:0000", format!("{:#}", ip("::")));
        assert_eq!("10.0.0.1", format!("{:#}", ip("10.0.0.1")));
    }

    #[test]
    fn masking_counts_bits() {
        let mut a = ip("10.1.2.3");
        assert_eq!(4, a.mask_prefix(8).unwrap());
        assert_eq!(ip("10.0.0.0"), a);
        assert_eq!(0, a.mask_prefix(8).unwrap());
        assert!(a.mask(&ip("::")).is_err());
        assert!(a.mask_prefix(33).is_err());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(Some(ip("10.0.1.0")), ip("10.0.0.255").checked_add(1));
        assert_eq!(None, ip("255.255.255.255").checked_add(1));
        assert_eq!(None, ip("0.0.0.0").checked_sub(1));
        assert_eq!(None, ip("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff").checked_add(1));
        assert_eq!(Some(ip("::1:0:0:0:0")), ip("::ffff:ffff:ffff:ffff").checked_add(1));
        assert_eq!(Some(ip("::")), ip("::1").checked_sub(1));
        assert_eq!(ip("255.255.255.0"), ip("0.0.0.255").invert());
        assert_eq!(ip("0.0.1.0"), ip("128.0.0.1").shl(8).unwrap());
        assert_eq!(ip("0.128.0.0"), ip("128.0.0.1").shr(8).unwrap());
        assert_eq!(ip("8000::"), ip("::1").shl(127).unwrap());
        assert_eq!(ip("10.0.0.0"), ip("10.1.2.3").and(&ip("255.0.0.0")).unwrap());
        assert_eq!(ip("10.255.255.255"), ip("10.1.2.3").or(&ip("0.255.255.255")).unwrap());
        assert_eq!(ip("0.1.2.3"), ip("10.1.2.3").xor(&ip("10.0.0.0")).unwrap());
        assert_eq!(Err(CidrError::FamilyMismatch), ip("10.1.2.3").and(&ip("::")));
    }

    #[test]
    fn ordering() {
        assert!(ip("0.0.0.255") < ip("0.0.1.0"));
        assert!(ip("255.255.255.255") < ip("::"));
        assert!(ip("::ffff") < ip("::1:0"));
        assert_eq!(Ordering::Equal, ip("2001:db8:0:0:0:0:0:1").cmp(&ip("2001:db8::1")));
    }

    #[test]
    fn mapped_addresses() {
        let mapped = ip("::ffff:10.0.0.1");
        assert!(mapped.is_ipv4_mapped());
        assert_eq!(Some(ip("10.0.0.1")), mapped.to_ipv4_mapped());
        assert_eq!(mapped, ip("10.0.0.1").to_ipv6_mapped());
        assert_eq!(None, ip("::10.0.0.1").to_ipv4_mapped());
    }

    #[test]
    fn uint_conversion() {
        let a = ip("1.2.3.4");
        assert_eq!(Some(0x0102_0304), a.to_uint().to_u128());
        let n = FixedWidthUint::from_u128(Family::V4, 0x0102_0304).unwrap();
        assert_eq!(Some(a), IpAddress::from_uint(n));
        assert_eq!(None, IpAddress::from_uint(FixedWidthUint::max(Family::V6)));
        assert!(IpAddress::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn predicates() {
        assert!(ip("127.0.0.1").is_loopback());
        assert!(ip("::1").is_loopback());
        assert!(ip("169.254.3.4").is_link_local());
        assert!(ip("fe80::1").is_link_local());
        assert!(ip("239.1.1.1").is_multicast());
        assert!(ip("172.20.0.1").is_private());
        assert!(!ip("172.32.0.1").is_private());
        assert!(ip("fd00::1").is_private());
        assert!(ip("0.0.0.0").is_unspecified());
        assert!(ip("2001:db8::5").is_documentation());
        assert!(ip("240.0.0.1").is_reserved());
    }

    #[quickcheck]
    fn ipv4_text_round_trip(v: u32) -> bool {
        let a = IpAddress::V4(v.to_be_bytes());
        ip(&a.to_string()) == a && ip(&a.to_expanded_string()) == a
    }

    #[quickcheck]
    fn ipv6_text_round_trip(v: u128) -> bool {
        let a = IpAddress::V6(v.to_be_bytes());
        ip(&a.to_string()) == a && ip(&a.to_expanded_string()) == a
    }

    #[quickcheck]
    fn ipv6_sparse_round_trip(v: u128, zeros: u8) -> bool {
        // Zero out whole hextets so that `::` compression is exercised.
        let mut o = v.to_be_bytes();
        for i in 0..8 {
            if zeros >> i & 1 == 1 {
                o[i * 2] = 0;
                o[i * 2 + 1] = 0;
            }
        }
        let a = IpAddress::V6(o);
        ip(&a.to_string()) == a
    }

    #[quickcheck]
    fn mask_is_idempotent(v: u128, p: u8) -> bool {
        let p = p % 129;
        let mut once = IpAddress::V6(v.to_be_bytes());
        once.mask_prefix(p).unwrap();
        let mut twice = once.clone();
        twice.mask_prefix(p).unwrap() == 0 && twice == once
    }
}
