//! IPv4 and IPv6 addresses, networks and interfaces with exact
//! fixed-width arithmetic, CIDR parsing and network aggregation.

mod address;
pub mod bytes;
mod error;
mod family;
mod interface;
mod list;
mod network;
mod prefix;
pub mod special;
mod uint;

pub use address::IpAddress;
pub use error::{CidrError, Result};
pub use family::Family;
pub use interface::IpInterface;
pub use list::{collapse, IpNetworkList};
pub use network::{AddressRange, IpNetwork, Subnets};
pub use prefix::IpAddressAndPrefix;
pub use special::SpecialRange;
pub use uint::{FixedWidthUint, U129, U33};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn some_tests() {
        let zero = IpNetwork::new(IpAddress::V4([0; 4]), 0).unwrap();
        assert_eq!("0.0.0.0/0", zero.to_string());
        let all = IpNetwork::new(IpAddress::V4([255; 4]), 32).unwrap();
        assert_eq!("255.255.255.255/32", all.to_string());
        let lo = IpNetwork::new_lenient_owned(IpAddress::V4([127, 1, 2, 3]), 8).unwrap();
        assert_eq!("127.0.0.0/8", lo.to_string());
        assert!(lo.is_loopback());
    }

    quickcheck::quickcheck! {
        fn convert_tests(xs: u32, ys: u8) -> bool {
            match IpNetwork::new_lenient_owned(IpAddress::V4(xs.to_be_bytes()), ys % 33) {
                Ok(net) => net == IpNetwork::from_str(&net.to_string()).unwrap(),
                _ => false,
            }
        }

        fn convert_tests_v6(hi: u64, lo: u64, ys: u8) -> bool {
            let v = ((hi as u128) << 64) | lo as u128;
            match IpNetwork::new_lenient_owned(IpAddress::V6(v.to_be_bytes()), ys % 129) {
                Ok(net) => net == IpNetwork::from_str(&net.to_string()).unwrap(),
                _ => false,
            }
        }
    }
}
