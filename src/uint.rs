//! Fixed-width unsigned integers one bit wider than an address, so the
//! size of a whole address space (2^32 or 2^128) is representable.
//!
//! `add`/`sub` report overflow and underflow as `None`. Bitwise operations,
//! inversion and in-range shifts never fail; bits pushed past the top are
//! dropped.

use crate::error::{CidrError, Result};
use crate::family::Family;
use std::fmt::{Display, Error, Formatter};
use std::ops::{BitAnd, BitOr, BitXor, Not};

const MASK33: u64 = (1 << 33) - 1;

fn check_shift(shift: u32, max: u32) -> Result<()> {
    if shift > max {
        return Err(CidrError::ShiftOutOfRange { shift, max });
    }
    Ok(())
}

/// 33-bit unsigned integer used for IPv4 arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U33(u64);

impl U33 {
    pub const ZERO: U33 = U33(0);
    pub const ONE: U33 = U33(1);
    pub const MAX: U33 = U33(MASK33);

    pub fn new(v: u64) -> Option<U33> {
        if v > MASK33 {
            return None;
        }
        Some(U33(v))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, rhs: U33) -> Option<U33> {
        U33::new(self.0 + rhs.0)
    }

    pub fn checked_sub(self, rhs: U33) -> Option<U33> {
        self.0.checked_sub(rhs.0).map(U33)
    }

    pub fn shl(self, n: u32) -> Result<U33> {
        check_shift(n, 32)?;
        Ok(U33((self.0 << n) & MASK33))
    }

    pub fn shr(self, n: u32) -> Result<U33> {
        check_shift(n, 32)?;
        Ok(U33(self.0 >> n))
    }

    pub fn trailing_zeros(self) -> u32 {
        if self.0 == 0 {
            return 33;
        }
        self.0.trailing_zeros()
    }

    pub fn bit_length(self) -> u32 {
        64 - self.0.leading_zeros()
    }

    /// 4 bytes, or 5 when the 33rd bit is set.
    pub fn to_be_bytes(self) -> Vec<u8> {
        let low = (self.0 as u32).to_be_bytes();
        if self.0 >> 32 == 0 {
            return low.to_vec();
        }
        let mut out = Vec::with_capacity(5);
        out.push(1);
        out.extend_from_slice(&low);
        out
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Result<U33> {
        let (top, low) = match bytes.len() {
            4 => (0, bytes),
            5 if bytes[0] <= 1 => (bytes[0] as u64, &bytes[1..]),
            len => return Err(CidrError::InvalidLength { len }),
        };
        let mut word = [0u8; 4];
        word.copy_from_slice(low);
        Ok(U33(top << 32 | u32::from_be_bytes(word) as u64))
    }
}

impl From<u32> for U33 {
    fn from(v: u32) -> U33 {
        U33(v as u64)
    }
}

impl BitAnd for U33 {
    type Output = U33;
    fn bitand(self, rhs: U33) -> U33 {
        U33(self.0 & rhs.0)
    }
}

impl BitOr for U33 {
    type Output = U33;
    fn bitor(self, rhs: U33) -> U33 {
        U33(self.0 | rhs.0)
    }
}

impl BitXor for U33 {
    type Output = U33;
    fn bitxor(self, rhs: U33) -> U33 {
        U33(self.0 ^ rhs.0)
    }
}

impl Not for U33 {
    type Output = U33;
    fn not(self) -> U33 {
        U33(!self.0 & MASK33)
    }
}

impl Display for U33 {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

/// 129-bit unsigned integer used for IPv6 arithmetic: two 64-bit limbs plus
/// the 129th bit.
///
/// Field order matters: the derived `Ord` compares `top`, then `hi`, then `lo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U129 {
    top: bool,
    hi: u64,
    lo: u64,
}

impl U129 {
    pub const ZERO: U129 = U129 {
        top: false,
        hi: 0,
        lo: 0,
    };
    pub const ONE: U129 = U129 {
        top: false,
        hi: 0,
        lo: 1,
    };
    pub const MAX: U129 = U129 {
        top: true,
        hi: u64::MAX,
        lo: u64::MAX,
    };

    pub fn from_u128(v: u128) -> U129 {
        U129 {
            top: false,
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }

    /// `None` once the 129th bit is set.
    pub fn to_u128(self) -> Option<u128> {
        if self.top {
            return None;
        }
        Some(self.low_u128())
    }

    pub(crate) fn low_u128(self) -> u128 {
        (self.hi as u128) << 64 | self.lo as u128
    }

    pub fn checked_add(self, rhs: U129) -> Option<U129> {
        let (lo, lo_carry) = self.lo.overflowing_add(rhs.lo);
        let (hi, c1) = self.hi.overflowing_add(rhs.hi);
        let (hi, c2) = hi.overflowing_add(lo_carry as u64);
        let top = self.top as u8 + rhs.top as u8 + c1 as u8 + c2 as u8;
        if top >= 2 {
            return None;
        }
        Some(U129 {
            top: top == 1,
            hi,
            lo,
        })
    }

    pub fn checked_sub(self, rhs: U129) -> Option<U129> {
        if self < rhs {
            return None;
        }
        let (lo, lo_borrow) = self.lo.overflowing_sub(rhs.lo);
        let (hi, b1) = self.hi.overflowing_sub(rhs.hi);
        let (hi, b2) = hi.overflowing_sub(lo_borrow as u64);
        let top = self.top as i8 - rhs.top as i8 - b1 as i8 - b2 as i8;
        debug_assert!(top == 0 || top == 1, "U129 borrow escaped the 129th bit");
        Some(U129 {
            top: top == 1,
            hi,
            lo,
        })
    }

    pub fn shl(self, n: u32) -> Result<U129> {
        check_shift(n, 128)?;
        let U129 { hi, lo, .. } = self;
        Ok(match n {
            0 => self,
            1..=63 => U129 {
                top: (hi >> (64 - n)) & 1 == 1,
                hi: hi << n | lo >> (64 - n),
                lo: lo << n,
            },
            64 => U129 {
                top: hi & 1 == 1,
                hi: lo,
                lo: 0,
            },
            65..=127 => U129 {
                top: (lo >> (128 - n)) & 1 == 1,
                hi: lo << (n - 64),
                lo: 0,
            },
            _ => U129 {
                top: lo & 1 == 1,
                hi: 0,
                lo: 0,
            },
        })
    }

    pub fn shr(self, n: u32) -> Result<U129> {
        check_shift(n, 128)?;
        let U129 { top, hi, lo } = self;
        let top = top as u64;
        Ok(match n {
            0 => self,
            1..=63 => U129 {
                top: false,
                hi: hi >> n | top << (64 - n),
                lo: lo >> n | hi << (64 - n),
            },
            64 => U129 {
                top: false,
                hi: top,
                lo: hi,
            },
            65..=127 => U129 {
                top: false,
                hi: 0,
                lo: hi >> (n - 64) | top << (128 - n),
            },
            _ => U129 {
                top: false,
                hi: 0,
                lo: top,
            },
        })
    }

    pub fn trailing_zeros(self) -> u32 {
        if self.lo != 0 {
            self.lo.trailing_zeros()
        } else if self.hi != 0 {
            64 + self.hi.trailing_zeros()
        } else if self.top {
            128
        } else {
            129
        }
    }

    pub fn bit_length(self) -> u32 {
        if self.top {
            129
        } else if self.hi != 0 {
            128 - self.hi.leading_zeros()
        } else {
            64 - self.lo.leading_zeros()
        }
    }

    /// 16 bytes, or 17 when the 129th bit is set.
    pub fn to_be_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(17);
        if self.top {
            out.push(1);
        }
        out.extend_from_slice(&self.hi.to_be_bytes());
        out.extend_from_slice(&self.lo.to_be_bytes());
        out
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Result<U129> {
        let (top, rest) = match bytes.len() {
            16 => (false, bytes),
            17 if bytes[0] <= 1 => (bytes[0] == 1, &bytes[1..]),
            len => return Err(CidrError::InvalidLength { len }),
        };
        let mut hi = [0u8; 8];
        let mut lo = [0u8; 8];
        hi.copy_from_slice(&rest[..8]);
        lo.copy_from_slice(&rest[8..]);
        Ok(U129 {
            top,
            hi: u64::from_be_bytes(hi),
            lo: u64::from_be_bytes(lo),
        })
    }
}

impl BitAnd for U129 {
    type Output = U129;
    fn bitand(self, rhs: U129) -> U129 {
        U129 {
            top: self.top & rhs.top,
            hi: self.hi & rhs.hi,
            lo: self.lo & rhs.lo,
        }
    }
}

impl BitOr for U129 {
    type Output = U129;
    fn bitor(self, rhs: U129) -> U129 {
        U129 {
            top: self.top | rhs.top,
            hi: self.hi | rhs.hi,
            lo: self.lo | rhs.lo,
        }
    }
}

impl BitXor for U129 {
    type Output = U129;
    fn bitxor(self, rhs: U129) -> U129 {
        U129 {
            top: self.top ^ rhs.top,
            hi: self.hi ^ rhs.hi,
            lo: self.lo ^ rhs.lo,
        }
    }
}

impl Not for U129 {
    type Output = U129;
    fn not(self) -> U129 {
        U129 {
            top: !self.top,
            hi: !self.hi,
            lo: !self.lo,
        }
    }
}

impl Display for U129 {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        const TWO_POW_128: &str = "340282366920938463463374607431768211456";
        let low = self.low_u128();
        if !self.top {
            return write!(f, "{}", low);
        }
        write!(f, "{}", add_decimal(TWO_POW_128, &low.to_string()))
    }
}

fn add_decimal(a: &str, b: &str) -> String {
    let mut a = a.bytes().rev();
    let mut b = b.bytes().rev();
    let mut digits = Vec::new();
    let mut carry = 0;
    loop {
        let (x, y) = (a.next(), b.next());
        if x.is_none() && y.is_none() && carry == 0 {
            break;
        }
        let sum = x.map_or(0, |d| d - b'0') + y.map_or(0, |d| d - b'0') + carry;
        digits.push(b'0' + sum % 10);
        carry = sum / 10;
    }
    digits.iter().rev().map(|d| *d as char).collect()
}

/// A fixed-width integer tagged with the address family it belongs to.
/// Ordering sorts every V4 value before every V6 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixedWidthUint {
    V4(U33),
    V6(U129),
}

impl FixedWidthUint {
    pub fn zero(family: Family) -> FixedWidthUint {
        match family {
            Family::V4 => FixedWidthUint::V4(U33::ZERO),
            Family::V6 => FixedWidthUint::V6(U129::ZERO),
        }
    }

    pub fn one(family: Family) -> FixedWidthUint {
        match family {
            Family::V4 => FixedWidthUint::V4(U33::ONE),
            Family::V6 => FixedWidthUint::V6(U129::ONE),
        }
    }

    pub fn max(family: Family) -> FixedWidthUint {
        match family {
            Family::V4 => FixedWidthUint::V4(U33::MAX),
            Family::V6 => FixedWidthUint::V6(U129::MAX),
        }
    }

    /// `None` when `v` does not fit the family's width (only possible for V4).
    pub fn from_u128(family: Family, v: u128) -> Option<FixedWidthUint> {
        match family {
            Family::V4 => {
                if v > MASK33 as u128 {
                    return None;
                }
                Some(FixedWidthUint::V4(U33(v as u64)))
            }
            Family::V6 => Some(FixedWidthUint::V6(U129::from_u128(v))),
        }
    }

    pub fn to_u128(self) -> Option<u128> {
        match self {
            FixedWidthUint::V4(v) => Some(v.value() as u128),
            FixedWidthUint::V6(v) => v.to_u128(),
        }
    }

    /// 2^`exp`; callers keep `exp` within the family's address width.
    pub(crate) fn power_of_two(family: Family, exp: u8) -> FixedWidthUint {
        match family {
            Family::V4 => FixedWidthUint::V4(U33((1u64 << exp.min(32)) & MASK33)),
            Family::V6 if exp >= 128 => FixedWidthUint::V6(U129 {
                top: true,
                hi: 0,
                lo: 0,
            }),
            Family::V6 => FixedWidthUint::V6(U129::from_u128(1 << exp)),
        }
    }

    /// `None` on overflow, underflow, or when the families differ.
    pub fn checked_add(self, rhs: FixedWidthUint) -> Option<FixedWidthUint> {
        match (self, rhs) {
            (FixedWidthUint::V4(a), FixedWidthUint::V4(b)) => {
                a.checked_add(b).map(FixedWidthUint::V4)
            }
            (FixedWidthUint::V6(a), FixedWidthUint::V6(b)) => {
                a.checked_add(b).map(FixedWidthUint::V6)
            }
            _ => None,
        }
    }

    /// `None` on overflow, underflow, or when the families differ.
    pub fn checked_sub(self, rhs: FixedWidthUint) -> Option<FixedWidthUint> {
        match (self, rhs) {
            (FixedWidthUint::V4(a), FixedWidthUint::V4(b)) => {
                a.checked_sub(b).map(FixedWidthUint::V4)
            }
            (FixedWidthUint::V6(a), FixedWidthUint::V6(b)) => {
                a.checked_sub(b).map(FixedWidthUint::V6)
            }
            _ => None,
        }
    }

    pub fn family(self) -> Family {
        match self {
            FixedWidthUint::V4(_) => Family::V4,
            FixedWidthUint::V6(_) => Family::V6,
        }
    }

    pub fn shl(self, n: u32) -> Result<FixedWidthUint> {
        Ok(match self {
            FixedWidthUint::V4(v) => FixedWidthUint::V4(v.shl(n)?),
            FixedWidthUint::V6(v) => FixedWidthUint::V6(v.shl(n)?),
        })
    }

    pub fn shr(self, n: u32) -> Result<FixedWidthUint> {
        Ok(match self {
            FixedWidthUint::V4(v) => FixedWidthUint::V4(v.shr(n)?),
            FixedWidthUint::V6(v) => FixedWidthUint::V6(v.shr(n)?),
        })
    }

    pub fn invert(self) -> FixedWidthUint {
        match self {
            FixedWidthUint::V4(v) => FixedWidthUint::V4(!v),
            FixedWidthUint::V6(v) => FixedWidthUint::V6(!v),
        }
    }

    pub fn trailing_zeros(self) -> u32 {
        match self {
            FixedWidthUint::V4(v) => v.trailing_zeros(),
            FixedWidthUint::V6(v) => v.trailing_zeros(),
        }
    }

    pub fn bit_length(self) -> u32 {
        match self {
            FixedWidthUint::V4(v) => v.bit_length(),
            FixedWidthUint::V6(v) => v.bit_length(),
        }
    }

    pub fn to_be_bytes(self) -> Vec<u8> {
        match self {
            FixedWidthUint::V4(v) => v.to_be_bytes(),
            FixedWidthUint::V6(v) => v.to_be_bytes(),
        }
    }

    pub fn from_be_bytes(family: Family, bytes: &[u8]) -> Result<FixedWidthUint> {
        Ok(match family {
            Family::V4 => FixedWidthUint::V4(U33::from_be_bytes(bytes)?),
            Family::V6 => FixedWidthUint::V6(U129::from_be_bytes(bytes)?),
        })
    }
}

impl Display for FixedWidthUint {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match self {
            FixedWidthUint::V4(v) => Display::fmt(v, f),
            FixedWidthUint::V6(v) => Display::fmt(v, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    const TWO_POW_128: U129 = U129 {
        top: true,
        hi: 0,
        lo: 0,
    };

    fn u129(top: bool, v: u128) -> U129 {
        let mut x = U129::from_u128(v);
        x.top = top;
        x
    }

    #[test]
    fn u33_boundaries() {
        let two_pow_32 = U33::new(1 << 32).unwrap();
        assert_eq!(None, U33::MAX.checked_add(U33::ONE));
        assert_eq!(None, U33::ZERO.checked_sub(U33::ONE));
        assert_eq!(
            Some(two_pow_32),
            U33::new(u32::MAX as u64).unwrap().checked_add(U33::ONE)
        );
        assert_eq!(two_pow_32, U33::ONE.shl(32).unwrap());
        assert_eq!(U33::ZERO, two_pow_32.shl(1).unwrap());
        assert_eq!(U33::ONE, two_pow_32.shr(32).unwrap());
        assert!(U33::ONE.shl(33).is_err());
        assert_eq!(U33::MAX, !U33::ZERO);
        assert_eq!(None, U33::new(1 << 33));
    }

    #[test]
    fn u33_bytes() {
        assert_eq!(vec![0, 0, 1, 0], U33::new(256).unwrap().to_be_bytes());
        assert_eq!(vec![1, 0, 0, 0, 0], U33::new(1 << 32).unwrap().to_be_bytes());
        assert_eq!(U33::MAX, U33::from_be_bytes(&[1, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap());
        assert_eq!(U33::ONE, U33::from_be_bytes(&[0, 0, 0, 0, 1]).unwrap());
        assert!(U33::from_be_bytes(&[2, 0, 0, 0, 0]).is_err());
        assert!(U33::from_be_bytes(&[0, 0, 0]).is_err());
    }

    #[test]
    fn u129_boundaries() {
        assert_eq!(None, U129::MAX.checked_add(U129::ONE));
        assert_eq!(None, U129::ZERO.checked_sub(U129::ONE));
        assert_eq!(
            Some(TWO_POW_128),
            U129::from_u128(u128::MAX).checked_add(U129::ONE)
        );
        assert_eq!(
            Some(U129::from_u128(u128::MAX)),
            TWO_POW_128.checked_sub(U129::ONE)
        );
        assert_eq!(None, TWO_POW_128.checked_add(TWO_POW_128));
        assert_eq!(Some(U129::MAX), TWO_POW_128.checked_add(U129::from_u128(u128::MAX)));
        assert_eq!(None, TWO_POW_128.to_u128());
        assert_eq!(U129::MAX, !U129::ZERO);
    }

    #[test]
    fn u129_carry_between_limbs() {
        let a = U129::from_u128(u64::MAX as u128);
        assert_eq!(Some(U129::from_u128(1 << 64)), a.checked_add(U129::ONE));
        assert_eq!(Some(a), U129::from_u128(1 << 64).checked_sub(U129::ONE));
        let b = u129(true, 0);
        assert_eq!(Some(u129(false, u128::MAX - 4)), b.checked_sub(U129::from_u128(5)));
    }

    #[test]
    fn u129_shifts() {
        assert_eq!(TWO_POW_128, U129::ONE.shl(128).unwrap());
        assert_eq!(U129::from_u128(1 << 64), U129::ONE.shl(64).unwrap());
        assert_eq!(TWO_POW_128, U129::from_u128(1 << 64).shl(64).unwrap());
        assert_eq!(TWO_POW_128, U129::from_u128(1 << 127).shl(1).unwrap());
        assert_eq!(TWO_POW_128, U129::from_u128(1 << 63).shl(65).unwrap());
        assert_eq!(U129::ZERO, TWO_POW_128.shl(1).unwrap());
        assert_eq!(U129::ONE, TWO_POW_128.shr(128).unwrap());
        assert_eq!(U129::from_u128(1 << 64), TWO_POW_128.shr(64).unwrap());
        assert_eq!(U129::from_u128(1 << 127), TWO_POW_128.shr(1).unwrap());
        assert_eq!(U129::from_u128(1 << 63), TWO_POW_128.shr(65).unwrap());
        assert_eq!(TWO_POW_128, TWO_POW_128.shr(0).unwrap());
        assert!(U129::ONE.shr(129).is_err());
    }

    #[test]
    fn u129_bytes() {
        let mut expected = vec![1];
        expected.extend_from_slice(&[0; 16]);
        assert_eq!(expected, TWO_POW_128.to_be_bytes());
        assert_eq!(TWO_POW_128, U129::from_be_bytes(&expected).unwrap());
        assert_eq!(16, U129::from_u128(u128::MAX).to_be_bytes().len());
        assert!(U129::from_be_bytes(&[0; 15]).is_err());
        expected[0] = 7;
        assert!(U129::from_be_bytes(&expected).is_err());
    }

    #[test]
    fn decimal_display() {
        assert_eq!("4294967296", U33::new(1 << 32).unwrap().to_string());
        assert_eq!("340282366920938463463374607431768211456", TWO_POW_128.to_string());
        assert_eq!("680564733841876926926749214863536422911", U129::MAX.to_string());
        assert_eq!("256", U129::from_u128(256).to_string());
    }

    #[test]
    fn tagged_values() {
        let size = FixedWidthUint::one(Family::V4).shl(32).unwrap();
        assert_eq!(Some(1 << 32), size.to_u128());
        assert_eq!(None, FixedWidthUint::from_u128(Family::V4, 1 << 33));
        assert!(FixedWidthUint::max(Family::V4) < FixedWidthUint::zero(Family::V6));
        assert_eq!(
            FixedWidthUint::max(Family::V6),
            FixedWidthUint::zero(Family::V6).invert()
        );
        assert_eq!(33, FixedWidthUint::max(Family::V4).bit_length());
        assert_eq!(129, FixedWidthUint::zero(Family::V6).trailing_zeros());
        assert_eq!(
            FixedWidthUint::one(Family::V6).shl(128).unwrap(),
            FixedWidthUint::power_of_two(Family::V6, 128)
        );
        assert_eq!(
            None,
            FixedWidthUint::one(Family::V4).checked_add(FixedWidthUint::one(Family::V6))
        );
        assert_eq!(
            None,
            FixedWidthUint::max(Family::V4).checked_add(FixedWidthUint::one(Family::V4))
        );
    }

    quickcheck::quickcheck! {
        fn u129_add_matches_u128(a: u128, b: u128) -> bool {
            let sum = U129::from_u128(a).checked_add(U129::from_u128(b)).unwrap();
            match a.checked_add(b) {
                Some(s) => sum.to_u128() == Some(s),
                None => sum.top && sum.hi == (a.wrapping_add(b) >> 64) as u64,
            }
        }

        fn u129_sub_matches_u128(a: u128, b: u128) -> bool {
            U129::from_u128(a).checked_sub(U129::from_u128(b)).and_then(U129::to_u128)
                == a.checked_sub(b)
        }
    }

    #[quickcheck]
    fn u129_shift_matches_u128(v: u128, n: u8) -> bool {
        let n = (n % 128) as u32;
        let x = U129::from_u128(v);
        x.shr(n).unwrap().to_u128() == Some(v >> n)
            && x.shl(n).unwrap().lo == (v << n) as u64
            && x.shl(n).unwrap().hi == ((v << n) >> 64) as u64
    }

    #[quickcheck]
    fn u129_add_sub_inverse(top: bool, v: u128, w: u128) -> bool {
        let a = u129(top, v);
        let b = U129::from_u128(w);
        match a.checked_add(b) {
            Some(sum) => sum.checked_sub(b) == Some(a),
            None => top,
        }
    }

    #[quickcheck]
    fn u33_bytes_round_trip(v: u64) -> bool {
        let x = U33::new(v & MASK33).unwrap();
        U33::from_be_bytes(&x.to_be_bytes()).unwrap() == x
    }

    #[quickcheck]
    fn u129_bytes_round_trip(top: bool, v: u128) -> bool {
        let x = u129(top, v);
        U129::from_be_bytes(&x.to_be_bytes()).unwrap() == x
    }
}
