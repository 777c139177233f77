//! Stateless helpers over network-order (big-endian) byte sequences.

use crate::error::{CidrError, Result};
use std::cmp::Ordering;

fn same_len(a: &[u8], b: &[u8]) -> Result<()> {
    if a.len() != b.len() {
        return Err(CidrError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

fn zip_with(a: &[u8], b: &[u8], op: impl Fn(u8, u8) -> u8) -> Result<Vec<u8>> {
    same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| op(*x, *y)).collect())
}

pub fn and(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    zip_with(a, b, |x, y| x & y)
}

pub fn or(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    zip_with(a, b, |x, y| x | y)
}

pub fn xor(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    zip_with(a, b, |x, y| x ^ y)
}

pub fn invert(a: &[u8]) -> Vec<u8> {
    a.iter().map(|x| !x).collect()
}

/// ANDs `mask` into `target` and returns how many bits were cleared.
pub fn and_in_place(target: &mut [u8], mask: &[u8]) -> Result<u32> {
    same_len(target, mask)?;
    let mut changed = 0;
    for (t, m) in target.iter_mut().zip(mask) {
        let masked = *t & m;
        changed += (*t ^ masked).count_ones();
        *t = masked;
    }
    Ok(changed)
}

/// Unsigned comparison that ignores leading zero bytes, so `[0, 1]` and
/// `[1]` compare equal.
pub fn compare_unsigned_be(a: &[u8], b: &[u8]) -> Ordering {
    fn significant(v: &[u8]) -> &[u8] {
        let start = v.iter().position(|x| *x != 0).unwrap_or(v.len());
        &v[start..]
    }
    let a = significant(a);
    let b = significant(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Longest mask any family uses.
const MAX_MASK_OCTETS: usize = 16;

pub fn prefix_to_netmask(prefix: u8, octet_count: usize) -> Result<Vec<u8>> {
    if octet_count > MAX_MASK_OCTETS {
        return Err(CidrError::InvalidLength { len: octet_count });
    }
    let max = (octet_count * 8) as u8;
    if prefix > max {
        return Err(CidrError::PrefixOutOfRange {
            prefix: prefix as u32,
            max,
        });
    }
    let full = prefix as usize / 8;
    let partial = prefix % 8;
    let mut mask = vec![0u8; octet_count];
    for b in mask.iter_mut().take(full) {
        *b = 0xFF;
    }
    if partial > 0 {
        mask[full] = 0xFFu8 << (8 - partial);
    }
    Ok(mask)
}

pub fn netmask_to_prefix(mask: &[u8]) -> Result<u8> {
    if mask.len() > MAX_MASK_OCTETS {
        return Err(CidrError::InvalidLength { len: mask.len() });
    }
    let mut prefix = 0u8;
    let mut seen_zero = false;
    for byte in mask {
        for i in (0..8).rev() {
            if (*byte >> i) & 1 == 1 {
                if seen_zero {
                    return Err(CidrError::NonContiguousNetmask);
                }
                prefix += 1;
            } else {
                seen_zero = true;
            }
        }
    }
    Ok(prefix)
}
