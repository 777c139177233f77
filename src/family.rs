use std::fmt::{Display, Error, Formatter};

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub const fn octet_count(self) -> usize {
        match self {
            Family::V4 => 4,
            Family::V6 => 16,
        }
    }

    pub const fn bit_width(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    /// Textual segment separator.
    pub const fn separator(self) -> char {
        match self {
            Family::V4 => '.',
            Family::V6 => ':',
        }
    }

    pub(crate) fn from_octet_count(len: usize) -> Option<Family> {
        match len {
            4 => Some(Family::V4),
            16 => Some(Family::V6),
            _ => None,
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}
