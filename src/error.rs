use thiserror::Error;

/// Rejected input. Arithmetic overflow is not an error and is reported
/// through `Option` by the `checked_*` methods instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),
    #[error("Invalid IP network: {0}")]
    InvalidNetwork(String),
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),
    #[error("Prefix {prefix} should equal or less than {max}")]
    PrefixOutOfRange { prefix: u32, max: u8 },
    #[error("Cannot go from /{from} to /{to} in this direction")]
    WrongPrefixDirection { from: u8, to: u8 },
    #[error("Netmask is not contiguous")]
    NonContiguousNetmask,
    #[error("Operand lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("Invalid byte length: {len}")]
    InvalidLength { len: usize },
    #[error("{0} has host bits set")]
    HostBitsSet(String),
    #[error("{0} is outside network {1}")]
    AddressOutsideNetwork(String, String),
    #[error("Address families differ")]
    FamilyMismatch,
    #[error("Shift {shift} out of range 0..={max}")]
    ShiftOutOfRange { shift: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, CidrError>;
