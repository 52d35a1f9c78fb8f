//! Error types for single-record parsing and mutation

use thiserror::Error;

use super::RecordType;

/// Structural defects that make a line unusable as an S-record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// Records are made of whole bytes, so the character count must be even
    #[error("odd number of characters ({0}), not an S-record")]
    OddLength(usize),

    /// Type prefix is not one of S0, S1, S2, S3, S5, S7, S8, S9
    #[error("unknown record type '{0}'")]
    UnknownType(String),

    /// Line ends before the count, address and checksum fields
    #[error("record too short: {0} characters")]
    Truncated(usize),

    /// Declared byte count does not agree with the field lengths
    #[error("count field is {declared}, but the record holds {actual} bytes")]
    CountMismatch {
        /// Value of the count field
        declared: u8,
        /// Bytes actually present after the count field
        actual: usize,
    },

    /// A field contains characters outside `[0-9A-Fa-f]`
    #[error("{0} field contains non-hexadecimal characters")]
    NonHex(&'static str),
}

/// Errors that can occur when parsing, building or mutating a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The input line is not a valid S-record
    #[error("corrupted record: {0}")]
    Corrupted(#[from] Corruption),

    /// Write payload is not exactly one hex byte
    #[error("invalid byte value '{0}': expected one hex byte")]
    InvalidValue(String),

    /// Data index past the end of the data field
    #[error("data index {index} out of bounds for a record holding {len} bytes")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Number of data bytes in the record
        len: usize,
    },

    /// Address does not fit the subtype's address field
    #[error("address 0x{address:X} does not fit the {width}-byte address field of {kind}")]
    AddressTooWide {
        /// Record subtype
        kind: RecordType,
        /// Address field width in bytes
        width: usize,
        /// Offending address
        address: u32,
    },

    /// Data would run past the end of the 32-bit address space
    #[error("{len} data bytes at 0x{address:X} run past the end of the address space")]
    AddressOverflow {
        /// Start address of the record
        address: u32,
        /// Number of data bytes
        len: usize,
    },

    /// Payload does not fit the one-byte count field
    #[error("{len} data bytes exceed the {max}-byte capacity of {kind} records")]
    PayloadTooLong {
        /// Record subtype
        kind: RecordType,
        /// Maximum payload for this subtype
        max: usize,
        /// Requested payload length
        len: usize,
    },
}

/// Type alias for record operation results
pub type Result<T> = std::result::Result<T, RecordError>;
