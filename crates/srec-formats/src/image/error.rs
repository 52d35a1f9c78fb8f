//! Error types for loading, addressing and patching S-record images

use std::path::PathBuf;

use thiserror::Error;

use crate::record::RecordError;

/// Errors that can occur while working with an S-record image
#[derive(Error, Debug)]
pub enum ImageError {
    /// A line could not be parsed; the whole load is abandoned
    #[error("line {line}: {source}")]
    CorruptedRecord {
        /// 1-based line number in the input
        line: usize,
        /// Underlying codec error
        #[source]
        source: RecordError,
    },

    /// Stored checksum differs from the computed one under the strict policy
    #[error(
        "line {line}: checksum mismatch for record at 0x{address:X}: stored {stored:02X}, computed {computed:02X}"
    )]
    ChecksumMismatch {
        /// 1-based line number in the input
        line: usize,
        /// Record address field
        address: u32,
        /// Checksum read from the file
        stored: u8,
        /// Checksum computed from the record contents
        computed: u8,
    },

    /// Two data records claim the same address
    #[error("data record at 0x{second:X} overlaps data record at 0x{first:X}")]
    OverlappingRecords {
        /// Start of the earlier record
        first: u32,
        /// Start of the overlapping record
        second: u32,
    },

    /// Token or expression could not be turned into an address
    #[error("cannot resolve '{0}' to an address")]
    AddressResolution(String),

    /// Address is not backed by any data record
    #[error("address 0x{0:X} is not present in the file")]
    OutOfRange(u32),

    /// Part of a multi-byte span is not backed by data records
    #[error("{len} bytes from 0x{start:X} are not all present in the file: 0x{missing:X} is missing")]
    SpanOutOfRange {
        /// First address of the span
        start: u32,
        /// Length of the span in bytes
        len: u64,
        /// First absent address
        missing: u64,
    },

    /// Patch payload is not a whole number of hex bytes
    #[error("malformed patch '{value}': {reason}")]
    MalformedPatch {
        /// Payload as given
        value: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Value is not a hex number
    #[error("invalid value '{0}': expected a hex number")]
    InvalidValue(String),

    /// Value is wider than the tag it is written through
    #[error("value '{value}' does not fit tag '{tag}' of {length} bytes")]
    ValueTooLarge {
        /// Tag name
        tag: String,
        /// Tag length in bytes
        length: usize,
        /// Value as given
        value: String,
    },

    /// Enumerated option outside its allowed set
    #[error("invalid {option} '{value}': expected one of {expected}")]
    InvalidOption {
        /// Option name
        option: &'static str,
        /// Value as given
        value: String,
        /// Accepted values
        expected: &'static str,
    },

    /// Tag or scope name is empty or contains whitespace, '+' or '-'
    #[error("invalid name '{0}': names must be non-empty without whitespace, '+' or '-'")]
    InvalidName(String),

    /// No tag registered under this name
    #[error("unknown tag '{0}'")]
    UnknownTag(String),

    /// No scope registered under this name
    #[error("unknown scope '{0}'")]
    UnknownScope(String),

    /// Operation needs a loaded image
    #[error("no S-record file loaded")]
    NotLoaded,

    /// Reading or writing a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing to a caller-supplied stream failed
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// Record-level failure
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ImageError {
    /// Whether the error reports an address or span absent from the file
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_) | Self::SpanOutOfRange { .. })
    }
}

/// Type alias for image operation results
pub type Result<T> = std::result::Result<T, ImageError>;
