use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::Corruption;

/// S-record subtype, identified by the two-character prefix of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// Header record, 16-bit address (usually zero), payload is free-form text
    S0,
    /// Data record with a 16-bit address
    S1,
    /// Data record with a 24-bit address
    S2,
    /// Data record with a 32-bit address
    S3,
    /// 16-bit count of the data records in the file
    S5,
    /// Termination record with a 32-bit start address
    S7,
    /// Termination record with a 24-bit start address
    S8,
    /// Termination record with a 16-bit start address
    S9,
}

/// Where a record lives inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    /// Leading header (`S0`)
    Header,
    /// Addressable payload (`S1`, `S2`, `S3`)
    Data,
    /// Record count (`S5`)
    Count,
    /// Execution start address (`S7`, `S8`, `S9`)
    Termination,
}

impl RecordType {
    /// Every supported subtype, in numeric order
    pub const ALL: [Self; 8] = [
        Self::S0,
        Self::S1,
        Self::S2,
        Self::S3,
        Self::S5,
        Self::S7,
        Self::S8,
        Self::S9,
    ];

    /// Width of the address field in bytes
    #[must_use]
    pub const fn address_width(self) -> usize {
        match self {
            Self::S0 | Self::S1 | Self::S5 | Self::S9 => 2,
            Self::S2 | Self::S8 => 3,
            Self::S3 | Self::S7 => 4,
        }
    }

    /// Width of the address field in hex characters
    #[must_use]
    pub const fn address_chars(self) -> usize {
        self.address_width() * 2
    }

    /// Largest address representable in this subtype's address field
    #[must_use]
    pub const fn max_address(self) -> u32 {
        match self.address_width() {
            2 => 0xFFFF,
            3 => 0xFF_FFFF,
            _ => u32::MAX,
        }
    }

    /// Largest data payload, bounded by the one-byte count field
    #[must_use]
    pub const fn max_payload(self) -> usize {
        u8::MAX as usize - self.address_width() - 1
    }

    /// Classify the subtype
    #[must_use]
    pub const fn class(self) -> RecordClass {
        match self {
            Self::S0 => RecordClass::Header,
            Self::S1 | Self::S2 | Self::S3 => RecordClass::Data,
            Self::S5 => RecordClass::Count,
            Self::S7 | Self::S8 | Self::S9 => RecordClass::Termination,
        }
    }

    /// Two-character prefix as it appears in a file
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S0 => "S0",
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
            Self::S5 => "S5",
            Self::S7 => "S7",
            Self::S8 => "S8",
            Self::S9 => "S9",
        }
    }
}

impl FromStr for RecordType {
    type Err = Corruption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Corruption::UnknownType(s.to_string()))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
