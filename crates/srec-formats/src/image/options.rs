//! Load-time configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ImageError;

/// What to do with a record whose stored checksum is stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Keep the checksum as read and log a warning
    #[default]
    Trust,
    /// Abort the load
    Strict,
    /// Recompute the checksum while loading
    Repair,
}

impl FromStr for ChecksumPolicy {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "strict" => Ok(Self::Strict),
            "repair" => Ok(Self::Repair),
            _ => Err(ImageError::InvalidOption {
                option: "checksum policy",
                value: s.to_string(),
                expected: "trust, strict, repair",
            }),
        }
    }
}

impl fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trust => "trust",
            Self::Strict => "strict",
            Self::Repair => "repair",
        })
    }
}

/// Options applied when ingesting records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    checksum_policy: ChecksumPolicy,
}

impl LoadOptions {
    /// Default options: checksums are trusted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the checksum policy
    #[must_use]
    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    /// Selected checksum policy
    #[must_use]
    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }
}
