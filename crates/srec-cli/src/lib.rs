//! S-record command-line library
//!
//! Argument types and command handlers behind the `srec` binary.

pub mod commands;
pub mod output;

use clap::Subcommand;
use srec_formats::{ChecksumPolicy, Endianness};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show record counts, address bounds and sectors
    #[command(visible_alias = "i")]
    Info {
        /// S-record file
        file: PathBuf,
    },

    /// List the contiguous address ranges
    #[command(visible_alias = "sec")]
    Sectors {
        /// S-record file
        file: PathBuf,
    },

    /// Print the record holding an address and the records following it
    #[command(visible_alias = "sl")]
    Show {
        /// S-record file
        file: PathBuf,

        /// Address, tag name or `term (+|-) term` expression
        address: String,

        /// Number of records to print
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Hex dump of words with an ASCII column
    #[command(visible_alias = "d")]
    Dump {
        /// S-record file
        file: PathBuf,

        /// First address; defaults to the lowest address in the file
        address: Option<String>,

        /// Four-byte words per line
        #[arg(short, long, default_value_t = 4)]
        words: usize,

        /// Number of lines
        #[arg(short = 'n', long, default_value_t = 4)]
        lines: usize,

        /// Word byte order
        #[arg(short, long, default_value = "big")]
        endianness: Endianness,
    },

    /// Overwrite bytes starting at an address
    #[command(visible_alias = "p")]
    Patch {
        /// S-record file
        file: PathBuf,

        /// Address, tag name or `term (+|-) term` expression
        address: String,

        /// Hex bytes to write, e.g. DEADBEEF
        value: String,
    },

    /// Copy the data records of another S-record file to an address
    ///
    /// Only data bytes are copied; header records of the source are not.
    #[command(name = "patch-file", visible_alias = "pbf")]
    PatchFile {
        /// S-record file to modify
        file: PathBuf,

        /// Address, tag name or `term (+|-) term` expression
        address: String,

        /// S-record file whose data bytes are written (header records are not copied)
        source: PathBuf,
    },

    /// Recompute every record checksum
    #[command(name = "fix-checksums", visible_alias = "fc")]
    FixChecksums {
        /// S-record file
        file: PathBuf,
    },

    /// Fail if any record carries a stale checksum
    #[command(visible_alias = "v")]
    Verify {
        /// S-record file
        file: PathBuf,
    },

    /// Find runs of ASCII letters and digits
    #[command(visible_alias = "s")]
    Strings {
        /// S-record file
        file: PathBuf,

        /// Shortest run reported
        #[arg(short, long, default_value_t = 4)]
        min_len: usize,
    },

    /// Evaluate an address expression and locate its record
    #[command(visible_alias = "r")]
    Resolve {
        /// S-record file
        file: PathBuf,

        /// Address, tag name or `term (+|-) term` expression
        expression: String,
    },
}

/// Output format options for the CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON output
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// `--tag NAME=ADDR[:LEN]`
///
/// The address is kept as text and resolved once the file is loaded, so a
/// tag may be defined relative to one given before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSpec {
    /// Tag name
    pub name: String,
    /// Address expression
    pub address: String,
    /// Length in bytes
    pub length: usize,
}

impl FromStr for TagSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=ADDR[:LEN], got '{s}'"))?;
        let (address, length) = match rest.rsplit_once(':') {
            Some((address, length)) => {
                let length = length
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| format!("invalid tag length '{length}': {e}"))?;
                (address, length)
            }
            None => (rest, 1),
        };

        let name = name.trim();
        let address = address.trim();
        if name.is_empty() || address.is_empty() {
            return Err(format!("expected NAME=ADDR[:LEN], got '{s}'"));
        }
        Ok(Self {
            name: name.to_string(),
            address: address.to_string(),
            length,
        })
    }
}

/// Context for command execution
#[derive(Clone, Debug)]
pub struct CommandContext {
    /// Output format
    pub format: OutputFormat,
    /// Checksum handling applied to every file loaded
    pub checksum_policy: ChecksumPolicy,
    /// Tags registered right after loading
    pub tags: Vec<TagSpec>,
    /// Destination for modified files
    pub output: Option<PathBuf>,
}

impl Default for CommandContext {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            checksum_policy: ChecksumPolicy::default(),
            tags: Vec::new(),
            output: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_debug() {
        assert_eq!(format!("{:?}", OutputFormat::Text), "Text");
        assert_eq!(format!("{:?}", OutputFormat::Json), "Json");
        assert_eq!(format!("{:?}", OutputFormat::JsonPretty), "JsonPretty");
    }

    #[test]
    fn test_tag_spec_parsing() {
        let spec: TagSpec = "boot=0x1000".parse().unwrap();
        assert_eq!(spec.name, "boot");
        assert_eq!(spec.address, "0x1000");
        assert_eq!(spec.length, 1);

        let spec: TagSpec = "version = boot+0x10:4".parse().unwrap();
        assert_eq!(spec.name, "version");
        assert_eq!(spec.address, "boot+0x10");
        assert_eq!(spec.length, 4);

        assert!("boot".parse::<TagSpec>().is_err());
        assert!("=1000".parse::<TagSpec>().is_err());
        assert!("boot=1000:x".parse::<TagSpec>().is_err());
    }
}
