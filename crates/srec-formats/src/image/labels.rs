//! Named tags and display scopes

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ImageError, Result};
use super::SRecordFile;

/// Byte order used when grouping four bytes into a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Lowest address first
    #[default]
    Big,
    /// Highest address first
    Little,
}

impl FromStr for Endianness {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "big" => Ok(Self::Big),
            "little" => Ok(Self::Little),
            _ => Err(ImageError::InvalidOption {
                option: "endianness",
                value: s.to_string(),
                expected: "big, little",
            }),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Big => "big",
            Self::Little => "little",
        })
    }
}

/// Named address, optionally covering several bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// First byte
    pub address: u32,
    /// Number of bytes written by [`SRecordFile::set_tag`]
    pub length: usize,
}

/// Named hex-dump view: `lines` rows of `words` four-byte words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// First byte shown
    pub address: u32,
    /// Words per line
    pub words: usize,
    /// Number of lines
    pub lines: usize,
    /// Word byte order
    pub endianness: Endianness,
}

impl Scope {
    /// Bytes covered by the view, saturating at `u64::MAX`
    #[must_use]
    pub fn span(&self) -> u64 {
        (self.words as u64)
            .saturating_mul(4)
            .saturating_mul(self.lines as u64)
    }
}

/// Bytes covered by a dump view of `lines` lines of `words` words.
///
/// Empty views and views whose size does not fit in a `u64` are rejected.
pub(crate) fn view_span(words: usize, lines: usize) -> Result<u64> {
    (words as u64)
        .checked_mul(4)
        .and_then(|stride| stride.checked_mul(lines as u64))
        .filter(|&span| span > 0)
        .ok_or_else(|| ImageError::InvalidOption {
            option: "view size",
            value: format!("{words} words x {lines} lines"),
            expected: "at least one word and one line, at most u64::MAX bytes in total",
        })
}

// Tags shadow hex literals in address expressions, so only the expression
// operators and whitespace are off limits.
fn validate_name(name: &str) -> Result<()> {
    let well_formed = !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '+' || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ImageError::InvalidName(name.to_string()))
    }
}

impl SRecordFile {
    /// Name a single byte
    pub fn add_tag(&mut self, name: &str, address: u32) -> Result<()> {
        self.add_tag_with_length(name, address, 1)
    }

    /// Name a run of `length` bytes; an existing tag of the same name is replaced
    ///
    /// A tag whose name reads as hex shadows that literal in
    /// [`convert_address`](Self::convert_address); write it with `0x` to reach the address.
    pub fn add_tag_with_length(&mut self, name: &str, address: u32, length: usize) -> Result<()> {
        validate_name(name)?;
        if length == 0 {
            return Err(ImageError::InvalidOption {
                option: "tag length",
                value: length.to_string(),
                expected: "at least 1 byte",
            });
        }
        let image = self.image_mut()?;
        image.require_span(address, length as u64)?;
        image
            .tags
            .insert(name.to_string(), Tag { address, length });
        Ok(())
    }

    /// Look up a tag
    pub fn tag(&self, name: &str) -> Result<Tag> {
        self.image()?
            .tags
            .get(name)
            .copied()
            .ok_or_else(|| ImageError::UnknownTag(name.to_string()))
    }

    /// Every tag, by name
    pub fn tags(&self) -> Result<&BTreeMap<String, Tag>> {
        Ok(&self.image()?.tags)
    }

    /// Forget a tag, returning it if it existed
    pub fn remove_tag(&mut self, name: &str) -> Result<Option<Tag>> {
        Ok(self.image_mut()?.tags.remove(name))
    }

    /// Write a hex number through a tag, zero-padded to the tag length
    pub fn set_tag(&mut self, name: &str, value: &str) -> Result<()> {
        let tag = self.tag(name)?;
        let digits = value
            .trim()
            .strip_prefix("0x")
            .or_else(|| value.trim().strip_prefix("0X"))
            .unwrap_or_else(|| value.trim());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ImageError::InvalidValue(value.to_string()));
        }

        let significant = digits.trim_start_matches('0');
        let width = tag.length * 2;
        if significant.len() > width {
            return Err(ImageError::ValueTooLarge {
                tag: name.to_string(),
                length: tag.length,
                value: value.to_string(),
            });
        }
        self.patch(tag.address, &format!("{significant:0>width$}"))
    }

    /// Register a hex-dump view; every byte it shows must exist
    pub fn add_scope(
        &mut self,
        name: &str,
        address: u32,
        words: usize,
        lines: usize,
        endianness: Endianness,
    ) -> Result<()> {
        validate_name(name)?;
        let span = view_span(words, lines)?;
        let scope = Scope {
            address,
            words,
            lines,
            endianness,
        };
        let image = self.image_mut()?;
        image.require_span(address, span)?;
        image.scopes.insert(name.to_string(), scope);
        Ok(())
    }

    /// Look up a scope
    pub fn scope(&self, name: &str) -> Result<Scope> {
        self.image()?
            .scopes
            .get(name)
            .copied()
            .ok_or_else(|| ImageError::UnknownScope(name.to_string()))
    }

    /// Every scope, by name
    pub fn scopes(&self) -> Result<&BTreeMap<String, Scope>> {
        Ok(&self.image()?.scopes)
    }

    /// Forget a scope, returning it if it existed
    pub fn remove_scope(&mut self, name: &str) -> Result<Option<Scope>> {
        Ok(self.image_mut()?.scopes.remove(name))
    }
}
