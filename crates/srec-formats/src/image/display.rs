//! Text views of a loaded model: summaries, word dumps, record listings and
//! string search

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::error::{ImageError, Result};
use super::labels::{view_span, Endianness};
use super::sector::Sector;
use super::SRecordFile;
use crate::record::Record;

const RULE_WIDTH: usize = 20;

/// Overview of a loaded model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Path the records were read from, if any
    pub source: Option<PathBuf>,
    /// Total number of records
    pub records: usize,
    /// Number of S0 records
    pub header_records: usize,
    /// Number of S1/S2/S3 records
    pub data_records: usize,
    /// Number of S5/S7/S8/S9 records
    pub footer_records: usize,
    /// Lowest addressable byte
    pub lowest_address: Option<u32>,
    /// Highest addressable byte
    pub highest_address: Option<u32>,
    /// Hex digits used when printing addresses
    pub address_chars: usize,
    /// Contiguous address ranges, ascending
    pub sectors: Vec<Sector>,
    /// Records whose stored checksum is stale
    pub stale_checksums: usize,
}

impl FileSummary {
    fn address(&self, address: u32) -> String {
        format!("0x{address:0width$X}", width = self.address_chars)
    }

    fn sector_lines(&self) -> String {
        self.sectors
            .iter()
            .enumerate()
            .map(|(i, sector)| {
                format!(
                    "Sector {i}: {} - {} ({} bytes)\n",
                    self.address(sector.start),
                    self.address(sector.end),
                    sector.len()
                )
            })
            .collect()
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        if let Some(source) = &self.source {
            writeln!(f, "File {}", source.display())?;
        }
        writeln!(
            f,
            "{} records: {} header, {} data, {} footer",
            self.records, self.header_records, self.data_records, self.footer_records
        )?;
        if self.stale_checksums > 0 {
            writeln!(f, "{} records with a stale checksum", self.stale_checksums)?;
        }
        writeln!(f, "{rule}")?;
        match (self.lowest_address, self.highest_address) {
            (Some(low), Some(high)) => {
                writeln!(f, "   Lower address  : {}", self.address(low))?;
                writeln!(f, "   Higher address : {}", self.address(high))?;
            }
            _ => writeln!(f, "   No data")?,
        }
        writeln!(f, "{rule}")?;
        f.write_str(&self.sector_lines())?;
        write!(f, "{rule}")
    }
}

/// Run of ASCII alphanumerics found in the data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundString {
    /// Address of the first character
    pub address: u32,
    /// The characters
    pub text: String,
}

fn printable(byte: u8) -> char {
    if byte.is_ascii_alphanumeric() {
        char::from(byte)
    } else {
        '.'
    }
}

impl SRecordFile {
    /// Counts, bounds and sectors of the loaded model
    pub fn summary(&self) -> Result<FileSummary> {
        let image = self.image()?;
        let bounds = image.index.bounds();
        Ok(FileSummary {
            source: self.source.clone(),
            records: image.header.len() + image.data.len() + image.footer.len(),
            header_records: image.header.len(),
            data_records: image.data.len(),
            footer_records: image.footer.len(),
            lowest_address: bounds.map(|(low, _)| low),
            highest_address: bounds.map(|(_, high)| high),
            address_chars: image.address_chars,
            sectors: image.sectors.clone(),
            stale_checksums: self.checksum_mismatches()?.len(),
        })
    }

    /// Multi-line overview: record counts, address bounds and sectors
    pub fn get_file_summary(&self) -> Result<String> {
        Ok(self.summary()?.to_string())
    }

    /// One line per sector
    pub fn get_sector_summary(&self) -> Result<String> {
        Ok(self.summary()?.sector_lines())
    }

    /// Four bytes at `address`, reversed for little endian
    pub fn get_word(&self, address: u32, endianness: Endianness) -> Result<[u8; 4]> {
        let bytes = self.read(address, 4)?;
        let mut word = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if endianness == Endianness::Little {
            word.reverse();
        }
        Ok(word)
    }

    /// Offset ruler printed above [`binary_display`](Self::binary_display)
    pub fn binary_display_header(&self, words: usize, endianness: Endianness) -> Result<String> {
        // A line wider than the 32-bit address space can never be dumped
        let width = view_span(words, 1)
            .ok()
            .filter(|&span| span <= 1 << 32)
            .and_then(|_| words.checked_mul(14))
            .ok_or_else(|| ImageError::InvalidOption {
                option: "view size",
                value: format!("{words} words"),
                expected: "at least one word, within the 32-bit address space",
            })?;
        let indent = " ".repeat(self.address_chars()? + 2);
        let rule = "-".repeat(width - 3);
        let offsets = (0..words)
            .map(|word| {
                let mut offsets: Vec<String> =
                    (0..4).map(|i| format!("{:02X}", word * 4 + i)).collect();
                if endianness == Endianness::Little {
                    offsets.reverse();
                }
                offsets.join(" ")
            })
            .collect::<Vec<_>>()
            .join("   ");
        Ok(format!("{indent}{rule}\n{indent}{offsets}\n{indent}{rule}"))
    }

    /// One dump line: address, `words` words and the ASCII column
    pub fn binary_display_line(
        &self,
        address: u32,
        words: usize,
        endianness: Endianness,
    ) -> Result<String> {
        self.image()?.require_span(address, view_span(words, 1)?)?;

        let mut hex = Vec::with_capacity(words);
        let mut ascii = String::with_capacity(words * 4);
        for i in 0..words {
            let word = self.get_word(address + 4 * i as u32, endianness)?;
            hex.push(
                word.iter()
                    .map(|byte| format!("{byte:02X}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            ascii.extend(word.iter().copied().map(printable));
        }

        Ok(format!(
            "{address:0width$X}: {}   {ascii}",
            hex.join("   "),
            width = self.address_chars()?
        ))
    }

    /// `lines` dump lines starting at `address`
    pub fn binary_display(
        &self,
        address: u32,
        words: usize,
        lines: usize,
        endianness: Endianness,
    ) -> Result<String> {
        self.image()?.require_span(address, view_span(words, lines)?)?;
        let stride = 4 * words as u64;

        (0..lines)
            .map(|line| {
                let start = u64::from(address) + stride * line as u64;
                self.binary_display_line(start as u32, words, endianness)
            })
            .collect::<Result<Vec<_>>>()
            .map(|lines| lines.join("\n"))
    }

    /// Header and dump of a named scope
    pub fn render_scope(&self, name: &str) -> Result<String> {
        let scope = self.scope(name)?;
        Ok(format!(
            "{}\n{}",
            self.binary_display_header(scope.words, scope.endianness)?,
            self.binary_display(scope.address, scope.words, scope.lines, scope.endianness)?
        ))
    }

    /// The data record owning `address` and up to `count - 1` records that
    /// follow it without a gap
    pub fn show_records(&self, address: u32, count: usize) -> Result<Vec<&Record>> {
        let image = self.image()?;
        let slot = image
            .index
            .resolve(address)
            .ok_or(ImageError::OutOfRange(address))?;

        let mut shown: Vec<&Record> = Vec::with_capacity(count);
        let mut next = Some(slot.start);
        for record in image.data[slot.position..]
            .iter()
            .filter(|record| !record.is_empty())
        {
            if shown.len() == count || next != Some(record.address()) {
                break;
            }
            next = record.end_address().and_then(|end| end.checked_add(1));
            shown.push(record);
        }
        Ok(shown)
    }

    /// Runs of at least `min_len` ASCII alphanumerics; a gap in the address
    /// space ends a run
    pub fn strings(&self, min_len: usize) -> Result<Vec<FoundString>> {
        let mut found = Vec::new();
        let mut current: Option<FoundString> = None;
        let mut expected = None;

        for (address, byte) in self.bytes()? {
            let contiguous = expected == Some(address);
            expected = address.checked_add(1);

            match current.as_mut() {
                Some(run) if contiguous && byte.is_ascii_alphanumeric() => {
                    run.text.push(char::from(byte));
                    continue;
                }
                _ => {}
            }
            found.extend(current.take().filter(|run| run.text.len() >= min_len));
            if byte.is_ascii_alphanumeric() {
                current = Some(FoundString {
                    address,
                    text: char::from(byte).to_string(),
                });
            }
        }
        found.extend(current.filter(|run| run.text.len() >= min_len));
        Ok(found)
    }
}
