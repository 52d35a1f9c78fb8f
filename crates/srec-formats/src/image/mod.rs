//! Addressable in-memory model of a whole S-record file
//!
//! [`SRecordFile`] ingests a sequence of lines, classifies the records into
//! header, data and footer, sorts the data records by address, and builds an
//! index that maps every global address to the record owning it. All byte-level
//! reads go through that index, so the record data is the single source of
//! truth and a patch is visible everywhere as soon as it is written.
//!
//! # State
//!
//! A freshly constructed model is empty. [`SRecordFile::ingest`] loads it;
//! every other operation fails with [`ImageError::NotLoaded`] until then. A
//! failed ingest leaves the previous state untouched.
//!
//! # Example
//!
//! ```
//! use srec_formats::image::SRecordFile;
//!
//! let mut file = SRecordFile::parse_str(
//!     "S00600004844521B\nS1070100DEADBEEFBF\nS1070104CAFEF00D2E\nS9030000FC\n",
//! )
//! .expect("Test operation should succeed");
//!
//! assert_eq!(file.sectors().expect("loaded").len(), 1);
//!
//! // Patch across the record boundary at 0x104
//! file.patch(0x103, "AABB").expect("Test operation should succeed");
//! assert_eq!(file.read(0x102, 4).expect("loaded"), vec![0xBE, 0xAA, 0xBB, 0xFE]);
//! assert!(file.records().expect("loaded").all(|r| r.has_valid_checksum()));
//! ```

mod address;
mod display;
mod error;
mod labels;
mod options;
mod sector;

pub use display::{FileSummary, FoundString};
pub use error::{ImageError, Result};
pub use labels::{Endianness, Scope, Tag};
pub use options::{ChecksumPolicy, LoadOptions};
pub use sector::{Coordinate, Sector};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::record::{Record, RecordClass, RecordType};
use sector::AddressIndex;

/// Loaded state: records, derived index and named registries
#[derive(Debug, Clone, PartialEq, Eq)]
struct Image {
    header: Vec<Record>,
    data: Vec<Record>,
    footer: Vec<Record>,
    index: AddressIndex,
    sectors: Vec<Sector>,
    tags: BTreeMap<String, Tag>,
    scopes: BTreeMap<String, Scope>,
    address_chars: usize,
}

/// Record whose stored checksum does not match its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaleChecksum {
    /// Record subtype
    pub kind: RecordType,
    /// Record address field
    pub address: u32,
    /// Checksum as stored
    pub stored: u8,
    /// Checksum computed from the record contents
    pub computed: u8,
}

/// Deep copy of a loaded model, taken with [`SRecordFile::snapshot`]
///
/// The snapshot owns its own copies of every record, tag and scope; later
/// mutations of the model never show through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    image: Image,
}

/// S-record file model
#[derive(Debug, Clone, Default)]
pub struct SRecordFile {
    options: LoadOptions,
    source: Option<PathBuf>,
    image: Option<Image>,
}

impl SRecordFile {
    /// Create an empty model with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model with the given options
    #[must_use]
    pub fn with_options(options: LoadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Load a file with default options
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_options(path, LoadOptions::default())
    }

    /// Load a file with the given options
    pub fn from_path_with_options<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let mut file = Self::with_options(options);
        file.ingest_path(path)?;
        Ok(file)
    }

    /// Load from in-memory text with default options
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut file = Self::new();
        file.ingest(content.lines())?;
        Ok(file)
    }

    /// Options applied by [`ingest`](Self::ingest)
    #[must_use]
    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Path the model was last loaded from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether records have been ingested
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    fn image(&self) -> Result<&Image> {
        self.image.as_ref().ok_or(ImageError::NotLoaded)
    }

    fn image_mut(&mut self) -> Result<&mut Image> {
        self.image.as_mut().ok_or(ImageError::NotLoaded)
    }

    /// Read every line of `path` and ingest it
    pub fn ingest_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!("Importing {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.ingest(content.lines())?;
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    /// Parse and index `lines`, replacing the current state on success
    ///
    /// The recorded source path is cleared; [`ingest_path`](Self::ingest_path)
    /// sets it again once its lines are in.
    ///
    /// Blank lines are skipped. Header (`S0`) records go to the header list,
    /// count and termination records (`S5`, `S7`-`S9`) to the footer list,
    /// both in file order; data records are sorted by address.
    pub fn ingest<I, S>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let policy = self.options.checksum_policy();
        let mut header = Vec::new();
        let mut data = Vec::new();
        let mut footer = Vec::new();

        for (number, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let number = number + 1;
            let mut record = Record::parse(line)
                .map_err(|source| ImageError::CorruptedRecord { line: number, source })?;

            if !record.has_valid_checksum() {
                match policy {
                    ChecksumPolicy::Trust => warn!(
                        "line {}: stale checksum {:02X} on record at 0x{:X}, expected {:02X}",
                        number,
                        record.checksum(),
                        record.address(),
                        record.compute_checksum()
                    ),
                    ChecksumPolicy::Strict => {
                        return Err(ImageError::ChecksumMismatch {
                            line: number,
                            address: record.address(),
                            stored: record.checksum(),
                            computed: record.compute_checksum(),
                        });
                    }
                    ChecksumPolicy::Repair => {
                        debug!("line {}: repairing checksum", number);
                        record.update_checksum();
                    }
                }
            }

            match record.kind().class() {
                RecordClass::Header => header.push(record),
                RecordClass::Data => data.push(record),
                RecordClass::Count | RecordClass::Termination => footer.push(record),
            }
        }

        data.sort_by_key(Record::address);
        let (index, sectors) = AddressIndex::build(&data)?;
        let address_chars = data
            .iter()
            .map(|record| record.kind().address_chars())
            .max()
            .unwrap_or(RecordType::S1.address_chars());

        info!(
            "Loaded {} records ({} data) in {} sectors",
            header.len() + data.len() + footer.len(),
            data.len(),
            sectors.len()
        );

        self.source = None;
        self.image = Some(Image {
            header,
            data,
            footer,
            index,
            sectors,
            tags: BTreeMap::new(),
            scopes: BTreeMap::new(),
            address_chars,
        });
        Ok(())
    }

    /// Header records in file order
    pub fn header_records(&self) -> Result<&[Record]> {
        Ok(&self.image()?.header)
    }

    /// Data records in ascending address order
    pub fn data_records(&self) -> Result<&[Record]> {
        Ok(&self.image()?.data)
    }

    /// Count and termination records in file order
    pub fn footer_records(&self) -> Result<&[Record]> {
        Ok(&self.image()?.footer)
    }

    /// Every record in export order: header, data, footer
    pub fn records(&self) -> Result<impl Iterator<Item = &Record>> {
        let image = self.image()?;
        Ok(image.header.iter().chain(&image.data).chain(&image.footer))
    }

    /// Data record starting exactly at `address`
    pub fn record_at(&self, address: u32) -> Result<&Record> {
        let image = self.image()?;
        let slot = image
            .index
            .resolve(address)
            .filter(|slot| slot.start == address)
            .ok_or(ImageError::OutOfRange(address))?;
        Ok(&image.data[slot.position])
    }

    /// Contiguous address ranges, ascending
    pub fn sectors(&self) -> Result<&[Sector]> {
        Ok(&self.image()?.sectors)
    }

    /// Lowest and highest addressable byte, `None` without data
    pub fn bounds(&self) -> Result<Option<(u32, u32)>> {
        Ok(self.image()?.index.bounds())
    }

    /// Hex digits used to print addresses: the widest data address field
    pub fn address_chars(&self) -> Result<usize> {
        Ok(self.image()?.address_chars)
    }

    /// Whether `address` is backed by a data record
    pub fn contains_address(&self, address: u32) -> Result<bool> {
        Ok(self.image()?.index.resolve(address).is_some())
    }

    /// Turn a hex string, tag name or `term (+|-) term` expression into an address
    pub fn convert_address(&self, token: &str) -> Result<u32> {
        address::resolve(token, &self.image()?.tags)
    }

    /// Owning record and offset of `address`
    pub fn get_coordinate(&self, address: u32) -> Result<Coordinate> {
        let slot = self
            .image()?
            .index
            .resolve(address)
            .ok_or(ImageError::OutOfRange(address))?;
        Ok(Coordinate {
            record: slot.start,
            offset: slot.offset,
        })
    }

    /// Byte stored at `address`
    pub fn byte_at(&self, address: u32) -> Result<u8> {
        let image = self.image()?;
        let slot = image
            .index
            .resolve(address)
            .ok_or(ImageError::OutOfRange(address))?;
        Ok(image.data[slot.position].data()[slot.offset])
    }

    /// `len` consecutive bytes starting at `address`
    pub fn read(&self, address: u32, len: usize) -> Result<Vec<u8>> {
        let image = self.image()?;
        image.require_span(address, len as u64)?;
        (0..len)
            .map(|i| {
                let slot = image
                    .index
                    .resolve(address + i as u32)
                    .ok_or(ImageError::OutOfRange(address))?;
                Ok(image.data[slot.position].data()[slot.offset])
            })
            .collect()
    }

    /// Every addressable byte, ascending
    pub fn bytes(&self) -> Result<impl Iterator<Item = (u32, u8)> + '_> {
        let image = self.image()?;
        Ok(image.index.positions().flat_map(move |position| {
            let record = &image.data[position];
            record
                .data()
                .iter()
                .enumerate()
                .map(move |(offset, byte)| (record.address() + offset as u32, *byte))
        }))
    }

    /// Address → byte map of the whole image
    pub fn byte_map(&self) -> Result<BTreeMap<u32, u8>> {
        Ok(self.bytes()?.collect())
    }

    /// Concatenated data bytes of all data records, in address order
    pub fn data_payload(&self) -> Result<Vec<u8>> {
        Ok(self.bytes()?.map(|(_, byte)| byte).collect())
    }

    /// Write a hex payload starting at `address`
    ///
    /// The whole destination span is resolved before anything is written, so
    /// a patch either lands completely or not at all.
    pub fn patch(&mut self, address: u32, value: &str) -> Result<()> {
        let value = value.trim();
        if value.len() % 2 != 0 {
            return Err(ImageError::MalformedPatch {
                value: value.to_string(),
                reason: "odd number of hex digits",
            });
        }
        let bytes = hex::decode(value).map_err(|_| ImageError::MalformedPatch {
            value: value.to_string(),
            reason: "non-hexadecimal characters",
        })?;
        self.get_coordinate(address)?;
        self.patch_bytes(address, &bytes)
    }

    /// Write raw bytes starting at `address`, all-or-nothing
    pub fn patch_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let image = self.image_mut()?;
        image.require_span(address, bytes.len() as u64)?;

        let mut touched: HashMap<usize, usize> = HashMap::new();
        for (i, byte) in bytes.iter().enumerate() {
            let target = address + i as u32;
            let slot = image
                .index
                .resolve(target)
                .ok_or(ImageError::OutOfRange(target))?;
            image.data[slot.position].set_byte(slot.offset, *byte)?;
            *touched.entry(slot.position).or_default() += 1;
        }

        debug!(
            "Patched {} bytes at 0x{:X} across {} records",
            bytes.len(),
            address,
            touched.len()
        );
        Ok(())
    }

    /// Write the data payload of `other` starting at `address`
    pub fn patch_from(&mut self, address: u32, other: &Self) -> Result<()> {
        let payload = other.data_payload()?;
        self.patch_bytes(address, &payload)
    }

    /// Recompute every checksum, returning how many changed
    pub fn fix_checksums(&mut self) -> Result<usize> {
        let image = self.image_mut()?;
        let fixed = image
            .header
            .iter_mut()
            .chain(&mut image.data)
            .chain(&mut image.footer)
            .map(Record::update_checksum)
            .filter(|changed| *changed)
            .count();
        info!("Fixed {} checksums", fixed);
        Ok(fixed)
    }

    /// Records whose stored checksum is stale
    pub fn checksum_mismatches(&self) -> Result<Vec<StaleChecksum>> {
        Ok(self
            .records()?
            .filter(|record| !record.has_valid_checksum())
            .map(|record| StaleChecksum {
                kind: record.kind(),
                address: record.address(),
                stored: record.checksum(),
                computed: record.compute_checksum(),
            })
            .collect())
    }

    /// Serialized lines in export order
    pub fn to_lines(&self) -> Result<Vec<String>> {
        Ok(self.records()?.map(Record::to_line).collect())
    }

    /// Write every record, newline-terminated, to `writer`
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        for record in self.records()? {
            writeln!(writer, "{record}")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the file to `path`
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::create(path).map_err(io_error)?;
        self.write_to(file).map_err(|err| match err {
            ImageError::Stream(source) => io_error(source),
            other => other,
        })?;
        info!("Exported {}", path.display());
        Ok(())
    }

    /// Deep copy of the current state
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            image: self.image()?.clone(),
        })
    }

    /// Replace the current state with `snapshot`
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.image = Some(snapshot.image);
    }

    /// Whether any record differs from `snapshot`
    pub fn differs_from(&self, snapshot: &Snapshot) -> Result<bool> {
        let image = self.image()?;
        let other = &snapshot.image;
        Ok(image.header != other.header || image.data != other.data || image.footer != other.footer)
    }
}

impl Image {
    fn require_span(&self, start: u32, len: u64) -> Result<()> {
        match self.index.first_missing(start, len) {
            None => Ok(()),
            Some(missing) if len == 1 => Err(ImageError::OutOfRange(missing as u32)),
            Some(missing) => Err(ImageError::SpanOutOfRange {
                start,
                len,
                missing,
            }),
        }
    }
}
