//! Single S-record codec
//!
//! An S-record is one line of ASCII hex:
//!
//! ```text
//! <type:2><count:2><address:N><data:2*(count-N/2-1)><checksum:2>
//! ```
//!
//! - **type**: `S0`..`S9` prefix selecting the address width (see [`RecordType`])
//! - **count**: number of bytes that follow (address + data + checksum)
//! - **checksum**: one's complement of the low byte of the sum of the count,
//!   address and data bytes
//!
//! Records are immutable except for their data bytes, and every data write goes
//! through [`Record::set_byte`] so the checksum is recomputed on the spot.
//!
//! # Example
//!
//! ```
//! use srec_formats::record::{Record, RecordType};
//!
//! let record = Record::parse("S1130000285F245F2400082A0000000000002A")
//!     .expect("Test operation should succeed");
//! assert_eq!(record.kind(), RecordType::S1);
//! assert_eq!(record.count(), 0x13);
//! assert_eq!(record.data().len(), 16);
//! assert_eq!(record.compute_checksum(), 0x2A);
//! assert_eq!(record.to_line(), "S1130000285F245F2400082A0000000000002A");
//! ```

mod error;
mod kind;

pub use error::{Corruption, RecordError, Result};
pub use kind::{RecordClass, RecordType};

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// One parsed S-record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: RecordType,
    address: u32,
    data: Vec<u8>,
    checksum: u8,
}

impl Record {
    /// Build a record with a freshly computed checksum
    pub fn new(kind: RecordType, address: u32, data: Vec<u8>) -> Result<Self> {
        if address > kind.max_address() {
            return Err(RecordError::AddressTooWide {
                kind,
                width: kind.address_width(),
                address,
            });
        }
        if data.len() > kind.max_payload() {
            return Err(RecordError::PayloadTooLong {
                kind,
                max: kind.max_payload(),
                len: data.len(),
            });
        }
        check_address_space(address, data.len())?;

        let mut record = Self {
            kind,
            address,
            data,
            checksum: 0,
        };
        record.update_checksum();
        Ok(record)
    }

    /// Parse one line, keeping the checksum exactly as stored
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.len() % 2 != 0 {
            return Err(Corruption::OddLength(line.len()).into());
        }
        if !line.is_ascii() {
            return Err(Corruption::NonHex("record").into());
        }
        let prefix = line.get(..2).ok_or(Corruption::Truncated(line.len()))?;
        let kind: RecordType = prefix.parse()?;

        let address_end = 4 + kind.address_chars();
        if line.len() < address_end + 2 {
            return Err(Corruption::Truncated(line.len()).into());
        }

        let declared = decode_field(&line[2..4], "count")?[0];
        let actual = (line.len() - 4) / 2;
        if usize::from(declared) != actual {
            return Err(Corruption::CountMismatch { declared, actual }.into());
        }

        let address = decode_field(&line[4..address_end], "address")?
            .into_iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(byte));
        let data = decode_field(&line[address_end..line.len() - 2], "data")?;
        let checksum = decode_field(&line[line.len() - 2..], "checksum")?[0];
        check_address_space(address, data.len())?;

        Ok(Self {
            kind,
            address,
            data,
            checksum,
        })
    }

    /// Serialize to a single line without terminator
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}{:02X}{:0width$X}{}{:02X}",
            self.kind,
            self.count(),
            self.address,
            hex::encode_upper(&self.data),
            self.checksum,
            width = self.kind.address_chars()
        )
    }

    /// Record subtype
    #[must_use]
    pub fn kind(&self) -> RecordType {
        self.kind
    }

    /// Address field value; for data records, the address of the first data byte
    #[must_use]
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Data field
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of data bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the data field is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored checksum byte
    #[must_use]
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Byte count field: address width + data length + checksum byte
    #[must_use]
    pub fn count(&self) -> u8 {
        // Bounded by max_payload at construction
        (self.kind.address_width() + self.data.len() + 1) as u8
    }

    /// Address field as big-endian bytes of the subtype's width
    #[must_use]
    pub fn address_bytes(&self) -> Vec<u8> {
        let width = self.kind.address_width();
        self.address.to_be_bytes()[4 - width..].to_vec()
    }

    /// Address of the last data byte, `None` for an empty data field
    #[must_use]
    pub fn end_address(&self) -> Option<u32> {
        let len = u32::try_from(self.data.len()).ok()?;
        len.checked_sub(1).map(|last| self.address + last)
    }

    /// Inclusive address range covered by the data field
    #[must_use]
    pub fn range(&self) -> Option<RangeInclusive<u32>> {
        self.end_address().map(|end| self.address..=end)
    }

    /// Whether `address` falls inside the data field
    #[must_use]
    pub fn contains(&self, address: u32) -> bool {
        self.range().is_some_and(|range| range.contains(&address))
    }

    /// Checksum over the count, address and data bytes
    #[must_use]
    pub fn compute_checksum(&self) -> u8 {
        let sum = self
            .address_bytes()
            .iter()
            .chain(&self.data)
            .fold(self.count(), |acc, byte| acc.wrapping_add(*byte));
        !sum
    }

    /// Whether the stored checksum matches the record contents
    #[must_use]
    pub fn has_valid_checksum(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Recompute and store the checksum, returning whether it changed
    pub fn update_checksum(&mut self) -> bool {
        let computed = self.compute_checksum();
        let changed = computed != self.checksum;
        self.checksum = computed;
        changed
    }

    /// Overwrite one data byte and recompute the checksum
    pub fn set_byte(&mut self, index: usize, value: u8) -> Result<()> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(RecordError::IndexOutOfBounds { index, len })?;
        *slot = value;
        self.update_checksum();
        Ok(())
    }

    /// Overwrite one data byte from a hex string of one or two digits
    pub fn set_byte_hex(&mut self, index: usize, value: &str) -> Result<()> {
        let byte = parse_hex_byte(value)?;
        self.set_byte(index, byte)
    }
}

impl FromStr for Record {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Parse a single hex byte of one or two digits, zero-filled
pub fn parse_hex_byte(value: &str) -> Result<u8> {
    if value.is_empty() || value.len() > 2 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RecordError::InvalidValue(value.to_string()));
    }
    u8::from_str_radix(value, 16).map_err(|_| RecordError::InvalidValue(value.to_string()))
}

fn decode_field(field: &str, name: &'static str) -> std::result::Result<Vec<u8>, Corruption> {
    hex::decode(field).map_err(|_| Corruption::NonHex(name))
}

fn check_address_space(address: u32, len: usize) -> Result<()> {
    let Some(last) = len.checked_sub(1) else {
        return Ok(());
    };
    u32::try_from(last)
        .ok()
        .and_then(|last| address.checked_add(last))
        .map(|_| ())
        .ok_or(RecordError::AddressOverflow { address, len })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "S1130000285F245F2400082A0000000000002A";

    /// Sum of every byte after the type prefix, checksum included
    fn closure(record: &Record) -> u8 {
        record
            .address_bytes()
            .iter()
            .chain(record.data())
            .fold(record.count(), |acc, b| acc.wrapping_add(*b))
            .wrapping_add(record.checksum())
    }

    #[test]
    fn test_parse_sample_record() {
        let record = Record::parse(SAMPLE).expect("Test operation should succeed");
        assert_eq!(record.kind(), RecordType::S1);
        assert_eq!(record.count(), 19);
        assert_eq!(record.address(), 0x0000);
        assert_eq!(
            record.data(),
            &[
                0x28, 0x5F, 0x24, 0x5F, 0x24, 0x00, 0x08, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00
            ]
        );
        assert_eq!(record.checksum(), 0x2A);
        assert_eq!(record.compute_checksum(), 0x2A);
        assert!(record.has_valid_checksum());
        assert_eq!(record.end_address(), Some(0x000F));
    }

    #[test]
    fn test_parse_strips_whitespace_and_accepts_lowercase() {
        let record = Record::parse("  s1130000285f245f2400082a0000000000002a\r\n");
        // Type prefix is case sensitive
        assert!(record.is_err());

        let record = Record::parse("  S1130000285f245f2400082a0000000000002a\r\n")
            .expect("Test operation should succeed");
        assert_eq!(record.to_line(), SAMPLE);
    }

    #[test]
    fn test_parse_header_and_termination() {
        let header = Record::parse("S00F000068656C6C6F202020202000003C").unwrap();
        assert_eq!(header.kind().class(), RecordClass::Header);
        assert_eq!(header.data(), b"hello     \0\0");
        assert!(header.has_valid_checksum());

        let footer = Record::parse("S9030000FC").unwrap();
        assert_eq!(footer.kind(), RecordType::S9);
        assert!(footer.is_empty());
        assert_eq!(footer.end_address(), None);
        assert!(footer.has_valid_checksum());
    }

    #[test]
    fn test_parse_wide_addresses() {
        let record = Record::parse("S2080100000102030AE6").unwrap();
        assert_eq!(record.address(), 0x01_0000);
        assert_eq!(record.address_bytes(), vec![0x01, 0x00, 0x00]);

        let record = Record::parse("S30900001000DEADBEEFAE").unwrap();
        assert_eq!(record.kind(), RecordType::S3);
        assert_eq!(record.address(), 0x1000);
        assert_eq!(record.range(), Some(0x1000..=0x1003));
    }

    #[test]
    fn test_parse_corruptions() {
        assert_eq!(
            Record::parse("S1130"),
            Err(RecordError::Corrupted(Corruption::OddLength(5)))
        );
        assert_eq!(
            Record::parse("S4030000FC"),
            Err(RecordError::Corrupted(Corruption::UnknownType(
                "S4".to_string()
            )))
        );
        assert_eq!(
            Record::parse("S103"),
            Err(RecordError::Corrupted(Corruption::Truncated(4)))
        );
        assert_eq!(
            Record::parse("S1140000285F245F2400082A0000000000002A"),
            Err(RecordError::Corrupted(Corruption::CountMismatch {
                declared: 0x14,
                actual: 19
            }))
        );
        assert_eq!(
            Record::parse("S1130000285F245F2400082A00000000000G2A"),
            Err(RecordError::Corrupted(Corruption::NonHex("data")))
        );
        assert_eq!(
            Record::parse("S1130Z00285F245F2400082A0000000000002A"),
            Err(RecordError::Corrupted(Corruption::NonHex("address")))
        );
        assert_eq!(
            Record::parse("S1130000285F245F2400082A000000000000ZZ"),
            Err(RecordError::Corrupted(Corruption::NonHex("checksum")))
        );
    }

    #[test]
    fn test_parse_keeps_stale_checksum() {
        let record = Record::parse("S1130000285F245F2400082A00000000000000").unwrap();
        assert_eq!(record.checksum(), 0x00);
        assert!(!record.has_valid_checksum());
        assert_eq!(record.to_line(), "S1130000285F245F2400082A00000000000000");
    }

    #[test]
    fn test_parse_rejects_address_overflow() {
        let line = Record::new(RecordType::S3, 0xFFFF_FFFE, vec![0x01, 0x02])
            .unwrap()
            .to_line();
        assert!(Record::parse(&line).is_ok());

        assert!(matches!(
            Record::new(RecordType::S3, 0xFFFF_FFFE, vec![0x01, 0x02, 0x03]),
            Err(RecordError::AddressOverflow { len: 3, .. })
        ));
    }

    #[test]
    fn test_new_validates_fields() {
        assert!(matches!(
            Record::new(RecordType::S1, 0x1_0000, vec![0x00]),
            Err(RecordError::AddressTooWide { width: 2, .. })
        ));
        assert!(matches!(
            Record::new(RecordType::S1, 0, vec![0; 253]),
            Err(RecordError::PayloadTooLong { max: 252, .. })
        ));

        let record = Record::new(RecordType::S1, 0x0100, vec![0xAA, 0xBB]).unwrap();
        assert_eq!(record.count(), 5);
        assert!(record.has_valid_checksum());
        assert_eq!(record.to_line(), "S1050100AABB94");
    }

    #[test]
    fn test_set_byte_recomputes_checksum() {
        let mut record = Record::parse(SAMPLE).unwrap();
        record.set_byte(0, 0x29).unwrap();
        assert_eq!(record.data()[0], 0x29);
        assert_eq!(record.checksum(), 0x29);
        assert_eq!(closure(&record), 0xFF);
    }

    #[test]
    fn test_set_byte_hex() {
        let mut record = Record::parse(SAMPLE).unwrap();
        record.set_byte_hex(15, "a").unwrap();
        assert_eq!(record.data()[15], 0x0A);
        assert_eq!(closure(&record), 0xFF);
        assert!(record.to_line().ends_with("0A20"));

        for bad in ["", "123", "G0", "-1", "+1"] {
            assert_eq!(
                record.set_byte_hex(0, bad),
                Err(RecordError::InvalidValue(bad.to_string())),
                "value {bad:?}"
            );
        }
        assert_eq!(
            record.set_byte_hex(16, "00"),
            Err(RecordError::IndexOutOfBounds { index: 16, len: 16 })
        );
    }

    #[test]
    fn test_update_checksum_reports_change() {
        let mut record = Record::parse("S9030000FF").unwrap();
        assert!(record.update_checksum());
        assert_eq!(record.checksum(), 0xFC);
        assert!(!record.update_checksum());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn record_type() -> impl Strategy<Value = RecordType> {
            prop::sample::select(RecordType::ALL.to_vec())
        }

        /// Structurally valid records; checksums are arbitrary
        fn record() -> impl Strategy<Value = Record> {
            record_type()
                .prop_flat_map(|kind| {
                    (
                        Just(kind),
                        0..=kind.max_address() - 0xFF,
                        prop::collection::vec(any::<u8>(), 0..=kind.max_payload()),
                        any::<u8>(),
                    )
                })
                .prop_map(|(kind, address, data, checksum)| Record {
                    kind,
                    address,
                    data,
                    checksum,
                })
        }

        proptest! {
            #[test]
            fn parse_inverts_serialize(record in record()) {
                let line = record.to_line();
                prop_assert_eq!(Record::parse(&line).unwrap(), record);
            }

            #[test]
            fn writes_keep_checksum_closed(
                record in record().prop_filter("needs data", |r| !r.is_empty()),
                index in any::<prop::sample::Index>(),
                value in any::<u8>(),
            ) {
                let mut record = record;
                let index = index.index(record.len());
                record.set_byte(index, value).unwrap();
                prop_assert_eq!(closure(&record), 0xFF);
                prop_assert!(record.has_valid_checksum());
            }
        }
    }
}
