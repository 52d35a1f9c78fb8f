//! Sector detection and the address → record index

use serde::{Deserialize, Serialize};

use super::error::{ImageError, Result};
use crate::record::Record;

/// Maximal run of contiguous data records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    /// Address of the first byte
    pub start: u32,
    /// Address of the last byte, inclusive
    pub end: u32,
}

impl Sector {
    /// Number of bytes in the sector
    #[must_use]
    pub fn len(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    /// Sectors always hold at least one byte
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `address` lies inside the sector
    #[must_use]
    pub fn contains(&self, address: u32) -> bool {
        (self.start..=self.end).contains(&address)
    }
}

/// Location of one byte: owning record start and offset into its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Start address of the owning data record
    pub record: u32,
    /// Zero-based offset within the record's data
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    start: u32,
    end: u32,
    position: usize,
}

/// Sorted index of non-empty data records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AddressIndex {
    entries: Vec<Entry>,
}

/// Resolved byte location, `position` indexing the sorted data records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub position: usize,
    pub start: u32,
    pub end: u32,
    pub offset: usize,
}

impl AddressIndex {
    /// Index `records`, which must already be sorted by address, and detect sectors
    pub fn build(records: &[Record]) -> Result<(Self, Vec<Sector>)> {
        let mut entries: Vec<Entry> = Vec::with_capacity(records.len());
        let mut sectors = Vec::new();
        let mut current: Option<Sector> = None;

        for (position, record) in records.iter().enumerate() {
            let Some(end) = record.end_address() else {
                continue;
            };
            let start = record.address();

            if let Some(previous) = entries.last() {
                if start <= previous.end {
                    return Err(ImageError::OverlappingRecords {
                        first: previous.start,
                        second: start,
                    });
                }
            }

            current = match current {
                Some(sector) if sector.end.checked_add(1) == Some(start) => {
                    Some(Sector { end, ..sector })
                }
                Some(sector) => {
                    sectors.push(sector);
                    Some(Sector { start, end })
                }
                None => Some(Sector { start, end }),
            };

            entries.push(Entry {
                start,
                end,
                position,
            });
        }
        sectors.extend(current);

        Ok((Self { entries }, sectors))
    }

    /// Rightmost record starting at or before `address`, if it covers `address`
    pub fn resolve(&self, address: u32) -> Option<Slot> {
        let candidate = self.entries.partition_point(|entry| entry.start <= address);
        let entry = self.entries.get(candidate.checked_sub(1)?)?;
        (address <= entry.end).then(|| Slot {
            position: entry.position,
            start: entry.start,
            end: entry.end,
            offset: (address - entry.start) as usize,
        })
    }

    /// First address of `[start, start + len)` not backed by a record
    pub fn first_missing(&self, start: u32, len: u64) -> Option<u64> {
        let stop = u64::from(start).saturating_add(len);
        let mut cursor = u64::from(start);
        while cursor < stop {
            let Ok(address) = u32::try_from(cursor) else {
                return Some(cursor);
            };
            match self.resolve(address) {
                Some(slot) => cursor = u64::from(slot.end) + 1,
                None => return Some(cursor),
            }
        }
        None
    }

    /// Lowest and highest indexed address
    pub fn bounds(&self) -> Option<(u32, u32)> {
        Some((self.entries.first()?.start, self.entries.last()?.end))
    }

    /// Positions of indexed records, in address order
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|entry| entry.position)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::RecordType;
    use pretty_assertions::assert_eq;

    fn record(address: u32, len: usize) -> Record {
        Record::new(RecordType::S1, address, vec![0xAA; len]).unwrap()
    }

    #[test]
    fn test_single_byte_records_split_into_sectors() {
        let records = vec![
            record(0x100, 1),
            record(0x101, 1),
            record(0x102, 1),
            record(0x200, 1),
            record(0x201, 1),
        ];
        let (_, sectors) = AddressIndex::build(&records).unwrap();
        assert_eq!(
            sectors,
            vec![
                Sector {
                    start: 0x100,
                    end: 0x102
                },
                Sector {
                    start: 0x200,
                    end: 0x201
                },
            ]
        );
    }

    #[test]
    fn test_empty_records_are_skipped() {
        let records = vec![record(0x10, 4), record(0x14, 0), record(0x14, 4)];
        let (index, sectors) = AddressIndex::build(&records).unwrap();
        assert_eq!(sectors, vec![Sector { start: 0x10, end: 0x17 }]);
        assert_eq!(index.positions().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(index.resolve(0x14).unwrap().position, 2);
    }

    #[test]
    fn test_overlap_is_rejected() {
        let records = vec![record(0x10, 4), record(0x13, 4)];
        assert!(matches!(
            AddressIndex::build(&records),
            Err(ImageError::OverlappingRecords {
                first: 0x10,
                second: 0x13
            })
        ));
    }

    #[test]
    fn test_resolve_covers_records_and_skips_gaps() {
        let records = vec![record(0x100, 4), record(0x104, 4), record(0x200, 2)];
        let (index, _) = AddressIndex::build(&records).unwrap();

        let slot = index.resolve(0x106).unwrap();
        assert_eq!((slot.position, slot.start, slot.offset), (1, 0x104, 2));
        assert_eq!(index.resolve(0x100).unwrap().offset, 0);
        assert_eq!(index.resolve(0x0FF), None);
        assert_eq!(index.resolve(0x108), None);
        assert_eq!(index.resolve(0x201).unwrap().offset, 1);
        assert_eq!(index.resolve(0x202), None);
    }

    #[test]
    fn test_first_missing() {
        let records = vec![record(0x100, 4), record(0x104, 4), record(0x200, 2)];
        let (index, _) = AddressIndex::build(&records).unwrap();

        assert_eq!(index.first_missing(0x100, 8), None);
        assert_eq!(index.first_missing(0x102, 7), Some(0x108));
        assert_eq!(index.first_missing(0x0FE, 4), Some(0x0FE));
        assert_eq!(index.first_missing(0x200, 0), None);
        assert_eq!(index.bounds(), Some((0x100, 0x201)));
    }

    #[test]
    fn test_first_missing_past_address_space() {
        let records = vec![Record::new(RecordType::S3, 0xFFFF_FFFC, vec![0; 4]).unwrap()];
        let (index, _) = AddressIndex::build(&records).unwrap();
        assert_eq!(index.first_missing(0xFFFF_FFFC, 4), None);
        assert_eq!(index.first_missing(0xFFFF_FFFC, 5), Some(0x1_0000_0000));
    }
}
