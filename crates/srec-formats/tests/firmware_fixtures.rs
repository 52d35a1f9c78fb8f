#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests against a small S19 firmware image
//!
//! The fixture has an S0 header, a 64-byte code sector at 0x1000, a 32-byte
//! calibration sector at 0x2000, an S5 count record and an S9 entry point.

use pretty_assertions::assert_eq;
use srec_formats::{
    ChecksumPolicy, Endianness, ImageError, LoadOptions, RecordType, SRecordFile, Sector,
};
use std::path::{Path, PathBuf};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_fixtures/firmware.s19")
}

fn read_fixture() -> String {
    let path = fixture_path();
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

fn load() -> SRecordFile {
    SRecordFile::from_path(fixture_path()).expect("Fixture should load")
}

#[test]
fn firmware_fixture_layout() {
    let file = load();

    assert_eq!(file.source(), Some(fixture_path().as_path()));
    assert_eq!(file.header_records().unwrap().len(), 1);
    assert_eq!(file.data_records().unwrap().len(), 7);
    assert_eq!(file.footer_records().unwrap().len(), 2);
    assert_eq!(
        file.sectors().unwrap(),
        &[
            Sector {
                start: 0x1000,
                end: 0x103F
            },
            Sector {
                start: 0x2000,
                end: 0x201F
            },
        ]
    );
    assert_eq!(file.bounds().unwrap(), Some((0x1000, 0x201F)));
    assert_eq!(file.address_chars().unwrap(), 4);

    let footer = file.footer_records().unwrap();
    assert_eq!(footer[0].kind(), RecordType::S5);
    assert_eq!(footer[0].address(), 7);
    assert_eq!(footer[1].kind(), RecordType::S9);
    assert_eq!(footer[1].address(), 0x1000);
    assert!(file.checksum_mismatches().unwrap().is_empty());
}

#[test]
fn firmware_fixture_header_text() {
    let file = load();
    let header = &file.header_records().unwrap()[0];
    assert_eq!(header.data(), b"firmware.s19");
}

#[test]
fn firmware_coordinates_are_total() {
    let file = load();

    for sector in file.sectors().unwrap() {
        for address in sector.start..=sector.end {
            let coordinate = file.get_coordinate(address).unwrap();
            let record = file.record_at(coordinate.record).unwrap();
            assert!(record.contains(address), "0x{address:X} not in its record");
            assert_eq!(
                u64::from(coordinate.record) + coordinate.offset as u64,
                u64::from(address)
            );
        }
    }

    for address in [0x0FFF, 0x1040, 0x1800, 0x1FFF, 0x2020] {
        assert!(
            matches!(file.get_coordinate(address), Err(ImageError::OutOfRange(a)) if a == address),
            "0x{address:X} should be out of range"
        );
    }
}

#[test]
fn firmware_export_is_idempotent() {
    let file = load();
    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("firmware.s19");

    file.export(&exported).unwrap();
    assert_eq!(std::fs::read_to_string(&exported).unwrap(), read_fixture());

    let reloaded = SRecordFile::from_path(&exported).unwrap();
    assert_eq!(reloaded.byte_map().unwrap(), file.byte_map().unwrap());
    assert_eq!(reloaded.sectors().unwrap(), file.sectors().unwrap());
}

#[test]
fn firmware_patch_across_records_round_trips() {
    let mut file = load();
    file.patch(0x2016, "AABBCCDD").unwrap();

    let lines = file.to_lines().unwrap();
    assert!(lines.contains(&"S10B20103F800000AABB0000A0".to_string()));
    assert!(lines.contains(&"S10B2018CCDD0000DEADBEEFDB".to_string()));

    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("patched.s19");
    file.export(&exported).unwrap();

    let reloaded = SRecordFile::from_path_with_options(
        &exported,
        LoadOptions::new().with_checksum_policy(ChecksumPolicy::Strict),
    )
    .unwrap();
    assert_eq!(
        reloaded.read(0x2014, 6).unwrap(),
        vec![0x00, 0x00, 0xAA, 0xBB, 0xCC, 0xDD]
    );
}

#[test]
fn firmware_strings() {
    let found = load().strings(4).unwrap();
    let texts: Vec<(u32, &str)> = found
        .iter()
        .map(|s| (s.address, s.text.as_str()))
        .collect();
    // 0x100F holds 'x', the last byte of the code words
    assert_eq!(texts, vec![(0x100F, "xBOOTLOADER"), (0x2000, "CALIBRATION")]);
}

#[test]
fn firmware_tags_and_scopes() {
    let mut file = load();
    file.add_tag_with_length("cal.version", 0x200C, 4).unwrap();
    file.add_tag("cal", 0x2000).unwrap();

    assert_eq!(file.convert_address("cal + 0x1C").unwrap(), 0x201C);
    assert_eq!(
        file.get_word(file.convert_address("cal+1C").unwrap(), Endianness::Big)
            .unwrap(),
        [0xDE, 0xAD, 0xBE, 0xEF]
    );

    file.set_tag("cal.version", "2").unwrap();
    assert_eq!(file.read(0x200C, 4).unwrap(), vec![0, 0, 0, 2]);

    file.add_scope("floats", 0x2010, 2, 1, Endianness::Little)
        .unwrap();
    let rendered = file.render_scope("floats").unwrap();
    assert_eq!(
        rendered.lines().last(),
        Some("2010: 00 00 80 3F   00 00 20 41   .......A")
    );

    assert!(
        file.add_scope("past", 0x2010, 4, 2, Endianness::Big)
            .unwrap_err()
            .is_out_of_range()
    );
}

#[test]
fn firmware_checksum_policies() {
    let stale = read_fixture().replace("S10B20103F80000041200000A4", "S10B20103F8000004120000000");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stale.s19");
    std::fs::write(&path, &stale).unwrap();

    let trusted = SRecordFile::from_path(&path).unwrap();
    let stale_records = trusted.checksum_mismatches().unwrap();
    assert_eq!(stale_records.len(), 1);
    assert_eq!(stale_records[0].address, 0x2010);
    assert_eq!(stale_records[0].computed, 0xA4);

    let strict = SRecordFile::from_path_with_options(
        &path,
        LoadOptions::new().with_checksum_policy(ChecksumPolicy::Strict),
    );
    assert!(matches!(
        strict,
        Err(ImageError::ChecksumMismatch {
            line: 7,
            address: 0x2010,
            stored: 0x00,
            computed: 0xA4
        })
    ));

    let repaired = SRecordFile::from_path_with_options(
        &path,
        LoadOptions::new().with_checksum_policy(ChecksumPolicy::Repair),
    )
    .unwrap();
    assert_eq!(
        repaired.to_lines().unwrap().join("\n") + "\n",
        read_fixture()
    );

    let mut fixed = trusted;
    assert_eq!(fixed.fix_checksums().unwrap(), 1);
    assert_eq!(fixed.to_lines().unwrap(), repaired.to_lines().unwrap());
}
