//! Motorola S-record codec and addressable image model
//!
#![allow(clippy::cast_possible_truncation)] // Addresses are u32 by construction
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Record type names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::missing_errors_doc)] // Every fallible call documents its error enum
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
//! This crate reads, edits and writes Motorola S-record files, the line-based
//! ASCII hex format used to carry firmware images for microcontrollers.
//!
//! # Layers
//!
//! - **[`record`]**: one line. Parsing, serialization, checksum computation and
//!   single-byte data edits that keep the checksum valid.
//! - **[`image`]**: a whole file. Records are classified, sorted and indexed so
//!   any global address resolves to the record that owns it; patches, tags,
//!   scopes, word dumps and export all work on that view.
//!
//! # Example
//!
//! ```
//! use srec_formats::{Endianness, SRecordFile};
//!
//! let mut file = SRecordFile::parse_str("S1070100DEADBEEFBF\nS9030000FC\n")
//!     .expect("Test operation should succeed");
//!
//! file.add_tag_with_length("magic", 0x100, 4)
//!     .expect("Test operation should succeed");
//! file.set_tag("magic", "0xC0FFEE").expect("Test operation should succeed");
//!
//! assert_eq!(
//!     file.get_word(0x100, Endianness::Big).expect("loaded"),
//!     [0x00, 0xC0, 0xFF, 0xEE]
//! );
//! assert_eq!(
//!     file.to_lines().expect("loaded"),
//!     vec!["S107010000C0FFEE4A", "S9030000FC"]
//! );
//! ```

#![warn(missing_docs)]

/// Whole-file model: ingestion, address index, patches, tags and scopes
pub mod image;
/// Single-record codec
pub mod record;

pub use image::{
    ChecksumPolicy, Coordinate, Endianness, FileSummary, FoundString, ImageError, LoadOptions,
    SRecordFile, Scope, Sector, Snapshot, StaleChecksum, Tag,
};
pub use record::{Record, RecordClass, RecordError, RecordType};
