//! Snapshot Module
//!
//! Point-in-time image of the committed catalog.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Header (22 bytes)                                                │
//! │   Magic: "GVLT" (4) | Version: u16 (2) | Count: u64 (8)          │
//! │   NextId: u64 (8)                                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                            │
//! │   [Id: u64][Len: u32][bincode(Record)]                           │
//! │   ... repeated for each record, ascending id ...                 │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                                 │
//! │   DataCRC: u32 (4) | HeaderCRC: u32 (4)                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are written to a temporary file and renamed into place, so a
//! reader only ever sees the previous snapshot or the complete new one.

mod reader;
mod writer;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::record::Record;

pub use reader::SnapshotReader;
pub use writer::SnapshotWriter;

// =============================================================================
// Shared Constants (used by writer and reader)
// =============================================================================

/// Magic bytes identifying a GameVault snapshot file
pub(crate) const MAGIC: &[u8; 4] = b"GVLT";

/// Current snapshot format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) + NextId (8) = 22 bytes
pub(crate) const HEADER_SIZE: usize = 22;

/// Footer size: DataCRC (4) + HeaderCRC (4) = 8 bytes
pub(crate) const FOOTER_SIZE: usize = 8;

/// Byte offset of the entry count within the header
pub(crate) const COUNT_OFFSET: u64 = 6;

/// Header bytes for a snapshot with the given totals
pub(crate) fn encode_header(entry_count: u64, next_id: u64) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(MAGIC);
    header[4..6].copy_from_slice(&VERSION.to_le_bytes());
    header[6..14].copy_from_slice(&entry_count.to_le_bytes());
    header[14..22].copy_from_slice(&next_id.to_le_bytes());
    header
}

// =============================================================================
// Snapshot Contents
// =============================================================================

/// Metadata returned after writing a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// Path the snapshot was published to
    pub path: PathBuf,
    /// Number of records
    pub entry_count: u64,
    /// Identifier counter at snapshot time
    pub next_id: u64,
    /// File size in bytes
    pub file_size: u64,
}

/// Fully loaded snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub next_id: u64,
    pub records: BTreeMap<u64, Record>,
}
