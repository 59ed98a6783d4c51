//! Snapshot Reader
//!
//! Loads and validates a snapshot file in full.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CatalogError, Result};
use crate::record::Record;

use super::{Snapshot, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for snapshot files
pub struct SnapshotReader;

impl SnapshotReader {
    /// Load a snapshot, verifying magic, both CRCs, version and entry count
    pub fn load(path: &Path) -> Result<Snapshot> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Decode a snapshot held in memory
    pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
        if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(corrupt(format!("file too short: {} bytes", bytes.len())));
        }

        if &bytes[0..4] != MAGIC {
            return Err(corrupt(format!(
                "invalid magic: expected GVLT, got {:?}",
                &bytes[0..4]
            )));
        }

        let data_end = bytes.len() - FOOTER_SIZE;

        let expected_header_crc = read_u32(bytes, data_end + 4);
        let actual_header_crc = crc32fast::hash(&bytes[..HEADER_SIZE]);
        if expected_header_crc != actual_header_crc {
            return Err(corrupt(format!(
                "header CRC mismatch: expected {:#010x}, got {:#010x}",
                expected_header_crc, actual_header_crc
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(CatalogError::Storage(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let entry_count = read_u64(bytes, 6);
        let next_id = read_u64(bytes, 14);

        let data = &bytes[HEADER_SIZE..data_end];

        let expected_crc = read_u32(bytes, data_end);
        let actual_crc = crc32fast::hash(data);
        if expected_crc != actual_crc {
            return Err(corrupt(format!(
                "data CRC mismatch: expected {:#010x}, got {:#010x}",
                expected_crc, actual_crc
            )));
        }

        let mut records = BTreeMap::new();
        let mut pos = 0;
        while pos < data.len() {
            if pos + 12 > data.len() {
                return Err(corrupt(format!("entry header truncated at offset {}", pos)));
            }
            let id = read_u64(data, pos);
            let len = read_u32(data, pos + 8) as usize;
            pos += 12;

            let body = data
                .get(pos..pos + len)
                .ok_or_else(|| corrupt(format!("record {} truncated", id)))?;
            let record: Record = bincode::deserialize(body)?;
            pos += len;

            if records.insert(id, record).is_some() {
                return Err(corrupt(format!("duplicate record id {}", id)));
            }
        }

        if records.len() as u64 != entry_count {
            return Err(corrupt(format!(
                "header says {} records, found {}",
                entry_count,
                records.len()
            )));
        }

        Ok(Snapshot { next_id, records })
    }
}

fn corrupt(reason: String) -> CatalogError {
    CatalogError::SnapshotCorruption(reason)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}
