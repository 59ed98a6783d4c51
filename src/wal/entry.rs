//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::record::Record;

/// Frame header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL: exactly one committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Everything the transaction changed
    pub commit: CommitBatch,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// The mutations of one commit plus the identifier counter after it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitBatch {
    pub mutations: Vec<Mutation>,

    /// Next identifier to hand out once this batch is applied
    pub next_id: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert or replace a record
    Put { id: u64, record: Record },

    /// Remove a record
    Delete { id: u64 },
}

impl Mutation {
    pub fn id(&self) -> u64 {
        match self {
            Mutation::Put { id, .. } | Mutation::Delete { id } => *id,
        }
    }
}

impl CommitBatch {
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, commit: CommitBatch) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            commit,
            timestamp,
        }
    }

    /// Encode as a framed record: `[lsn][crc32(data)][len][data]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        let len = u32::try_from(data.len()).map_err(|_| {
            CatalogError::Serialization(format!("WAL entry too large: {} bytes", data.len()))
        })?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc32fast::hash(&data).to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Decode one complete frame, validating length, CRC and LSN
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::parse(bytes)?;

        let data = bytes
            .get(HEADER_SIZE..HEADER_SIZE + header.len)
            .ok_or_else(|| {
                CatalogError::WalCorruption(format!(
                    "frame truncated: expected {} data bytes, got {}",
                    header.len,
                    bytes.len().saturating_sub(HEADER_SIZE)
                ))
            })?;

        Self::decode_data(&header, data)
    }

    pub(crate) fn decode_data(header: &FrameHeader, data: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(data);
        if actual != header.crc {
            return Err(CatalogError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:#010x}, got {:#010x}",
                header.lsn, header.crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)?;
        if entry.lsn != header.lsn {
            return Err(CatalogError::WalCorruption(format!(
                "LSN mismatch: header says {}, entry says {}",
                header.lsn, entry.lsn
            )));
        }

        Ok(entry)
    }
}

/// Parsed fixed-size frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: usize,
}

impl FrameHeader {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CatalogError::WalCorruption(format!(
                "frame header truncated: {} of {} bytes",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Ok(Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len) as usize,
        })
    }
}
