//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.
//!
//! Recovery keeps the longest valid prefix of the log. The first torn or
//! corrupted frame ends the prefix; everything from there on is discarded.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::warn;

use crate::error::Result;

use super::reader::{Frame, WalReader};
use super::WalEntry;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,

    /// Length of the valid prefix in bytes
    pub valid_len: u64,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Stop at the first torn or corrupted frame
    /// 3. Truncate the file to the valid prefix
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, result) = Self::scan(path)?;

        if result.was_truncated {
            warn!(
                path = %path.display(),
                valid_len = result.valid_len,
                corrupted = result.entries_corrupted,
                "truncating damaged WAL tail"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_len)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path).map(|(_, result)| result)
    }

    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.read_frame()? {
                Frame::Entry(entry) => {
                    if entry.lsn <= result.last_lsn {
                        warn!(
                            lsn = entry.lsn,
                            last_lsn = result.last_lsn,
                            "out-of-order LSN in WAL"
                        );
                        result.entries_corrupted += 1;
                        result.was_truncated = true;
                        break;
                    }
                    result.last_lsn = entry.lsn;
                    result.entries_recovered += 1;
                    result.valid_len = reader.position();
                    entries.push(entry);
                }
                Frame::End => break,
                Frame::Torn => {
                    result.was_truncated = true;
                    break;
                }
                Frame::Corrupt(reason) => {
                    warn!(reason = %reason, "corrupted WAL frame");
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
            }
        }

        Ok((entries, result))
    }
}
