//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, error, warn};

use crate::error::{CatalogError, Result};

use super::{CommitBatch, WalEntry, WalRecovery};

/// Writes entries to the WAL file
///
/// Every append is fsynced before it returns. A failed append is rolled back
/// by truncating the file to its previous length, so the file only ever holds
/// whole frames. Each frame is written at `len`, whatever the file cursor
/// says.
///
/// The writer holds an exclusive advisory lock on the file for its lifetime.
/// The OS drops the lock with the handle, including when the process dies.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// LSN assigned to the next append
    next_lsn: u64,
    /// Current file length (end of the last whole frame)
    len: u64,
    /// Set when a rollback failed and bytes past `len` may remain
    poisoned: bool,
    #[cfg(test)]
    faults: Faults,
}

/// One-shot failures armed by tests
#[cfg(test)]
#[derive(Debug, Default)]
struct Faults {
    append: bool,
    rollback: bool,
    truncate_seek: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing file must be clean; run [`WalRecovery::recover`] first if
    /// it may hold a damaged tail.
    pub fn open(path: &Path) -> Result<Self> {
        let file = Self::lock(path)?;
        Self::with_locked(path, file)
    }

    /// Open (creating if needed) and exclusively lock the WAL file
    ///
    /// Fails with `Storage` if another handle already holds the lock.
    pub fn lock(path: &Path) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive().map_err(|e| {
            CatalogError::Storage(format!(
                "{} is in use by another process: {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "WAL locked");
        Ok(file)
    }

    /// Build a writer over a handle returned by [`lock`](Self::lock)
    pub fn with_locked(path: &Path, mut file: File) -> Result<Self> {
        let scan = WalRecovery::verify(path)?;
        if scan.was_truncated {
            return Err(CatalogError::WalCorruption(format!(
                "{} has a damaged tail after byte {}",
                path.display(),
                scan.valid_len
            )));
        }

        let len = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_lsn: scan.last_lsn + 1,
            len,
            poisoned: false,
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Append a commit to the WAL and fsync it
    ///
    /// Returns the LSN assigned to the entry.
    pub fn append(&mut self, commit: CommitBatch) -> Result<u64> {
        if self.poisoned {
            self.repair()?;
        }

        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, commit).serialize()?;

        if let Err(e) = self.write_frame(&bytes) {
            error!(lsn, error = %e, "WAL append failed, rolling back");
            if let Err(rollback) = self.rollback() {
                self.poisoned = true;
                error!(lsn, error = %rollback, "WAL rollback failed");
                return Err(CatalogError::Storage(format!(
                    "commit at LSN {} failed: {}; rollback failed: {}",
                    lsn, e, rollback
                )));
            }
            return Err(CatalogError::Storage(format!(
                "commit at LSN {} failed: {}",
                lsn, e
            )));
        }

        self.len += bytes.len() as u64;
        self.next_lsn += 1;
        debug!(lsn, bytes = bytes.len(), "WAL append");
        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Discard every entry (after a checkpoint made them redundant)
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        // The file is empty from here on, even if the steps below fail
        self.len = 0;
        self.next_lsn = 1;
        self.poisoned = false;

        self.seek_truncated()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Get the current LSN (the one the next append will receive)
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if a failed rollback left bytes past the last whole frame
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.len))?;
        if let Some(e) = self.injected_failure(bytes) {
            return Err(e);
        }
        self.file.write_all(bytes)?;
        self.file.sync_data()
    }

    fn rollback(&mut self) -> io::Result<()> {
        self.injected_rollback_failure()?;
        self.file.set_len(self.len)?;
        self.file.seek(SeekFrom::Start(self.len))?;
        self.file.sync_all()
    }

    /// Retry the rollback a previous append could not finish
    fn repair(&mut self) -> Result<()> {
        if let Err(e) = self.rollback() {
            return Err(CatalogError::Storage(format!(
                "{} has an unremovable partial frame; reopen the catalog: {}",
                self.path.display(),
                e
            )));
        }
        warn!(len = self.len, "WAL partial frame removed");
        self.poisoned = false;
        Ok(())
    }

    fn seek_truncated(&mut self) -> io::Result<()> {
        self.injected_truncate_seek_failure()?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Leave a torn frame behind, as a crash mid-write would
    #[cfg(test)]
    fn injected_failure(&mut self, bytes: &[u8]) -> Option<io::Error> {
        if !std::mem::take(&mut self.faults.append) {
            return None;
        }
        if let Err(e) = self.file.write_all(&bytes[..bytes.len() / 2]) {
            return Some(e);
        }
        Some(injected("append"))
    }

    #[cfg(not(test))]
    fn injected_failure(&mut self, _bytes: &[u8]) -> Option<io::Error> {
        None
    }

    #[cfg(test)]
    fn injected_rollback_failure(&mut self) -> io::Result<()> {
        if std::mem::take(&mut self.faults.rollback) {
            return Err(injected("rollback"));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn injected_rollback_failure(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(test)]
    fn injected_truncate_seek_failure(&mut self) -> io::Result<()> {
        if std::mem::take(&mut self.faults.truncate_seek) {
            return Err(injected("truncate seek"));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn injected_truncate_seek_failure(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Make the next append fail after writing half its frame
    #[cfg(test)]
    pub(crate) fn fail_next_append(&mut self) {
        self.faults.append = true;
    }

    /// Make the next rollback fail before it touches the file
    #[cfg(test)]
    pub(crate) fn fail_next_rollback(&mut self) {
        self.faults.rollback = true;
    }

    /// Make the next truncate fail right after shrinking the file
    #[cfg(test)]
    pub(crate) fn fail_next_truncate_seek(&mut self) {
        self.faults.truncate_seek = true;
    }
}

#[cfg(test)]
fn injected(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("injected {} failure", what))
}
