//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{CatalogError, Result};

use super::entry::FrameHeader;
use super::{WalEntry, HEADER_SIZE};

/// Outcome of reading one frame
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete, checksummed entry
    Entry(WalEntry),
    /// Clean end of file
    End,
    /// File ends inside a frame (partial write)
    Torn,
    /// Frame is complete but fails validation
    Corrupt(String),
}

/// Reads entries from the WAL file
pub struct WalReader {
    file: BufReader<File>,
    /// Total file length, bounds frame lengths
    file_len: u64,
    /// Offset just past the last valid frame
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        Ok(Self {
            file: BufReader::new(file),
            file_len,
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A torn or corrupted frame is
    /// reported as `WalCorruption`; recovery decides what to do with it.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.read_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Torn => Err(CatalogError::WalCorruption(format!(
                "partial frame at offset {}",
                self.position
            ))),
            Frame::Corrupt(reason) => Err(CatalogError::WalCorruption(reason)),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Byte offset just past the last valid frame
    pub fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn read_frame(&mut self) -> Result<Frame> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        let read = read_up_to(&mut self.file, &mut header_bytes)?;
        if read == 0 {
            return Ok(Frame::End);
        }
        if read < HEADER_SIZE {
            return Ok(Frame::Torn);
        }

        let header = FrameHeader::parse(&header_bytes)?;
        let remaining = self
            .file_len
            .saturating_sub(self.position + HEADER_SIZE as u64);
        if header.len as u64 > remaining {
            return Ok(Frame::Torn);
        }

        let mut data = vec![0u8; header.len];
        if read_up_to(&mut self.file, &mut data)? < header.len {
            return Ok(Frame::Torn);
        }

        match WalEntry::decode_data(&header, &data) {
            Ok(entry) => {
                self.position += (HEADER_SIZE + header.len) as u64;
                Ok(Frame::Entry(entry))
            }
            Err(CatalogError::WalCorruption(reason)) => Ok(Frame::Corrupt(reason)),
            Err(CatalogError::Serialization(reason)) => Ok(Frame::Corrupt(format!(
                "undecodable entry at LSN {}: {}",
                header.lsn, reason
            ))),
            Err(e) => Err(e),
        }
    }
}

/// Iterator over WAL entries
///
/// Yields each valid entry, then at most one error, then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the input allows, returning bytes read
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
