//! Snapshot Writer
//!
//! Writes records in ascending id order to a new snapshot file.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{CatalogError, Result};
use crate::record::Record;

use super::{encode_header, SnapshotInfo, COUNT_OFFSET};

/// Builder for a new snapshot
///
/// Nothing is visible at `path` until [`finish`](Self::finish) renames the
/// temporary file into place. Dropping the writer early discards it.
pub struct SnapshotWriter {
    /// Final destination
    path: PathBuf,
    /// Buffered writer over a temp file in the same directory
    writer: BufWriter<NamedTempFile>,
    /// Number of records written
    entry_count: u64,
    next_id: u64,
    /// Last id written, enforces ascending order
    last_id: Option<u64>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
}

impl SnapshotWriter {
    /// Start a snapshot that will be published at `path`
    pub fn new(path: &Path, next_id: u64) -> Result<Self> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(temp);

        // Header (entry_count placeholder, patched in finish)
        writer.write_all(&encode_header(0, next_id))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            next_id,
            last_id: None,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a record (must be called in ascending id order)
    pub fn add(&mut self, id: u64, record: &Record) -> Result<()> {
        if let Some(last) = self.last_id {
            if id <= last {
                return Err(CatalogError::Storage(format!(
                    "snapshot ids must ascend: {} after {}",
                    id, last
                )));
            }
        }

        let data = bincode::serialize(record)?;
        let len = u32::try_from(data.len()).map_err(|_| {
            CatalogError::Serialization(format!("record {} too large: {} bytes", id, data.len()))
        })?;

        let id_bytes = id.to_le_bytes();
        let len_bytes = len.to_le_bytes();

        self.writer.write_all(&id_bytes)?;
        self.writer.write_all(&len_bytes)?;
        self.writer.write_all(&data)?;

        self.data_hasher.update(&id_bytes);
        self.data_hasher.update(&len_bytes);
        self.data_hasher.update(&data);

        self.last_id = Some(id);
        self.entry_count += 1;
        Ok(())
    }

    /// Write the footer, fsync, and atomically replace the old snapshot
    pub fn finish(mut self) -> Result<SnapshotInfo> {
        let data_crc = self.data_hasher.finalize();
        let header_crc = crc32fast::hash(&encode_header(self.entry_count, self.next_id));
        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&header_crc.to_le_bytes())?;
        self.writer.flush()?;

        let mut temp = self.writer.into_inner().map_err(|e| {
            CatalogError::Storage(format!("Failed to flush snapshot: {}", e))
        })?;
        temp.seek(SeekFrom::Start(COUNT_OFFSET))?;
        temp.write_all(&self.entry_count.to_le_bytes())?;
        temp.as_file().sync_all()?;

        let file = temp
            .persist(&self.path)
            .map_err(|e| CatalogError::Storage(format!("Failed to publish snapshot: {}", e)))?;
        let file_size = file.metadata()?.len();
        sync_parent_dir(&self.path);

        Ok(SnapshotInfo {
            path: self.path,
            entry_count: self.entry_count,
            next_id: self.next_id,
            file_size,
        })
    }

    /// Write a whole map in one go
    pub fn write_all<'a, I>(path: &Path, next_id: u64, records: I) -> Result<SnapshotInfo>
    where
        I: IntoIterator<Item = (u64, &'a Record)>,
    {
        let mut writer = Self::new(path, next_id)?;
        for (id, record) in records {
            writer.add(id, record)?;
        }
        writer.finish()
    }
}

/// Make the rename itself durable where the platform allows it
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}
