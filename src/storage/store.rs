//! Ordered Store
//!
//! Durable, ordered mapping from record id to [`Record`].
//!
//! ## Responsibilities
//! - Load the last snapshot on startup
//! - Serve point reads and ordered scans from committed state
//! - Stage puts and deletes until a commit applies them
//! - Own the monotonic identifier counter
//! - Write new snapshots at checkpoints

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{CatalogError, Result};
use crate::record::Record;
use crate::staging::{StagedEntry, StagingTable};
use crate::wal::{CommitBatch, Mutation};

use super::{SnapshotInfo, SnapshotReader, SnapshotWriter};

/// Committed records plus the staging area of the open transaction
///
/// Reads (`get`, `iter`, `count`) only ever see committed state. Staged
/// mutations become visible when [`TransactionManager::commit`] applies them.
///
/// [`TransactionManager::commit`]: crate::transaction::TransactionManager::commit
pub struct OrderedStore {
    /// Directory holding the snapshot and WAL
    data_dir: PathBuf,

    /// Committed records, ascending by id
    committed: BTreeMap<u64, Record>,

    /// Mutations of the transaction in progress
    staging: StagingTable,

    /// Next identifier to hand out; never decreases
    next_id: u64,

    /// True if no prior state existed when the store was opened
    first_run: bool,
}

impl OrderedStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    pub const SNAPSHOT_FILENAME: &'static str = "catalog.snap";
    pub const WAL_FILENAME: &'static str = "catalog.wal";

    /// Open or create a store in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Load the snapshot if present
    /// 3. Mark first run if neither snapshot nor WAL exists
    ///
    /// WAL replay is the transaction manager's job.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        let snapshot_path = data_dir.join(Self::SNAPSHOT_FILENAME);
        let wal_path = data_dir.join(Self::WAL_FILENAME);
        let first_run = !snapshot_path.exists() && !wal_path.exists();

        let (committed, next_id) = if snapshot_path.exists() {
            let snapshot = SnapshotReader::load(&snapshot_path)?;
            (snapshot.records, snapshot.next_id)
        } else {
            (BTreeMap::new(), 1)
        };

        let mut store = Self {
            data_dir: data_dir.to_path_buf(),
            committed,
            staging: StagingTable::new(),
            next_id,
            first_run,
        };
        store.raise_next_id_past_live();

        if first_run {
            info!(data_dir = %data_dir.display(), "initialized new catalog");
        } else {
            info!(
                records = store.count(),
                next_id = store.next_id,
                "loaded catalog snapshot"
            );
        }

        Ok(store)
    }

    // =========================================================================
    // Reads (committed state)
    // =========================================================================

    /// Get a committed record by id
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.committed.get(&id)
    }

    /// Get a committed record or fail with `NotFound`
    pub fn get_or_not_found(&self, id: u64) -> Result<&Record> {
        self.get(id).ok_or(CatalogError::NotFound(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.committed.contains_key(&id)
    }

    /// Number of live records
    pub fn count(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Point-in-time copy of every record, ascending by id
    pub fn iter(&self) -> Vec<(u64, Record)> {
        self.committed
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect()
    }

    /// Borrowing scan, ascending by id
    pub fn entries(&self) -> impl Iterator<Item = (u64, &Record)> {
        self.committed.iter().map(|(id, record)| (*id, record))
    }

    // =========================================================================
    // Staged mutations
    // =========================================================================

    /// Stage an insert or replace
    pub fn put(&mut self, id: u64, record: Record) {
        self.staging.put(id, record);
    }

    /// Stage a removal; fails if the id is absent in the staged view
    pub fn delete(&mut self, id: u64) -> Result<()> {
        let live = match self.staging.get(id) {
            Some(StagedEntry::Value(_)) => true,
            Some(StagedEntry::Tombstone) => false,
            None => self.committed.contains_key(&id),
        };
        if !live {
            return Err(CatalogError::NotFound(id));
        }
        self.staging.delete(id);
        Ok(())
    }

    /// Reserve a fresh identifier for the open transaction
    pub fn allocate_id(&mut self) -> u64 {
        self.staging.allocate_id(self.next_id)
    }

    /// True if the open transaction has anything to commit
    pub fn has_staged(&self) -> bool {
        !self.staging.is_empty()
    }

    /// Number of staged mutations
    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }

    /// Drain staged state into a batch for the WAL
    pub(crate) fn take_staged(&mut self) -> CommitBatch {
        self.staging.drain(self.next_id)
    }

    /// Drop staged state without applying it
    pub fn discard_staged(&mut self) {
        self.staging.clear();
    }

    /// Apply a committed batch to the committed map
    ///
    /// Idempotent: replaying a batch on a snapshot that already contains it
    /// leaves the store unchanged.
    pub(crate) fn apply(&mut self, batch: &CommitBatch) {
        for mutation in &batch.mutations {
            match mutation {
                Mutation::Put { id, record } => {
                    self.committed.insert(*id, record.clone());
                }
                Mutation::Delete { id } => {
                    self.committed.remove(id);
                }
            }
        }
        self.next_id = self.next_id.max(batch.next_id);
        self.raise_next_id_past_live();
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Write the committed map as the new snapshot
    pub fn write_snapshot(&self) -> Result<SnapshotInfo> {
        SnapshotWriter::write_all(&self.snapshot_path(), self.next_id, self.entries())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Identifier the next allocation will start from
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(Self::SNAPSHOT_FILENAME)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(Self::WAL_FILENAME)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Keep the counter ahead of every live id
    fn raise_next_id_past_live(&mut self) {
        if let Some((&max_id, _)) = self.committed.last_key_value() {
            self.next_id = self.next_id.max(max_id + 1);
        }
        self.next_id = self.next_id.max(1);
    }
}
