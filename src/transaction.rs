//! Transaction Module
//!
//! Atomic commit boundary around the store's staged mutations.
//!
//! A commit is a single WAL frame. It is durable once the frame is fsynced,
//! and only then applied to the committed map. A failed append is rolled back
//! in the WAL and the staged batch is dropped, so neither memory nor disk
//! moves past the last successful commit.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::OrderedStore;
use crate::wal::{Mutation, WalRecovery, WalWriter};

/// Owns the WAL and decides when to checkpoint
pub struct TransactionManager {
    /// Write-ahead log for durability
    wal: WalWriter,

    /// Checkpoint once this many commits have accumulated
    checkpoint_every: u64,

    /// Commits in the WAL since the last snapshot
    commits_since_checkpoint: u64,
}

impl TransactionManager {
    /// Open the WAL next to the store, replaying anything it holds
    ///
    /// On startup:
    /// 1. Lock the WAL (fails if another process has the catalog open)
    /// 2. Recover the valid prefix of the WAL (damaged tail is truncated)
    /// 3. Replay recovered commits into the store
    /// 4. Checkpoint so the WAL starts empty
    pub fn open(store: &mut OrderedStore, checkpoint_every: u64) -> Result<Self> {
        let wal_path = store.wal_path();
        let locked = WalWriter::lock(&wal_path)?;

        let (entries, result) = WalRecovery::recover(&wal_path)?;
        if result.entries_recovered > 0 || result.entries_corrupted > 0 {
            info!(
                recovered = result.entries_recovered,
                corrupted = result.entries_corrupted,
                last_lsn = result.last_lsn,
                truncated = result.was_truncated,
                "WAL recovery"
            );
        }

        let mut replayed = 0u64;
        for entry in entries {
            store.apply(&entry.commit);
            replayed += 1;
        }

        let mut manager = Self {
            wal: WalWriter::with_locked(&wal_path, locked)?,
            checkpoint_every,
            commits_since_checkpoint: replayed,
        };

        // Fold recovered commits into a snapshot so the WAL starts empty
        if replayed > 0 {
            manager.checkpoint(store)?;
        }

        Ok(manager)
    }

    /// Durably commit everything staged in the store
    ///
    /// Returns the LSN of the commit, or `None` if nothing was staged.
    pub fn commit(&mut self, store: &mut OrderedStore) -> Result<Option<u64>> {
        if !store.has_staged() {
            return Ok(None);
        }

        let batch = store.take_staged();
        let lsn = match self.wal.append(batch.clone()) {
            Ok(lsn) => lsn,
            Err(e) => {
                warn!(error = %e, "commit aborted; staged mutations discarded");
                return Err(e);
            }
        };

        store.apply(&batch);
        self.commits_since_checkpoint += 1;
        debug!(
            lsn,
            mutations = batch.mutations.len(),
            ids = ?batch.mutations.iter().map(Mutation::id).collect::<Vec<_>>(),
            "committed"
        );

        if self.commits_since_checkpoint >= self.checkpoint_every {
            // The commit is already durable in the WAL; a failed checkpoint
            // only means the WAL keeps growing until the next attempt.
            if let Err(e) = self.checkpoint(store) {
                warn!(error = %e, "checkpoint failed");
            }
        }

        Ok(Some(lsn))
    }

    /// Discard staged mutations without committing
    pub fn abort(&self, store: &mut OrderedStore) {
        if store.has_staged() {
            debug!(mutations = store.staged_len(), "transaction aborted");
        }
        store.discard_staged();
    }

    /// Write a snapshot of committed state and empty the WAL
    ///
    /// Snapshot first, truncate second: a crash in between replays commits
    /// the snapshot already holds, which is harmless.
    pub fn checkpoint(&mut self, store: &OrderedStore) -> Result<()> {
        let snapshot = store.write_snapshot()?;
        self.wal.truncate()?;
        info!(
            records = snapshot.entry_count,
            next_id = snapshot.next_id,
            bytes = snapshot.file_size,
            folded_commits = self.commits_since_checkpoint,
            "checkpoint"
        );
        self.commits_since_checkpoint = 0;
        Ok(())
    }

    /// Checkpoint if anything is pending and sync the WAL
    pub fn close(&mut self, store: &mut OrderedStore) -> Result<()> {
        self.abort(store);
        if self.commits_since_checkpoint > 0 || !store.snapshot_path().exists() {
            self.checkpoint(store)?;
        }
        self.wal.sync()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// LSN the next commit will receive
    pub fn current_lsn(&self) -> u64 {
        self.wal.current_lsn()
    }

    pub fn commits_since_checkpoint(&self) -> u64 {
        self.commits_since_checkpoint
    }

    /// WAL size in bytes
    pub fn wal_len(&self) -> u64 {
        self.wal.len()
    }

    #[cfg(test)]
    pub(crate) fn wal_mut(&mut self) -> &mut WalWriter {
        &mut self.wal
    }
}
