//! Service Module
//!
//! The catalog façade that front-ends talk to.
//!
//! ## Responsibilities
//! - Own the store and transaction manager for the process lifetime
//! - Assign identifiers
//! - Turn each create/update/delete into exactly one commit
//! - Validate caller input before touching the store
//!
//! All operations run to completion, commit included, before returning.
//! Mutating operations take `&mut self`, so the borrow checker serializes
//! them; there is no internal locking.

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::record::{Record, RecordFields, RecordPatch};
use crate::search;
use crate::storage::OrderedStore;
use crate::transaction::TransactionManager;

/// The catalog service
///
/// Open once with [`open`](Self::open) and release with
/// [`shutdown`](Self::shutdown). Dropping the service without calling
/// `shutdown` still checkpoints on a best-effort basis.
pub struct CatalogService {
    /// Service configuration
    config: Config,

    /// Committed records and staging area
    store: OrderedStore,

    /// WAL and commit boundary
    txn: TransactionManager,

    /// Set once `shutdown` has released resources
    closed: bool,
}

impl CatalogService {
    /// Open or create a catalog with the given config
    ///
    /// Any failure here is a `StorageError` the caller cannot recover from.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut store = OrderedStore::open(&config.data_dir)?;
        let txn = TransactionManager::open(&mut store, config.checkpoint_every)?;

        info!(
            data_dir = %config.data_dir.display(),
            records = store.count(),
            "catalog open"
        );

        Ok(Self {
            config,
            store,
            txn,
            closed: false,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Mutations (one commit each)
    // =========================================================================

    /// Add a record and return its new id
    pub fn create(&mut self, fields: RecordFields) -> Result<u64> {
        fields.validate()?;

        let id = self.store.allocate_id();
        self.store.put(id, fields);
        self.txn.commit(&mut self.store)?;

        info!(id, "record created");
        Ok(id)
    }

    /// Get a record by id
    pub fn read(&self, id: u64) -> Result<Record> {
        self.store.get_or_not_found(id).cloned()
    }

    /// Replace only the fields set in `patch` and return the updated record
    pub fn update(&mut self, id: u64, patch: RecordPatch) -> Result<Record> {
        patch.validate()?;

        let mut record = self.store.get_or_not_found(id)?.clone();
        if patch.is_empty() {
            return Ok(record);
        }
        record.apply(patch);

        self.store.put(id, record.clone());
        self.txn.commit(&mut self.store)?;

        info!(id, "record updated");
        Ok(record)
    }

    /// Remove a record and return what was removed
    pub fn delete(&mut self, id: u64) -> Result<Record> {
        let removed = self.store.get_or_not_found(id)?.clone();

        self.store.delete(id)?;
        self.txn.commit(&mut self.store)?;

        info!(id, "record deleted");
        Ok(removed)
    }

    // =========================================================================
    // Queries (no transaction)
    // =========================================================================

    /// Every record, ascending by id
    pub fn list(&self) -> Vec<(u64, Record)> {
        self.store.iter()
    }

    /// Records with any field containing `text`, ignoring case
    ///
    /// Surrounding whitespace is ignored; blank text is a validation error.
    pub fn search(&self, text: &str) -> Result<Vec<(u64, Record)>> {
        let query = text.trim();
        if query.is_empty() {
            return Err(CatalogError::Validation(
                "search text must not be empty".to_string(),
            ));
        }
        Ok(search::search(self.store.entries(), query))
    }

    /// Number of live records
    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// True if this open created a brand new catalog
    pub fn is_first_run(&self) -> bool {
        self.store.is_first_run()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Checkpoint, flush and release the durable files
    pub fn shutdown(mut self) -> Result<()> {
        self.closed = true;
        self.txn.close(&mut self.store)?;
        info!("catalog closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Identifier the next create will receive
    pub fn next_id(&self) -> u64 {
        self.store.next_id()
    }

    /// Commits sitting in the WAL since the last snapshot
    pub fn pending_commits(&self) -> u64 {
        self.txn.commits_since_checkpoint()
    }
}

impl Drop for CatalogService {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.txn.close(&mut self.store) {
            warn!(error = %e, "checkpoint on drop failed; WAL will be replayed on next open");
        }
    }
}
