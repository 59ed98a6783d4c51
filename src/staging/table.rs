//! Staging table implementation
//!
//! BTreeMap-based buffer of pending mutations.

use std::collections::BTreeMap;

use crate::record::Record;
use crate::wal::{CommitBatch, Mutation};

use super::StagedEntry;

/// Uncommitted mutations for one transaction
#[derive(Debug, Default)]
pub struct StagingTable {
    entries: BTreeMap<u64, StagedEntry>,

    /// Identifier counter as advanced by this transaction, if it allocated any
    next_id: Option<u64>,
}

impl StagingTable {
    /// Create a new empty staging table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the staged entry for an id, if any
    pub fn get(&self, id: u64) -> Option<&StagedEntry> {
        self.entries.get(&id)
    }

    /// Stage an insert or replace
    pub fn put(&mut self, id: u64, record: Record) {
        self.entries.insert(id, StagedEntry::Value(record));
    }

    /// Stage a removal
    pub fn delete(&mut self, id: u64) {
        self.entries.insert(id, StagedEntry::Tombstone);
    }

    /// Hand out the next identifier, starting from the committed counter
    pub fn allocate_id(&mut self, committed_next_id: u64) -> u64 {
        let id = self.next_id.unwrap_or(committed_next_id);
        self.next_id = Some(id + 1);
        id
    }

    /// Number of staged mutations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is staged and no id was allocated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.next_id.is_none()
    }

    /// Iterate staged entries in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &StagedEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Turn the staged state into a commit batch, leaving the table empty
    ///
    /// `committed_next_id` is carried over when no id was allocated.
    pub fn drain(&mut self, committed_next_id: u64) -> CommitBatch {
        let entries = std::mem::take(&mut self.entries);
        let next_id = self
            .next_id
            .take()
            .map_or(committed_next_id, |staged| staged.max(committed_next_id));

        let mutations = entries
            .into_iter()
            .map(|(id, entry)| match entry {
                StagedEntry::Value(record) => Mutation::Put { id, record },
                StagedEntry::Tombstone => Mutation::Delete { id },
            })
            .collect();

        CommitBatch { mutations, next_id }
    }

    /// Drop all staged state (abort)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_id = None;
    }
}
