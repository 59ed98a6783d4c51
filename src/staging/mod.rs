//! Staging Module
//!
//! Holds the uncommitted mutations of the transaction in progress.
//!
//! ## Responsibilities
//! - Record puts and deletes without touching committed state
//! - Track the identifier counter the transaction has advanced to
//! - Drain into a [`CommitBatch`](crate::wal::CommitBatch) in ascending id order
//!
//! ## Data Structure Choice
//! A BTreeMap keyed by record id:
//! - Last write per id wins, so a batch never carries redundant mutations
//! - Ordered keys give a deterministic WAL payload

mod table;

pub use table::StagingTable;

use crate::record::Record;

/// Entry stored in the staging table
#[derive(Debug, Clone, PartialEq)]
pub enum StagedEntry {
    /// A record to insert or replace
    Value(Record),

    /// A tombstone (record to remove)
    Tombstone,
}
