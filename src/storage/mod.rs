//! Storage Module
//!
//! Persistent, ordered record storage.
//!
//! ## Responsibilities
//! - Keep committed records in ascending id order in memory
//! - Persist them as checkpointed snapshots
//! - Stage mutations for the transaction manager
//!
//! The WAL carries every commit made since the last snapshot; see
//! [`crate::wal`] and [`crate::transaction`].

mod snapshot;
mod store;

pub use snapshot::{Snapshot, SnapshotInfo, SnapshotReader, SnapshotWriter};
pub use store::OrderedStore;
