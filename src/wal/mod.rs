//! Write-Ahead Log (WAL) Module
//!
//! Provides durability for commits through append-only logging.
//!
//! ## Responsibilities
//! - Append one frame per committed transaction, fsynced before the commit
//!   becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Frame 1 (one commit)                    │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Frame 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! `Data` is the bincode encoding of a [`WalEntry`].

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{CommitBatch, Mutation, WalEntry, HEADER_SIZE};
pub use writer::WalWriter;
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
