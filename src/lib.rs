//! # GameVault
//!
//! A single-user video game catalog with:
//! - Write-Ahead Logging (WAL): every create/update/delete is one fsynced commit
//! - Crash recovery with partial write handling
//! - Checkpointed snapshots of the ordered `id → record` map
//! - Monotonic identifiers that are never reused
//! - Case-insensitive substring search across every field
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Console (interactive menu)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    CatalogService                            │
//! │        (id assignment, validation, one commit per op)        │
//! └──────────┬──────────────────────┬───────────────────┬───────┘
//!            │ stage                │ commit            │ scan
//!            ▼                      ▼                   ▼
//!   ┌────────────────┐     ┌──────────────────┐  ┌─────────────┐
//!   │  OrderedStore  │◄────│TransactionManager│  │   search    │
//!   │ (BTreeMap +    │apply│   (WAL append)   │  │ (linear)    │
//!   │  staging)      │     └──────────────────┘  └─────────────┘
//!   └───────┬────────┘
//!           │ checkpoint
//!           ▼
//!   ┌────────────────┐
//!   │    Snapshot    │
//!   └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod search;
pub mod wal;
pub mod staging;
pub mod storage;
pub mod transaction;
pub mod service;
pub mod console;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CatalogError, Result};
pub use config::Config;
pub use record::{Record, RecordFields, RecordPatch};
pub use service::CatalogService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GameVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
