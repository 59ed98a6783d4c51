//! Error types for GameVault
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CatalogError
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Unified error type for GameVault operations
#[derive(Debug, Error)]
pub enum CatalogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot corruption detected: {0}")]
    SnapshotCorruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Record {0} not found")]
    NotFound(u64),

    #[error("Invalid input: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// True for a missing identifier
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// True for malformed caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }
}

impl From<bincode::Error> for CatalogError {
    fn from(err: bincode::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}
