//! Configuration for GameVault
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CatalogError, Result};

/// Main configuration for a catalog instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── catalog.wal      (write-ahead log, one frame per commit)
    ///     └── catalog.snap     (last checkpointed snapshot)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Number of commits after which the WAL is folded into a new snapshot
    pub checkpoint_every: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./gamevault_data"),
            checkpoint_every: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_every == 0 {
            return Err(CatalogError::Config(
                "checkpoint_every must be at least 1".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(CatalogError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set how many commits may accumulate in the WAL before a checkpoint
    pub fn checkpoint_every(mut self, commits: u64) -> Self {
        self.config.checkpoint_every = commits;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
