//! Storage adapters implementing `rowflow_mem::spill::Storage`.
//!
//! - `fs`: Local filesystem (default).
//! - `MemoryStorage` (crate root): process-local map, selected by `memory://`.
//!
//! The helper builder chooses the backend from the configured spill URI
//! (e.g. `file:///tmp/spill`, `memory://`).

mod fs;
pub use fs::FsStorage;

use rowflow_core::config::StorageConfig;
use rowflow_mem::Storage;

use crate::error::{Error, Result};
use crate::memory_storage::MemoryStorage;

/// Build the correct storage backend using the provided configuration.
pub fn build_storage_from_config(cfg: &StorageConfig) -> Result<Box<dyn Storage>> {
    match cfg.scheme() {
        Some("memory") | Some("mem") => Ok(Box::new(MemoryStorage::new())),
        Some("file") | None => {
            // Default to filesystem (treat URI as file:// or bare path).
            Ok(Box::new(FsStorage::new()))
        }
        Some(other) => Err(Error::Config(format!("unsupported spill scheme '{other}'"))),
    }
}
