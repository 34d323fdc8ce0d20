#![forbid(unsafe_code)]
//! rowflow-io: storage adapters and line-oriented record IO.
//!
//! - `storage`: concrete implementations of `rowflow_mem::Storage`
//!   (`FsStorage`, `MemoryStorage`) and the URI-driven builder.
//! - `readers`: renewable sources backed by files.
//! - `writers`: sinks for realized record streams.

pub mod error;
pub mod memory_storage;
pub mod readers;
pub mod storage;
pub mod writers;

pub use memory_storage::MemoryStorage;
pub use readers::jsonl::JsonlSource;
pub use storage::{build_storage_from_config, FsStorage};
pub use writers::jsonl::JsonlWriter;
