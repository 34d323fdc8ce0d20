#![forbid(unsafe_code)]
//! rowflow-core: shared kernel for the rowflow dataflow engine.
//!
//! This crate contains only *pure* types, small helpers, and interfaces
//! (traits) that other crates implement. There is **no I/O** and **no
//! spill policy** here.
//!
//! Crates that use this:
//! - rowflow-mem: serializes `Record`s into spill segments.
//! - rowflow-io: implements `RenewableSource` for files and storage backends.
//! - rowflow-operators: projects `KeySpec`s into `KeyTuple`s while sorting,
//!   grouping, and joining.
//! - rowflow-exec: builds graphs and reads `EngineConfig`.

pub mod config;
pub mod error;
pub mod id;
pub mod key;
pub mod prelude;
pub mod source;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
