#![forbid(unsafe_code)]
//! rowflow-exec: graph builder, scheduler, and runtime.
//!
//! A `Graph` is an immutable DAG of operator nodes. `Engine::run` checks that
//! every source name is bound, then realizes the graph into one lazy
//! `RecordStream`; no record is read until the caller pulls.

pub mod bindings;
pub mod graph;
pub mod metrics;
pub mod runtime;
pub mod scheduler;

pub use bindings::Bindings;
pub use graph::Graph;
pub use runtime::{Engine, ExecError};
