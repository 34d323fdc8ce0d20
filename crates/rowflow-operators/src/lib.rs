#![forbid(unsafe_code)]
//! rowflow-operators: pull-based streaming operators.
//!
//! Every operator is an `Iterator<Item = Result<Record, OpError>>` wrapping
//! one or two upstream streams:
//! - `map`: one-for-one flatten through a `Mapper`, no buffering.
//! - `sort`: bounded-memory external sort (chunk runs + k-way merge).
//! - `group`: fold over contiguous equal-key groups through a `Reducer`.
//! - `join`: dual-cursor merge join over two key-sorted streams.
//!
//! Nothing here knows about graphs; `rowflow-exec` wires operators together.

pub mod adapters;
pub mod group;
pub mod join;
pub mod map;
pub mod sort;
pub mod source;
pub mod traits;

pub use adapters::{map_fn, reduce_fn, FnMapper, FnReducer};
pub use group::{FoldStream, GroupCursor};
pub use join::{InnerJoiner, LeftJoiner, MergeJoin, OuterJoiner, RightJoiner};
pub use map::MapStream;
pub use sort::ExternalSort;
pub use source::SourceStream;
pub use traits::{CapabilityError, Group, Joiner, Mapper, OpError, RecordIter, RecordStream, Reducer};
