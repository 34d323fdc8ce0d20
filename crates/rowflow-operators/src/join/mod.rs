//! Sort-merge join.
//!
//! - `merge`: the dual-cursor `MergeJoin` stream.
//! - `joiners`: stock inner/left/right/outer joiners.

pub mod joiners;
pub mod merge;

pub use joiners::{InnerJoiner, LeftJoiner, OuterJoiner, RightJoiner};
pub use merge::MergeJoin;
