//! Bounded-memory external sort.
//!
//! - `run`: chunk buffering, stable in-memory sort, and spilled runs.
//! - `merge`: k-way merge over sorted runs with one resident record per run.
//! - `external`: the `ExternalSort` stream tying both together.

pub mod external;
pub mod merge;
pub mod run;

pub use external::ExternalSort;
pub use merge::KWayMerge;
pub use run::{RunGenerator, SortEntry, SortedRun, SpilledRun};
