#![forbid(unsafe_code)]
//! rowflow-mem: spill storage for external-memory operators.
//!
//! The external sort writes each full chunk as one sorted run through the
//! `SpillManager` and later reads runs back one record at a time, so only one
//! record per run is resident while merging.
//!
//! No concrete IO lives here. The `Storage` trait (in `spill::`) is
//! implemented by `rowflow-io`.

pub mod error;
pub mod spill;
pub mod tracking;

pub use spill::{Codec, RunReader, SegmentMeta, SpillManager, Storage};
pub use tracking::PeakTracker;
