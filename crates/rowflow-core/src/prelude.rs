//! Convenient re-exports for downstream crates.

pub use crate::config::{EngineConfig, StorageConfig};
pub use crate::error::{BoxError, Error, Result};
pub use crate::id::{NodeId, SpillId};
pub use crate::key::{GroupKey, KeySpec, KeyTuple};
pub use crate::source::{InMemorySource, RenewableSource, SourceIter};
pub use crate::types::{Record, Value};
