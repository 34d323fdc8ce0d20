//! Capability traits and the stream types operators exchange.
//!
//! Callers plug behaviour into the engine through three capabilities:
//! `Mapper`, `Reducer`, and `Joiner`. Each returns a lazy `RecordIter`; the
//! engine pulls it only as far as its own consumer pulls.

use rowflow_core::error::{BoxError, Error as CoreError};
use rowflow_core::key::{GroupKey, KeyTuple};
use rowflow_core::types::Record;
use rowflow_mem::error::Error as MemError;

use thiserror::Error;

use crate::adapters;

/// Error type raised by caller-supplied code.
pub type CapabilityError = BoxError;

/// Output of one capability invocation.
pub type RecordIter = Box<dyn Iterator<Item = Result<Record, CapabilityError>>>;

/// Output of an operator: what a downstream operator (or the caller) pulls.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record, OpError>>>;

#[derive(Debug, Error)]
pub enum OpError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input to a grouping operator was not sorted by its key.
    #[error("{operator}: input is not sorted by key ({current} follows {previous})")]
    OrderViolation {
        operator: &'static str,
        previous: KeyTuple,
        current: KeyTuple,
    },

    /// Raised by a Mapper, Reducer, or Joiner; carried through untouched.
    #[error(transparent)]
    Capability(CapabilityError),

    #[error(transparent)]
    Spill(#[from] MemError),

    #[error("source '{name}' failed: {error}")]
    Source {
        name: String,
        #[source]
        error: BoxError,
    },
}

impl OpError {
    /// Downcast a capability or source failure back to the caller's error type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            OpError::Capability(e) | OpError::Source { error: e, .. } => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Per-record transformation producing zero or more records.
pub trait Mapper: Send + Sync {
    fn apply(&self, record: Record) -> RecordIter;
}

/// Per-group transformation. `group` holds exactly the records sharing `key`,
/// in upstream order.
pub trait Reducer: Send + Sync {
    fn apply(&self, key: &GroupKey, group: Group) -> RecordIter;
}

/// Per-key-group combination of two sides. Unimplemented handlers produce
/// nothing, so an inner join only needs `on_match`.
pub trait Joiner: Send + Sync {
    fn on_match(&self, _key: &GroupKey, _left: Group, _right: Group) -> RecordIter {
        adapters::empty()
    }

    fn on_left_only(&self, _key: &GroupKey, _left: Group) -> RecordIter {
        adapters::empty()
    }

    fn on_right_only(&self, _key: &GroupKey, _right: Group) -> RecordIter {
        adapters::empty()
    }
}

/// Single-use sequence over the records of one group.
#[derive(Debug)]
pub struct Group {
    records: std::vec::IntoIter<Record>,
}

impl Group {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Records not yet consumed.
    pub fn as_slice(&self) -> &[Record] {
        self.records.as_slice()
    }
}

impl Iterator for Group {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for Group {}
