//! Closure adapters and small `RecordIter` constructors.

use rowflow_core::key::GroupKey;
use rowflow_core::types::Record;

use crate::traits::{CapabilityError, Group, Mapper, RecordIter, Reducer};

/// An iterator that yields nothing.
pub fn empty() -> RecordIter {
    Box::new(std::iter::empty())
}

/// An iterator over exactly one record.
pub fn once(record: Record) -> RecordIter {
    Box::new(std::iter::once(Ok(record)))
}

/// An iterator over already-computed records.
pub fn records(records: Vec<Record>) -> RecordIter {
    Box::new(records.into_iter().map(Ok))
}

/// A failed capability invocation, reported at the first pull.
pub fn fail(error: impl Into<CapabilityError>) -> RecordIter {
    Box::new(std::iter::once(Err(error.into())))
}

/// `Mapper` backed by a closure returning any iterable of records.
pub struct FnMapper<F>(pub F);

impl<F, I> Mapper for FnMapper<F>
where
    F: Fn(Record) -> I + Send + Sync,
    I: IntoIterator<Item = Record>,
    I::IntoIter: 'static,
{
    fn apply(&self, record: Record) -> RecordIter {
        Box::new((self.0)(record).into_iter().map(Ok))
    }
}

/// `Reducer` backed by a closure over the group key and its records.
pub struct FnReducer<F>(pub F);

impl<F, I> Reducer for FnReducer<F>
where
    F: Fn(&GroupKey, Group) -> I + Send + Sync,
    I: IntoIterator<Item = Record>,
    I::IntoIter: 'static,
{
    fn apply(&self, key: &GroupKey, group: Group) -> RecordIter {
        Box::new((self.0)(key, group).into_iter().map(Ok))
    }
}

pub fn map_fn<F, I>(f: F) -> FnMapper<F>
where
    F: Fn(Record) -> I + Send + Sync,
    I: IntoIterator<Item = Record>,
    I::IntoIter: 'static,
{
    FnMapper(f)
}

pub fn reduce_fn<F, I>(f: F) -> FnReducer<F>
where
    F: Fn(&GroupKey, Group) -> I + Send + Sync,
    I: IntoIterator<Item = Record>,
    I::IntoIter: 'static,
{
    FnReducer(f)
}
