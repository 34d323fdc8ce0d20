//! The renewable-source contract external data providers implement.
//!
//! A graph is a DAG, not a chain: a join realizes two subgraphs and one node
//! or source name may feed several consumers. Each consumer therefore needs
//! its own full pass over the data, so a source is a *factory* that hands out
//! a fresh, independent cursor on every `open`.
//!
//! Contract:
//! - within one run, every `open` yields the same records in the same order;
//! - cursors from different `open` calls never share position.

use std::sync::Arc;

use crate::error::BoxError;
use crate::types::Record;

/// One pass over a source. Errors are yielded at the record that failed.
pub type SourceIter = Box<dyn Iterator<Item = Result<Record, BoxError>>>;

pub trait RenewableSource: Send + Sync {
    /// Start a fresh pass. Failing to start (e.g. a missing file) is reported
    /// here; failures mid-pass are yielded by the iterator.
    fn open(&self) -> Result<SourceIter, BoxError>;
}

/// Any `Fn() -> impl IntoIterator<Item = Record>` is a renewable source.
impl<F, I> RenewableSource for F
where
    F: Fn() -> I + Send + Sync,
    I: IntoIterator<Item = Record>,
    I::IntoIter: 'static,
{
    fn open(&self) -> Result<SourceIter, BoxError> {
        Ok(Box::new((self)().into_iter().map(Ok)))
    }
}

/// Records held in memory, cloned afresh for every pass.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Arc<[Record]>,
}

impl InMemorySource {
    pub fn new(records: impl Into<Vec<Record>>) -> Self {
        let records: Vec<Record> = records.into();
        Self {
            records: records.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RenewableSource for InMemorySource {
    fn open(&self) -> Result<SourceIter, BoxError> {
        let records = Arc::clone(&self.records);
        Ok(Box::new(
            (0..records.len()).map(move |i| Ok(records[i].clone())),
        ))
    }
}
