//! Map operator: order-preserving flatten through a `Mapper`.

use std::sync::Arc;

use rowflow_core::types::Record;

use crate::traits::{Mapper, OpError, RecordIter, RecordStream};

/// Holds at most the output iterator of the record currently being mapped.
pub struct MapStream {
    upstream: RecordStream,
    mapper: Arc<dyn Mapper>,
    current: Option<RecordIter>,
}

impl MapStream {
    pub fn new(upstream: RecordStream, mapper: Arc<dyn Mapper>) -> Self {
        Self {
            upstream,
            mapper,
            current: None,
        }
    }
}

impl Iterator for MapStream {
    type Item = Result<Record, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(out) = self.current.as_mut() {
                match out.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => return Some(Err(OpError::Capability(e))),
                    None => self.current = None,
                }
            }
            match self.upstream.next()? {
                Ok(record) => self.current = Some(self.mapper.apply(record)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
