//! Leaf stream over one renewable source.

use std::sync::Arc;

use rowflow_core::source::{RenewableSource, SourceIter};
use rowflow_core::types::Record;

use crate::traits::OpError;

/// Pulls from a fresh pass of a renewable source.
///
/// The source is opened on the first pull, not at construction, so realizing
/// a graph does no work until the caller starts consuming.
pub struct SourceStream {
    name: String,
    source: Arc<dyn RenewableSource>,
    pass: Option<SourceIter>,
    done: bool,
}

impl SourceStream {
    pub fn new(name: impl Into<String>, source: Arc<dyn RenewableSource>) -> Self {
        Self {
            name: name.into(),
            source,
            pass: None,
            done: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn fail(&mut self, error: rowflow_core::error::BoxError) -> OpError {
        self.done = true;
        OpError::Source {
            name: self.name.clone(),
            error,
        }
    }
}

impl Iterator for SourceStream {
    type Item = Result<Record, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.pass.is_none() {
            match self.source.open() {
                Ok(pass) => self.pass = Some(pass),
                Err(e) => return Some(Err(self.fail(e))),
            }
        }
        let next = self.pass.as_mut()?.next();
        match next {
            Some(Ok(record)) => Some(Ok(record)),
            Some(Err(e)) => Some(Err(self.fail(e))),
            None => {
                self.done = true;
                self.pass = None;
                None
            }
        }
    }
}
