//! Grouping over key-sorted streams, and the fold (reduce) operator.
//!
//! A group is a maximal run of contiguous records with equal key tuples. Only
//! the active group and a one-record lookahead are buffered.

use std::sync::Arc;

use rowflow_core::key::{GroupKey, KeySpec, KeyTuple};
use rowflow_core::types::Record;

use crate::traits::{Group, OpError, RecordIter, RecordStream, Reducer};

/// Splits a key-sorted stream into groups.
///
/// A key strictly smaller than the group it follows is an `OrderViolation`;
/// the offending group is not handed out and the cursor stops.
pub struct GroupCursor {
    upstream: RecordStream,
    keys: KeySpec,
    operator: &'static str,
    lookahead: Option<(KeyTuple, Record)>,
    done: bool,
}

impl GroupCursor {
    pub fn new(upstream: RecordStream, keys: KeySpec, operator: &'static str) -> Self {
        Self {
            upstream,
            keys,
            operator,
            lookahead: None,
            done: false,
        }
    }

    pub fn keys(&self) -> &KeySpec {
        &self.keys
    }

    fn pull(&mut self) -> Option<Result<(KeyTuple, Record), OpError>> {
        let record = match self.upstream.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        Some(
            self.keys
                .project(&record)
                .map(|key| (key, record))
                .map_err(OpError::from),
        )
    }

    fn fail(&mut self, error: OpError) -> Option<Result<(KeyTuple, Vec<Record>), OpError>> {
        self.done = true;
        self.lookahead = None;
        Some(Err(error))
    }

    /// The next group with its key, or `None` once the input is exhausted.
    pub fn next_group(&mut self) -> Option<Result<(KeyTuple, Vec<Record>), OpError>> {
        if self.done {
            return None;
        }
        let (key, first) = match self.lookahead.take() {
            Some(head) => head,
            None => match self.pull() {
                Some(Ok(head)) => head,
                Some(Err(e)) => return self.fail(e),
                None => {
                    self.done = true;
                    return None;
                }
            },
        };

        let mut records = vec![first];
        loop {
            match self.pull() {
                Some(Ok((next_key, record))) => {
                    if next_key == key {
                        records.push(record);
                    } else if next_key < key {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            operator = self.operator,
                            previous = %key,
                            current = %next_key,
                            "order violation"
                        );
                        return self.fail(OpError::OrderViolation {
                            operator: self.operator,
                            previous: key,
                            current: next_key,
                        });
                    } else {
                        self.lookahead = Some((next_key, record));
                        break;
                    }
                }
                Some(Err(e)) => return self.fail(e),
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        Some(Ok((key, records)))
    }
}

impl Iterator for GroupCursor {
    type Item = Result<(KeyTuple, Vec<Record>), OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_group()
    }
}

/// Reduce operator: invokes the reducer once per group, in group order, and
/// drains its output before the next group is assembled.
pub struct FoldStream {
    groups: GroupCursor,
    reducer: Arc<dyn Reducer>,
    current: Option<RecordIter>,
    done: bool,
}

impl FoldStream {
    pub fn new(upstream: RecordStream, keys: KeySpec, reducer: Arc<dyn Reducer>) -> Self {
        Self {
            groups: GroupCursor::new(upstream, keys, "reduce"),
            reducer,
            current: None,
            done: false,
        }
    }
}

impl Iterator for FoldStream {
    type Item = Result<Record, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(out) = self.current.as_mut() {
                match out.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => {
                        self.done = true;
                        self.current = None;
                        return Some(Err(OpError::Capability(e)));
                    }
                    None => self.current = None,
                }
            }
            match self.groups.next_group() {
                Some(Ok((key, records))) => {
                    let key = GroupKey::new(self.groups.keys().clone(), key);
                    self.current = Some(self.reducer.apply(&key, Group::new(records)));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
