//! Merge join over two key-sorted streams.
//!
//! Both sides are grouped by key (with the same ordering check as reduce) and
//! walked in lockstep. Which unmatched groups produce output is decided
//! entirely by the `Joiner`.

use std::cmp::Ordering;
use std::sync::Arc;

use rowflow_core::key::{GroupKey, KeySpec, KeyTuple};
use rowflow_core::types::Record;

use crate::group::GroupCursor;
use crate::traits::{Group, Joiner, OpError, RecordIter, RecordStream};

type Head = (KeyTuple, Vec<Record>);

pub struct MergeJoin {
    left: GroupCursor,
    right: GroupCursor,
    joiner: Arc<dyn Joiner>,
    keys: KeySpec,
    left_head: Option<Head>,
    right_head: Option<Head>,
    current: Option<RecordIter>,
    done: bool,
}

impl MergeJoin {
    pub fn new(
        left: RecordStream,
        right: RecordStream,
        keys: KeySpec,
        joiner: Arc<dyn Joiner>,
    ) -> Self {
        Self {
            left: GroupCursor::new(left, keys.clone(), "join (left)"),
            right: GroupCursor::new(right, keys.clone(), "join (right)"),
            joiner,
            keys,
            left_head: None,
            right_head: None,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, error: OpError) -> Option<Result<Record, OpError>> {
        self.done = true;
        self.current = None;
        self.left_head = None;
        self.right_head = None;
        Some(Err(error))
    }

    fn group_key(&self, tuple: KeyTuple) -> GroupKey {
        GroupKey::new(self.keys.clone(), tuple)
    }

    /// Pick the next pair of groups and invoke the matching handler.
    /// Returns `None` once both sides are exhausted.
    fn advance(&mut self) -> Option<Result<RecordIter, OpError>> {
        if self.left_head.is_none() {
            match self.left.next_group() {
                Some(Ok(head)) => self.left_head = Some(head),
                Some(Err(e)) => return Some(Err(e)),
                None => {}
            }
        }
        if self.right_head.is_none() {
            match self.right.next_group() {
                Some(Ok(head)) => self.right_head = Some(head),
                Some(Err(e)) => return Some(Err(e)),
                None => {}
            }
        }

        let order = match (&self.left_head, &self.right_head) {
            (Some((l, _)), Some((r, _))) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return None,
        };

        let out = match order {
            Ordering::Equal => {
                let (key, left) = self.left_head.take()?;
                let (_, right) = self.right_head.take()?;
                let key = self.group_key(key);
                self.joiner.on_match(&key, Group::new(left), Group::new(right))
            }
            Ordering::Less => {
                let (key, left) = self.left_head.take()?;
                let key = self.group_key(key);
                self.joiner.on_left_only(&key, Group::new(left))
            }
            Ordering::Greater => {
                let (key, right) = self.right_head.take()?;
                let key = self.group_key(key);
                self.joiner.on_right_only(&key, Group::new(right))
            }
        };
        Some(Ok(out))
    }
}

impl Iterator for MergeJoin {
    type Item = Result<Record, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(out) = self.current.as_mut() {
                match out.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => return self.fail(OpError::Capability(e)),
                    None => self.current = None,
                }
            }
            match self.advance() {
                Some(Ok(out)) => self.current = Some(out),
                Some(Err(e)) => return self.fail(e),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
