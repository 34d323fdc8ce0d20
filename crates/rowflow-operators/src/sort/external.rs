//! External sort operator with run generation and k-way merge.

use std::sync::Arc;

use rowflow_core::key::KeySpec;
use rowflow_core::types::Record;
use rowflow_mem::{PeakTracker, SpillManager};

use super::merge::KWayMerge;
use super::run::{RunGenerator, SortEntry, SortedRun};
use crate::traits::{OpError, RecordStream};

/// External sort stream.
///
/// The first pull drains the upstream into chunk runs of at most
/// `chunk_rows` records. If the input never filled a chunk it is served
/// straight from memory; otherwise the runs are k-way merged. Output is
/// non-decreasing by key and stable.
pub struct ExternalSort {
    keys: KeySpec,
    spill: Arc<SpillManager>,
    chunk_rows: usize,
    tracker: Option<Arc<PeakTracker>>,
    state: State,
}

enum State {
    Pending(RecordStream),
    Memory(std::vec::IntoIter<SortEntry>),
    Merging(KWayMerge),
    Done,
}

impl ExternalSort {
    pub fn new(
        upstream: RecordStream,
        keys: KeySpec,
        spill: Arc<SpillManager>,
        chunk_rows: usize,
    ) -> Self {
        Self {
            keys,
            spill,
            chunk_rows,
            tracker: None,
            state: State::Pending(upstream),
        }
    }

    /// Report resident record counts to `tracker`.
    pub fn with_tracker(mut self, tracker: Arc<PeakTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn keys(&self) -> &KeySpec {
        &self.keys
    }

    fn start(&mut self, upstream: RecordStream) -> Result<State, OpError> {
        let mut gen = RunGenerator::new(self.keys.clone(), Arc::clone(&self.spill), self.chunk_rows);
        if let Some(t) = &self.tracker {
            gen = gen.with_tracker(Arc::clone(t));
        }
        for record in upstream {
            gen.push(record?)?;
        }

        let mut runs = gen.finish();
        match runs.len() {
            0 => Ok(State::Done),
            1 if matches!(runs[0], SortedRun::InMemory(_)) => match runs.pop() {
                Some(SortedRun::InMemory(entries)) => Ok(State::Memory(entries)),
                _ => Ok(State::Done),
            },
            _ => Ok(State::Merging(KWayMerge::new(
                runs,
                self.keys.clone(),
                self.tracker.clone(),
            )?)),
        }
    }
}

impl Iterator for ExternalSort {
    type Item = Result<Record, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Pending(_) => {
                    let upstream = match std::mem::replace(&mut self.state, State::Done) {
                        State::Pending(upstream) => upstream,
                        _ => return None,
                    };
                    match self.start(upstream) {
                        Ok(state) => self.state = state,
                        Err(e) => return Some(Err(e)),
                    }
                }
                State::Memory(entries) => {
                    return match entries.next() {
                        Some(entry) => Some(Ok(entry.record)),
                        None => {
                            self.state = State::Done;
                            None
                        }
                    };
                }
                State::Merging(merge) => {
                    let next = merge.next();
                    match next {
                        Some(Ok(record)) => return Some(Ok(record)),
                        Some(Err(e)) => {
                            self.state = State::Done;
                            return Some(Err(e));
                        }
                        None => {
                            self.state = State::Done;
                            return None;
                        }
                    }
                }
                State::Done => return None,
            }
        }
    }
}
