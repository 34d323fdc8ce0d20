//! K-way merge of sorted runs using a min-heap.
//!
//! The heap holds the current head of every run that is not exhausted,
//! ordered by (key tuple, intake sequence, run index).

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use rowflow_core::key::{KeySpec, KeyTuple};
use rowflow_core::types::Record;
use rowflow_mem::PeakTracker;

use super::run::{SortEntry, SortedRun};
use crate::traits::OpError;

/// Entry in the merge heap.
#[derive(Debug)]
struct HeapItem {
    key: KeyTuple,
    seq: u64,
    run_idx: usize,
    record: Record,
}

impl HeapItem {
    fn from_entry(entry: SortEntry, run_idx: usize) -> Self {
        Self {
            key: entry.key,
            seq: entry.seq,
            run_idx,
            record: entry.record,
        }
    }
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then(self.seq.cmp(&other.seq))
            .then(self.run_idx.cmp(&other.run_idx))
    }
}

pub struct KWayMerge {
    runs: Vec<SortedRun>,
    heap: BinaryHeap<Reverse<HeapItem>>,
    keys: KeySpec,
    tracker: Option<Arc<PeakTracker>>,
    failed: bool,
}

impl KWayMerge {
    /// Prime the heap with the first record of every run.
    pub fn new(
        mut runs: Vec<SortedRun>,
        keys: KeySpec,
        tracker: Option<Arc<PeakTracker>>,
    ) -> Result<Self, OpError> {
        let mut heap = BinaryHeap::with_capacity(runs.len());
        for (run_idx, run) in runs.iter_mut().enumerate() {
            if let Some(entry) = run.next_entry(&keys) {
                heap.push(Reverse(HeapItem::from_entry(entry?, run_idx)));
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(runs = runs.len(), "k-way merge started");

        let merge = Self {
            runs,
            heap,
            keys,
            tracker,
            failed: false,
        };
        merge.report_resident();
        Ok(merge)
    }

    /// Records held in memory: heap heads plus any in-memory run contents.
    pub fn resident(&self) -> usize {
        self.heap.len() + self.runs.iter().map(SortedRun::resident).sum::<usize>()
    }

    fn report_resident(&self) {
        if let Some(t) = &self.tracker {
            t.record_resident(self.resident());
        }
    }
}

impl Iterator for KWayMerge {
    type Item = Result<Record, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let Reverse(item) = self.heap.pop()?;
        if let Some(run) = self.runs.get_mut(item.run_idx) {
            match run.next_entry(&self.keys) {
                Some(Ok(entry)) => self
                    .heap
                    .push(Reverse(HeapItem::from_entry(entry, item.run_idx))),
                Some(Err(e)) => {
                    self.failed = true;
                    self.heap.clear();
                    return Some(Err(e));
                }
                None => {}
            }
        }
        self.report_resident();
        Some(Ok(item.record))
    }
}
