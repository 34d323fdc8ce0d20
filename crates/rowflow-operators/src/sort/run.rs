//! Run generation utilities for external sort.
//!
//! Accumulates records in memory (up to the chunk capacity), sorts them, and
//! writes full chunks to spill storage as runs.

use std::sync::Arc;

use rowflow_core::id::SpillId;
use rowflow_core::key::{KeySpec, KeyTuple};
use rowflow_core::types::Record;
use rowflow_mem::spill::{RunReader, SegmentMeta};
use rowflow_mem::{PeakTracker, SpillManager};

use crate::traits::OpError;

/// A buffered record with its key and intake sequence number.
///
/// The sequence is unique per sort and increases in arrival order, so
/// `(key, seq)` is a total order that makes the sort stable.
#[derive(Debug, Clone)]
pub struct SortEntry {
    pub key: KeyTuple,
    pub seq: u64,
    pub record: Record,
}

/// Generator for sorted runs.
pub struct RunGenerator {
    spill_id: SpillId,
    keys: KeySpec,
    spill: Arc<SpillManager>,
    buffer: Vec<SortEntry>,
    capacity: usize,
    next_seq: u64,
    runs: Vec<SpilledRun>,
    tracker: Option<Arc<PeakTracker>>,
}

impl RunGenerator {
    pub fn new(keys: KeySpec, spill: Arc<SpillManager>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            spill_id: spill.next_spill_id(),
            keys,
            spill,
            buffer: Vec::with_capacity(capacity.min(4096)),
            capacity,
            next_seq: 0,
            runs: Vec::new(),
            tracker: None,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<PeakTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Number of runs spilled so far.
    pub fn spilled_runs(&self) -> usize {
        self.runs.len()
    }

    /// Add one record. A full buffer is spilled first, so the buffer never
    /// holds more than `capacity` records.
    pub fn push(&mut self, record: Record) -> Result<(), OpError> {
        let key = self.keys.project(&record)?;
        if self.buffer.len() >= self.capacity {
            self.flush_run()?;
        }
        self.buffer.push(SortEntry {
            key,
            seq: self.next_seq,
            record,
        });
        self.next_seq += 1;
        if let Some(t) = &self.tracker {
            t.record_resident(self.buffer.len());
        }
        Ok(())
    }

    /// Sort the buffer and write it to spill storage as one run.
    fn flush_run(&mut self) -> Result<(), OpError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        sort_entries(&mut self.buffer);

        let meta = self.spill.write_run(
            self.spill_id,
            self.buffer.iter().map(|e| (e.seq, &e.record)),
        )?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            spill = %self.spill_id,
            run = self.runs.len(),
            rows = self.buffer.len(),
            "sort chunk spilled"
        );

        self.runs.push(SpilledRun::new(meta, Arc::clone(&self.spill)));
        self.buffer.clear();
        Ok(())
    }

    /// Finish intake. Spilled runs come first, in spill order; the remaining
    /// buffer becomes a final in-memory run.
    pub fn finish(mut self) -> Vec<SortedRun> {
        sort_entries(&mut self.buffer);
        let buffer = std::mem::take(&mut self.buffer);
        let mut runs: Vec<SortedRun> = std::mem::take(&mut self.runs)
            .into_iter()
            .map(SortedRun::Spilled)
            .collect();
        if !buffer.is_empty() {
            runs.push(SortedRun::InMemory(buffer.into_iter()));
        }
        runs
    }
}

fn sort_entries(entries: &mut [SortEntry]) {
    // Entries arrive in sequence order and `sort_by` is stable.
    entries.sort_by(|a, b| a.key.cmp(&b.key));
}

/// One sorted run, either still in memory or spilled to storage.
pub enum SortedRun {
    InMemory(std::vec::IntoIter<SortEntry>),
    Spilled(SpilledRun),
}

impl SortedRun {
    /// Records this run holds in memory right now.
    pub fn resident(&self) -> usize {
        match self {
            SortedRun::InMemory(it) => it.len(),
            SortedRun::Spilled(_) => 0,
        }
    }

    pub fn next_entry(&mut self, keys: &KeySpec) -> Option<Result<SortEntry, OpError>> {
        match self {
            SortedRun::InMemory(it) => it.next().map(Ok),
            SortedRun::Spilled(run) => run.next_entry(keys),
        }
    }
}

/// A run that lives in a spill segment.
///
/// Owns the segment: it is deleted once the run has been read to the end, or
/// when the run is dropped early.
pub struct SpilledRun {
    meta: SegmentMeta,
    spill: Arc<SpillManager>,
    reader: Option<RunReader>,
    released: bool,
}

impl SpilledRun {
    pub fn new(meta: SegmentMeta, spill: Arc<SpillManager>) -> Self {
        Self {
            meta,
            spill,
            reader: None,
            released: false,
        }
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    fn next_entry(&mut self, keys: &KeySpec) -> Option<Result<SortEntry, OpError>> {
        if self.released {
            return None;
        }
        if self.reader.is_none() {
            match self.spill.open_run(&self.meta) {
                Ok(reader) => self.reader = Some(reader),
                Err(e) => return Some(Err(e.into())),
            }
        }
        let next = self.reader.as_mut()?.next();
        match next {
            Some(Ok((seq, record))) => Some(
                keys.project(&record)
                    .map(|key| SortEntry { key, seq, record })
                    .map_err(OpError::from),
            ),
            Some(Err(e)) => Some(Err(e.into())),
            None => match self.release() {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            },
        }
    }

    fn release(&mut self) -> Result<(), OpError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.reader = None;
        self.spill.delete_segment(&self.meta.name)?;
        Ok(())
    }
}

impl Drop for SpilledRun {
    fn drop(&mut self) {
        if let Err(_e) = self.release() {
            #[cfg(feature = "tracing")]
            tracing::warn!(segment = %self.meta.name.0, error = %_e, "failed to release spill segment");
        }
    }
}
