//! Shared capabilities and fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use rowflow::prelude::*;
use rowflow::rowflow_io::MemoryStorage;
use rowflow::rowflow_mem::PeakTracker;

/// Splits a text column on whitespace, one output record per word, keeping
/// every other column.
pub struct Split {
    pub column: String,
}

impl Split {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
        }
    }
}

impl Mapper for Split {
    fn apply(&self, record: Record) -> RecordIter {
        let text = match record.require(&self.column) {
            Ok(v) => v.as_str().unwrap_or_default().to_string(),
            Err(e) => return rowflow::prelude::fail(e),
        };
        let column = self.column.clone();
        Box::new(
            text.split_whitespace()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .into_iter()
                .map(move |w| Ok(record.clone().with(column.clone(), w))),
        )
    }
}

/// Emits the key columns plus the number of records in the group.
pub struct Count {
    pub column: String,
}

impl Count {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
        }
    }
}

impl Reducer for Count {
    fn apply(&self, key: &GroupKey, group: Group) -> RecordIter {
        once(key.to_record().with(self.column.clone(), group.len()))
    }
}

/// Emits only the first record of each group.
pub struct FirstReducer;

impl Reducer for FirstReducer {
    fn apply(&self, _key: &GroupKey, group: Group) -> RecordIter {
        Box::new(group.take(1).map(Ok))
    }
}

/// Sums an integer column per group.
pub struct Sum {
    pub column: String,
}

impl Reducer for Sum {
    fn apply(&self, key: &GroupKey, group: Group) -> RecordIter {
        let column = self.column.clone();
        let mut total = 0i64;
        for r in group {
            match r.require(&column) {
                Ok(v) => total += v.as_i64().unwrap_or(0),
                Err(e) => return rowflow::prelude::fail(e),
            }
        }
        once(key.to_record().with(column, total))
    }
}

/// Engine spilling into an inspectable in-memory store.
pub fn memory_engine(chunk_rows: usize) -> (Engine, MemoryStorage) {
    let storage = MemoryStorage::new();
    let cfg = EngineConfig {
        sort_chunk_rows: chunk_rows,
        ..EngineConfig::default()
    };
    let engine = Engine::with_storage(cfg, Box::new(storage.clone())).unwrap();
    (engine, storage)
}

pub fn tracked_engine(chunk_rows: usize) -> (Engine, MemoryStorage, Arc<PeakTracker>) {
    let (engine, storage) = memory_engine(chunk_rows);
    let tracker = Arc::new(PeakTracker::new());
    (engine.with_tracker(tracker.clone()), storage, tracker)
}

pub fn run_all(engine: &Engine, graph: &Graph, bindings: &Bindings) -> Vec<Record> {
    engine
        .run(graph, bindings)
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

pub fn int(record: &Record, column: &str) -> i64 {
    record.get(column).and_then(Value::as_i64).unwrap()
}

pub fn text(record: &Record, column: &str) -> String {
    record.get(column).and_then(Value::as_str).unwrap().to_string()
}

/// Deterministic pseudo-random integers (LCG), so tests need no rand crate.
pub fn pseudo_random(n: usize, modulo: i64, seed: u64) -> Vec<i64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as i64).rem_euclid(modulo)
        })
        .collect()
}

/// Records `{k, id}` where `id` is the input position.
pub fn keyed(keys: &[i64]) -> Vec<Record> {
    keys.iter()
        .enumerate()
        .map(|(id, k)| record! { "k" => *k, "id" => id })
        .collect()
}
