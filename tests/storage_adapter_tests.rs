//! Spill storage backends as seen from a running engine.

mod common;

use std::fs;
use std::io::Read;

use common::{int, keyed, memory_engine, pseudo_random};
use rowflow::prelude::*;
use rowflow::rowflow_io::build_storage_from_config;
use rowflow::rowflow_mem::error::Error as MemError;
use rowflow::rowflow_mem::spill::HEADER_LEN;
use rowflow::rowflow_mem::Storage;
use tempfile::TempDir;

/// Every file below `dir`, at any depth.
fn files_under(dir: &TempDir) -> Vec<String> {
    rowflow::rowflow_io::FsStorage::new()
        .list(&dir.path().to_string_lossy())
        .unwrap()
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    match fs::read_dir(dir.path()) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_file_storage_builder_write_read() {
    let dir = TempDir::new().unwrap();
    let cfg = EngineConfig {
        spill_dir: dir.path().to_string_lossy().into_owned(),
        ..EngineConfig::default()
    };

    let storage = build_storage_from_config(&cfg.storage_config()).expect("fs storage");
    let path = format!("{}/segment.seg", cfg.spill_dir);
    storage.write(&path, b"hello world").expect("write");
    let mut back = String::new();
    storage.open_read(&path).unwrap().read_to_string(&mut back).unwrap();
    assert_eq!(back, "hello world");
    assert_eq!(storage.list(&cfg.spill_dir).unwrap(), vec![path]);
}

#[test]
fn test_memory_scheme_builds_memory_storage() {
    let cfg = EngineConfig {
        spill_uri: Some("memory://".into()),
        ..EngineConfig::default()
    };
    let storage = build_storage_from_config(&cfg.storage_config()).unwrap();
    storage.write("memory:/a.seg", b"x").unwrap();
    assert_eq!(storage.list("").unwrap(), vec!["memory:/a.seg".to_string()]);
}

#[test]
fn test_invalid_scheme_errors() {
    let cfg = EngineConfig {
        spill_uri: Some("ftp://example.com/spill".into()),
        ..EngineConfig::default()
    };
    assert!(build_storage_from_config(&cfg.storage_config()).is_err());
    assert!(Engine::new(cfg).is_err());
}

#[test]
fn test_file_spills_are_removed_after_run() {
    let dir = TempDir::new().unwrap();
    let cfg = EngineConfig {
        sort_chunk_rows: 16,
        spill_dir: dir.path().to_string_lossy().into_owned(),
        ..EngineConfig::default()
    };
    let engine = Engine::new(cfg).unwrap();

    let keys = pseudo_random(200, 50, 3);
    let bindings = Bindings::new().bind("in", InMemorySource::new(keyed(&keys)));
    let graph = Graph::source("in").unwrap().sort(["k"]).unwrap();

    let mut stream = engine.run(&graph, &bindings).unwrap();
    let first = stream.next().unwrap().unwrap();
    assert!(!files_under(&dir).is_empty(), "sort should have spilled");

    let mut out = vec![first];
    out.extend(stream.map(Result::unwrap));
    assert_eq!(out.len(), 200);
    assert!(out.windows(2).all(|w| int(&w[0], "k") <= int(&w[1], "k")));
    assert!(files_under(&dir).is_empty());

    drop(engine);
    assert!(dir_entries(&dir).is_empty(), "session directory should be gone");
}

#[test]
fn test_engines_sharing_a_spill_dir_keep_their_runs_apart() {
    let dir = TempDir::new().unwrap();
    let cfg = EngineConfig {
        sort_chunk_rows: 200,
        spill_dir: dir.path().to_string_lossy().into_owned(),
        ..EngineConfig::default()
    };
    let left = Engine::new(cfg.clone()).unwrap();
    let right = Engine::new(cfg).unwrap();

    let left_keys = pseudo_random(1000, 10_000, 5);
    let right_keys = pseudo_random(1000, 10_000, 17);
    let left_bindings = Bindings::new().bind("in", InMemorySource::new(keyed(&left_keys)));
    let right_bindings = Bindings::new().bind("in", InMemorySource::new(keyed(&right_keys)));
    let graph = Graph::source("in").unwrap().sort(["k"]).unwrap();

    // Both sorts have spilled every run before either merges.
    let mut left_stream = left.run(&graph, &left_bindings).unwrap();
    let mut right_stream = right.run(&graph, &right_bindings).unwrap();
    let mut left_out = vec![left_stream.next().unwrap().unwrap()];
    let mut right_out = vec![right_stream.next().unwrap().unwrap()];
    left_out.extend(left_stream.map(Result::unwrap));
    right_out.extend(right_stream.map(Result::unwrap));

    for (out, keys) in [(&left_out, &left_keys), (&right_out, &right_keys)] {
        assert_eq!(out.len(), 1000);
        assert!(out.windows(2).all(|w| int(&w[0], "k") <= int(&w[1], "k")));
        let mut expected = keys.clone();
        expected.sort();
        let got: Vec<i64> = out.iter().map(|r| int(r, "k")).collect();
        assert_eq!(got, expected);
    }
}

/// Bump the last ASCII digit of every stored segment's payload. The frames
/// still decode; only the checksum can notice.
fn tamper_with_segments(storage: &rowflow::rowflow_io::MemoryStorage) {
    for path in storage.list("").unwrap() {
        storage.modify(&path, |bytes| {
            if let Some(b) = bytes[HEADER_LEN..]
                .iter_mut()
                .rev()
                .find(|b| matches!(**b, b'0'..=b'8'))
            {
                *b += 1;
            }
        });
    }
}

#[test]
fn test_tampered_segment_fails_checksum() {
    let (engine, storage) = memory_engine(10);
    let tamper = storage.clone();
    let keys = pseudo_random(25, 100, 11);

    // Corrupts the spilled runs once the sort has read its whole input and
    // before any run is merged back.
    let bindings = Bindings::new().bind("in", move || {
        let storage = tamper.clone();
        keyed(&keys).into_iter().chain(
            std::iter::once_with(move || {
                tamper_with_segments(&storage);
                None::<Record>
            })
            .flatten(),
        )
    });
    let graph = Graph::source("in").unwrap().sort(["k"]).unwrap();

    let mut stream = engine.run(&graph, &bindings).unwrap();
    let err = stream
        .by_ref()
        .find_map(|item| item.err())
        .expect("a tampered run must be detected");
    assert!(
        matches!(err, OpError::Spill(MemError::ChecksumMismatch { .. })),
        "unexpected error: {err}"
    );
    assert!(stream.next().is_none());

    drop(stream);
    assert!(storage.is_empty());
}
