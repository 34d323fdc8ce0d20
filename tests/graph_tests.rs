//! Graph construction, binding, laziness, and renewable-source semantics.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{int, keyed, memory_engine, run_all};
use rowflow::prelude::*;
use rowflow::rowflow_core::error::BoxError;

/// Counts how many passes were started.
struct CountingSource {
    records: Vec<Record>,
    opens: Arc<AtomicUsize>,
}

impl RenewableSource for CountingSource {
    fn open(&self) -> Result<SourceIter, BoxError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.records.clone().into_iter().map(Ok)))
    }
}

#[test]
fn test_renewable_cursors_are_independent() {
    let source = InMemorySource::new(keyed(&[10, 20, 30]));
    let mut a = source.open().unwrap();
    let mut b = source.open().unwrap();

    assert_eq!(int(&a.next().unwrap().unwrap(), "k"), 10);
    assert_eq!(int(&a.next().unwrap().unwrap(), "k"), 20);
    assert_eq!(int(&b.next().unwrap().unwrap(), "k"), 10);
    assert_eq!(int(&a.next().unwrap().unwrap(), "k"), 30);
    assert_eq!(int(&b.next().unwrap().unwrap(), "k"), 20);
}

#[test]
fn test_nothing_is_read_before_first_pull() {
    let (engine, _storage) = memory_engine(4);
    let opens = Arc::new(AtomicUsize::new(0));
    let bindings = Bindings::new().bind(
        "in",
        CountingSource {
            records: keyed(&[2, 1]),
            opens: opens.clone(),
        },
    );
    let graph = Graph::source("in").unwrap().sort(["k"]).unwrap();

    let mut stream = engine.run(&graph, &bindings).unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 0);
    assert_eq!(int(&stream.next().unwrap().unwrap(), "k"), 1);
    assert_eq!(opens.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_node_feeds_both_join_sides() {
    let (engine, _storage) = memory_engine(4);
    let opens = Arc::new(AtomicUsize::new(0));
    let bindings = Bindings::new().bind(
        "in",
        CountingSource {
            records: keyed(&[3, 1, 2]),
            opens: opens.clone(),
        },
    );

    let sorted = Graph::source("in").unwrap().sort(["k"]).unwrap();
    let renamed = sorted.map(map_fn(|r: Record| {
        let id = r.get("id").cloned().unwrap_or(Value::Null);
        Some(record! { "k" => r.get("k").cloned().unwrap_or(Value::Null), "other" => id })
    }));
    let self_join = sorted.join(InnerJoiner::new(), &renamed, ["k"]).unwrap();

    let out = run_all(&engine, &self_join, &bindings);
    assert_eq!(opens.load(Ordering::SeqCst), 2, "one pass per consumer");
    let ks: Vec<i64> = out.iter().map(|r| int(r, "k")).collect();
    assert_eq!(ks, vec![1, 2, 3]);
    for r in &out {
        assert_eq!(int(r, "id"), int(r, "other"));
    }
}

#[test]
fn test_same_name_twice_gets_two_passes() {
    let (engine, _storage) = memory_engine(4);
    let opens = Arc::new(AtomicUsize::new(0));
    let bindings = Bindings::new().bind(
        "in",
        CountingSource {
            records: keyed(&[1, 2]),
            opens: opens.clone(),
        },
    );
    let left = Graph::source("in").unwrap();
    let right = Graph::source("in").unwrap();
    let joined = left.join(OuterJoiner::new(), &right, ["k"]).unwrap();

    assert_eq!(joined.source_names(), vec!["in".to_string()]);
    assert_eq!(run_all(&engine, &joined, &bindings).len(), 2);
    assert_eq!(opens.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unbound_source_fails_before_any_read() {
    let (engine, _storage) = memory_engine(4);
    let opens = Arc::new(AtomicUsize::new(0));
    let bindings = Bindings::new().bind(
        "left",
        CountingSource {
            records: keyed(&[1]),
            opens: opens.clone(),
        },
    );
    let graph = Graph::source("left")
        .unwrap()
        .join(InnerJoiner::new(), &Graph::source("right").unwrap(), ["k"])
        .unwrap();

    match engine.run(&graph, &bindings) {
        Err(ExecError::UnboundSource { name }) => assert_eq!(name, "right"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("run must fail"),
    }
    assert_eq!(opens.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_key_lists_are_construction_errors() {
    let src = Graph::source("in").unwrap();
    let none: Vec<String> = Vec::new();

    assert!(src.sort(none.clone()).is_err());
    assert!(src.reduce(common::FirstReducer, none.clone()).is_err());
    assert!(src.join(InnerJoiner::new(), &src, none).is_err());
    assert!(Graph::source("").is_err());
}

#[test]
fn test_closure_source_and_graph_run_from_env() {
    let graph = Graph::source("nums")
        .unwrap()
        .map(map_fn(|r: Record| {
            let k = r.get("k").and_then(Value::as_i64).unwrap_or(0);
            (0..k).map(|i| record! { "k" => k, "i" => i }).collect::<Vec<_>>()
        }));
    let bindings = Bindings::new().bind("nums", || keyed(&[0, 2, 1]));

    let out: Vec<Record> = graph
        .run(&bindings)
        .unwrap()
        .collect::<std::result::Result<_, _>>()
        .unwrap();
    assert_eq!(
        out,
        vec![
            record! { "k" => 2, "i" => 0 },
            record! { "k" => 2, "i" => 1 },
            record! { "k" => 1, "i" => 0 },
        ]
    );
}

#[test]
fn test_source_failure_is_reported_with_name() {
    struct Broken;
    impl RenewableSource for Broken {
        fn open(&self) -> Result<SourceIter, BoxError> {
            Err("disk on fire".into())
        }
    }

    let (engine, _storage) = memory_engine(4);
    let bindings = Bindings::new().bind("logs", Broken);
    let graph = Graph::source("logs").unwrap();
    let err = engine.run(&graph, &bindings).unwrap().next().unwrap().unwrap_err();
    assert!(matches!(err, OpError::Source { ref name, .. } if name == "logs"));
    assert!(err.to_string().contains("disk on fire"));
}
