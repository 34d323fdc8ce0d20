//! Grouping (reduce) and merge-join behaviour through the graph API.

mod common;

use std::sync::{Arc, Mutex};

use common::{int, keyed, memory_engine, run_all, text, Count, FirstReducer, Sum};
use rowflow::prelude::*;

fn bind(name: &str, records: Vec<Record>) -> Bindings {
    Bindings::new().bind(name, InMemorySource::new(records))
}

/// Records every group it is handed, then emits nothing.
#[derive(Clone, Default)]
struct Spy {
    groups: Arc<Mutex<Vec<(KeyTuple, Vec<i64>)>>>,
}

impl Reducer for Spy {
    fn apply(&self, key: &GroupKey, group: Group) -> RecordIter {
        let ids = group.map(|r| common::int(&r, "id")).collect();
        self.groups.lock().unwrap().push((key.tuple().clone(), ids));
        empty()
    }
}

#[test]
fn test_one_reducer_call_per_distinct_key() {
    let (engine, _storage) = memory_engine(100);
    let spy = Spy::default();
    let graph = Graph::source("in")
        .unwrap()
        .reduce(spy.clone(), ["k"])
        .unwrap();

    let out = run_all(&engine, &graph, &bind("in", keyed(&[1, 1, 2, 5, 5, 5])));
    assert!(out.is_empty());

    let groups = spy.groups.lock().unwrap().clone();
    assert_eq!(
        groups,
        vec![
            (KeyTuple::new(vec![1.into()]), vec![0, 1]),
            (KeyTuple::new(vec![2.into()]), vec![2]),
            (KeyTuple::new(vec![5.into()]), vec![3, 4, 5]),
        ]
    );
}

#[test]
fn test_stock_reducers_after_sort() {
    let (engine, _storage) = memory_engine(3);
    let input = vec![
        record! { "user" => "b", "amount" => 5, "id" => 0 },
        record! { "user" => "a", "amount" => 1, "id" => 1 },
        record! { "user" => "b", "amount" => 7, "id" => 2 },
        record! { "user" => "a", "amount" => 2, "id" => 3 },
        record! { "user" => "c", "amount" => 4, "id" => 4 },
    ];
    let sorted = Graph::source("in").unwrap().sort(["user"]).unwrap();

    let sums = sorted
        .reduce(Sum { column: "amount".into() }, ["user"])
        .unwrap();
    let counts = sorted.reduce(Count::new("n"), ["user"]).unwrap();
    let firsts = sorted.reduce(FirstReducer, ["user"]).unwrap();
    let bindings = bind("in", input);

    assert_eq!(
        run_all(&engine, &sums, &bindings),
        vec![
            record! { "user" => "a", "amount" => 3 },
            record! { "user" => "b", "amount" => 12 },
            record! { "user" => "c", "amount" => 4 },
        ]
    );
    let n: Vec<i64> = run_all(&engine, &counts, &bindings).iter().map(|r| int(r, "n")).collect();
    assert_eq!(n, vec![2, 2, 1]);
    let first_ids: Vec<i64> = run_all(&engine, &firsts, &bindings)
        .iter()
        .map(|r| int(r, "id"))
        .collect();
    assert_eq!(first_ids, vec![1, 0, 4]);
}

#[test]
fn test_mixed_int_float_keys_group_exactly() {
    let (engine, _storage) = memory_engine(2);
    let big = 1i64 << 53;
    let input = vec![
        record! { "k" => big + 1, "id" => 0 },
        record! { "k" => big as f64, "id" => 1 },
        record! { "k" => big, "id" => 2 },
    ];
    let graph = Graph::source("in")
        .unwrap()
        .sort(["k"])
        .unwrap()
        .reduce(FirstReducer, ["k"])
        .unwrap();

    let ids: Vec<i64> = run_all(&engine, &graph, &bind("in", input))
        .iter()
        .map(|r| int(r, "id"))
        .collect();
    assert_eq!(ids, vec![1, 0]);
}

#[test]
fn test_unsorted_reduce_input_fails_fast() {
    let (engine, _storage) = memory_engine(100);
    let graph = Graph::source("in")
        .unwrap()
        .reduce(Count::new("n"), ["k"])
        .unwrap();
    let mut stream = engine.run(&graph, &bind("in", keyed(&[1, 3, 2, 4]))).unwrap();

    assert_eq!(stream.next().unwrap().unwrap(), record! { "k" => 1, "n" => 1 });
    match stream.next().unwrap() {
        Err(OpError::OrderViolation { previous, current, .. }) => {
            assert_eq!(previous, KeyTuple::new(vec![3.into()]));
            assert_eq!(current, KeyTuple::new(vec![2.into()]));
        }
        other => panic!("expected order violation, got {other:?}"),
    }
    assert!(stream.next().is_none());
}

fn join_graph<J: Joiner + 'static>(joiner: J) -> Graph {
    let left = Graph::source("left").unwrap();
    let right = Graph::source("right").unwrap();
    left.join(joiner, &right, ["id"]).unwrap()
}

fn sides(left: &[i64], right: &[i64]) -> Bindings {
    let side = |ids: &[i64], tag: &str| -> InMemorySource {
        InMemorySource::new(
            ids.iter()
                .map(|id| record! { "id" => *id, tag => format!("{tag}{id}") })
                .collect::<Vec<_>>(),
        )
    };
    Bindings::new()
        .bind("left", side(left, "l"))
        .bind("right", side(right, "r"))
}

#[test]
fn test_disjoint_keys_inner_empty_outer_all() {
    let (engine, _storage) = memory_engine(100);
    let bindings = sides(&[1, 3, 5], &[2, 4]);

    assert!(run_all(&engine, &join_graph(InnerJoiner::new()), &bindings).is_empty());

    let outer = run_all(&engine, &join_graph(OuterJoiner::new()), &bindings);
    assert_eq!(outer.len(), 5);
    let ids: Vec<i64> = outer.iter().map(|r| int(r, "id")).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_left_and_right_variants() {
    let (engine, _storage) = memory_engine(100);
    let bindings = sides(&[1, 2], &[2, 3]);

    let left = run_all(&engine, &join_graph(LeftJoiner::new()), &bindings);
    assert_eq!(
        left,
        vec![
            record! { "id" => 1, "l" => "l1" },
            record! { "id" => 2, "l" => "l2", "r" => "r2" },
        ]
    );

    let right = run_all(&engine, &join_graph(RightJoiner::new()), &bindings);
    assert_eq!(
        right,
        vec![
            record! { "id" => 2, "l" => "l2", "r" => "r2" },
            record! { "id" => 3, "r" => "r3" },
        ]
    );
}

#[test]
fn test_identical_keys_one_match_per_key() {
    struct CountMatches(Arc<Mutex<Vec<i64>>>);
    impl Joiner for CountMatches {
        fn on_match(&self, key: &GroupKey, left: Group, right: Group) -> RecordIter {
            self.0
                .lock()
                .unwrap()
                .push(key.get("id").and_then(Value::as_i64).unwrap());
            once(key.to_record().with("pairs", left.len() * right.len()))
        }
    }

    let (engine, _storage) = memory_engine(100);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let bindings = sides(&[1, 1, 2, 3, 3, 3], &[1, 2, 2, 3]);

    let out = run_all(&engine, &join_graph(CountMatches(calls.clone())), &bindings);
    assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
    let pairs: Vec<i64> = out.iter().map(|r| int(r, "pairs")).collect();
    assert_eq!(pairs, vec![2, 2, 3]);
}

#[test]
fn test_clashing_columns_are_suffixed() {
    let (engine, _storage) = memory_engine(100);
    let bindings = Bindings::new()
        .bind("left", InMemorySource::new(vec![record! { "id" => 1, "name" => "ann" }]))
        .bind("right", InMemorySource::new(vec![record! { "id" => 1, "name" => "bob" }]));

    let out = run_all(&engine, &join_graph(InnerJoiner::new()), &bindings);
    assert_eq!(out.len(), 1);
    assert_eq!(text(&out[0], "name_1"), "ann");
    assert_eq!(text(&out[0], "name_2"), "bob");
}

#[test]
fn test_join_after_sorting_both_sides() {
    let (engine, storage) = memory_engine(2);
    let left = Graph::source("users").unwrap().sort(["user"]).unwrap();
    let right = Graph::source("orders").unwrap().sort(["user"]).unwrap();
    let joined = left.join(InnerJoiner::new(), &right, ["user"]).unwrap();

    let bindings = Bindings::new()
        .bind(
            "users",
            InMemorySource::new(vec![
                record! { "user" => "c", "city" => "Oslo" },
                record! { "user" => "a", "city" => "Rome" },
                record! { "user" => "b", "city" => "Lima" },
            ]),
        )
        .bind(
            "orders",
            InMemorySource::new(vec![
                record! { "user" => "b", "item" => "pen" },
                record! { "user" => "a", "item" => "cup" },
                record! { "user" => "a", "item" => "hat" },
                record! { "user" => "d", "item" => "map" },
            ]),
        );

    let out = run_all(&engine, &joined, &bindings);
    assert_eq!(
        out,
        vec![
            record! { "user" => "a", "city" => "Rome", "item" => "cup" },
            record! { "user" => "a", "city" => "Rome", "item" => "hat" },
            record! { "user" => "b", "city" => "Lima", "item" => "pen" },
        ]
    );
    assert!(storage.is_empty());
}
