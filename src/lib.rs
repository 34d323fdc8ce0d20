#![forbid(unsafe_code)]
//! rowflow: a lazy, single-process dataflow engine.
//!
//! Build a [`Graph`] of map / sort / reduce / join nodes over named sources,
//! bind the names to renewable sources, and pull the resulting stream:
//!
//! ```
//! use rowflow::prelude::*;
//!
//! let words = Graph::source("docs").unwrap()
//!     .map(map_fn(|r: Record| {
//!         let text = r.get("text").and_then(Value::as_str).unwrap_or("").to_string();
//!         text.split_whitespace()
//!             .map(|w| record! { "word" => w })
//!             .collect::<Vec<_>>()
//!     }))
//!     .sort(["word"]).unwrap()
//!     .reduce(reduce_fn(|key: &GroupKey, group: Group| {
//!         Some(key.to_record().with("count", group.len()))
//!     }), ["word"]).unwrap();
//!
//! let bindings = Bindings::new()
//!     .bind("docs", InMemorySource::new(vec![record! { "text" => "b a b" }]));
//! let engine = Engine::new(EngineConfig {
//!     spill_uri: Some("memory://".into()),
//!     ..EngineConfig::default()
//! }).unwrap();
//!
//! let out: Vec<Record> = engine.run(&words, &bindings).unwrap()
//!     .collect::<Result<_, _>>().unwrap();
//! assert_eq!(out, vec![
//!     record! { "word" => "a", "count" => 1 },
//!     record! { "word" => "b", "count" => 2 },
//! ]);
//! ```

pub use rowflow_core;
pub use rowflow_exec;
pub use rowflow_io;
pub use rowflow_mem;
pub use rowflow_operators;

pub use rowflow_core::record;
pub use rowflow_exec::{Bindings, Engine, ExecError, Graph};

pub mod prelude {
    pub use rowflow_core::config::EngineConfig;
    pub use rowflow_core::key::{GroupKey, KeySpec, KeyTuple};
    pub use rowflow_core::source::{InMemorySource, RenewableSource, SourceIter};
    pub use rowflow_core::types::{Record, Value};
    pub use rowflow_core::record;
    pub use rowflow_exec::{Bindings, Engine, ExecError, Graph};
    pub use rowflow_io::{JsonlSource, JsonlWriter};
    pub use rowflow_operators::adapters::{empty, fail, once, records};
    pub use rowflow_operators::{
        map_fn, reduce_fn, CapabilityError, Group, InnerJoiner, Joiner, LeftJoiner, Mapper,
        OpError, OuterJoiner, RecordIter, RecordStream, Reducer, RightJoiner,
    };
}
