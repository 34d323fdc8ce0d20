//! Immutable operator DAG.
//!
//! Every builder call returns a new `Graph` that points at its upstream(s)
//! through an `Arc`, so a node can be shared by several consumers and the
//! same graph can be run any number of times.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rowflow_core::error::{Error, Result};
use rowflow_core::key::KeySpec;
use rowflow_operators::{Joiner, Mapper, RecordStream, Reducer};

use crate::bindings::Bindings;
use crate::runtime::{Engine, ExecError};

#[derive(Clone)]
pub struct Graph {
    node: Arc<Node>,
}

pub(crate) enum Node {
    Source {
        name: String,
    },
    Map {
        upstream: Graph,
        mapper: Arc<dyn Mapper>,
    },
    Sort {
        upstream: Graph,
        keys: KeySpec,
    },
    Reduce {
        upstream: Graph,
        reducer: Arc<dyn Reducer>,
        keys: KeySpec,
    },
    Join {
        left: Graph,
        right: Graph,
        joiner: Arc<dyn Joiner>,
        keys: KeySpec,
    },
}

impl Node {
    fn kind(&self) -> &'static str {
        match self {
            Node::Source { .. } => "source",
            Node::Map { .. } => "map",
            Node::Sort { .. } => "sort",
            Node::Reduce { .. } => "reduce",
            Node::Join { .. } => "join",
        }
    }
}

impl Graph {
    fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }

    /// A leaf reading from the renewable source bound to `name` at run time.
    pub fn source(name: impl Into<String>) -> Result<Graph> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Construction("source name must not be empty".into()));
        }
        Ok(Self::from_node(Node::Source { name }))
    }

    /// Apply `mapper` to every record, flattening its outputs in order.
    pub fn map<M: Mapper + 'static>(&self, mapper: M) -> Graph {
        self.map_shared(Arc::new(mapper))
    }

    pub fn map_shared(&self, mapper: Arc<dyn Mapper>) -> Graph {
        Self::from_node(Node::Map {
            upstream: self.clone(),
            mapper,
        })
    }

    /// Stable sort by `keys` using bounded memory.
    pub fn sort<I, S>(&self, keys: I) -> Result<Graph>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::from_node(Node::Sort {
            upstream: self.clone(),
            keys: KeySpec::new(keys)?,
        }))
    }

    /// Fold each group of equal `keys` through `reducer`. The upstream must
    /// already be sorted by `keys`.
    pub fn reduce<R, I, S>(&self, reducer: R, keys: I) -> Result<Graph>
    where
        R: Reducer + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reduce_shared(Arc::new(reducer), keys)
    }

    pub fn reduce_shared<I, S>(&self, reducer: Arc<dyn Reducer>, keys: I) -> Result<Graph>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::from_node(Node::Reduce {
            upstream: self.clone(),
            reducer,
            keys: KeySpec::new(keys)?,
        }))
    }

    /// Merge-join this graph (left) with `other` (right) on `keys`. Both sides
    /// must already be sorted by `keys`.
    pub fn join<J, I, S>(&self, joiner: J, other: &Graph, keys: I) -> Result<Graph>
    where
        J: Joiner + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_shared(Arc::new(joiner), other, keys)
    }

    pub fn join_shared<I, S>(&self, joiner: Arc<dyn Joiner>, other: &Graph, keys: I) -> Result<Graph>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::from_node(Node::Join {
            left: self.clone(),
            right: other.clone(),
            joiner,
            keys: KeySpec::new(keys)?,
        }))
    }

    /// Operator kind of this node ("source", "map", ...).
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Distinct source names this graph reads, in first-seen order
    /// (depth-first, left before right).
    pub fn source_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen_nodes = HashSet::new();
        let mut seen_names = HashSet::new();
        collect_sources(self, &mut seen_nodes, &mut seen_names, &mut names);
        names
    }

    /// Whether `self` and `other` are the same node.
    pub fn ptr_eq(&self, other: &Graph) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Run with an engine configured from the environment.
    pub fn run(&self, bindings: &Bindings) -> std::result::Result<RecordStream, ExecError> {
        Engine::from_env()?.run(self, bindings)
    }
}

fn collect_sources(
    graph: &Graph,
    seen_nodes: &mut HashSet<*const Node>,
    seen_names: &mut HashSet<String>,
    names: &mut Vec<String>,
) {
    if !seen_nodes.insert(Arc::as_ptr(&graph.node)) {
        return;
    }
    match graph.node() {
        Node::Source { name } => {
            if seen_names.insert(name.clone()) {
                names.push(name.clone());
            }
        }
        Node::Map { upstream, .. } | Node::Sort { upstream, .. } | Node::Reduce { upstream, .. } => {
            collect_sources(upstream, seen_nodes, seen_names, names)
        }
        Node::Join { left, right, .. } => {
            collect_sources(left, seen_nodes, seen_names, names);
            collect_sources(right, seen_nodes, seen_names, names);
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Source { name } => f.debug_struct("Source").field("name", name).finish(),
            Node::Map { upstream, .. } => f.debug_struct("Map").field("upstream", upstream).finish(),
            Node::Sort { upstream, keys } => f
                .debug_struct("Sort")
                .field("keys", &keys.columns())
                .field("upstream", upstream)
                .finish(),
            Node::Reduce { upstream, keys, .. } => f
                .debug_struct("Reduce")
                .field("keys", &keys.columns())
                .field("upstream", upstream)
                .finish(),
            Node::Join {
                left, right, keys, ..
            } => f
                .debug_struct("Join")
                .field("keys", &keys.columns())
                .field("left", left)
                .field("right", right)
                .finish(),
        }
    }
}
