//! Scheduler: realizes a graph into one lazy pull chain.
//!
//! Each node is realized once per consumer. A node reachable along two paths
//! (or a source name used twice) becomes two independent streams with their
//! own cursors; nothing is cached between them.

use std::sync::Arc;

use rowflow_core::id::NodeId;
use rowflow_mem::{PeakTracker, SpillManager};
use rowflow_operators::{
    ExternalSort, FoldStream, MapStream, MergeJoin, RecordStream, SourceStream,
};

use crate::bindings::Bindings;
use crate::graph::{Graph, Node};
use crate::metrics;
use crate::runtime::ExecError;

pub struct Scheduler<'a> {
    bindings: &'a Bindings,
    spill: Arc<SpillManager>,
    chunk_rows: usize,
    tracker: Option<Arc<PeakTracker>>,
    next_node: NodeId,
    depth: usize,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        bindings: &'a Bindings,
        spill: Arc<SpillManager>,
        chunk_rows: usize,
        tracker: Option<Arc<PeakTracker>>,
    ) -> Self {
        Self {
            bindings,
            spill,
            chunk_rows,
            tracker,
            next_node: NodeId::new(0),
            depth: 0,
        }
    }

    /// Number of operator streams realized so far.
    pub fn realized(&self) -> u64 {
        self.next_node.get()
    }

    fn allocate(&mut self) -> NodeId {
        let id = self.next_node;
        self.next_node = id.succ();
        id
    }

    /// Build the stream for `graph`. Does not pull any records.
    pub fn realize(&mut self, graph: &Graph) -> Result<RecordStream, ExecError> {
        let id = self.allocate();
        metrics::node_realized(id, graph.kind(), self.depth);
        self.depth += 1;
        let stream = self.realize_node(graph);
        self.depth -= 1;
        stream
    }

    fn realize_node(&mut self, graph: &Graph) -> Result<RecordStream, ExecError> {
        let stream: RecordStream = match graph.node() {
            Node::Source { name } => {
                let source = self
                    .bindings
                    .get(name)
                    .ok_or_else(|| ExecError::UnboundSource { name: name.clone() })?;
                Box::new(SourceStream::new(name.clone(), Arc::clone(source)))
            }
            Node::Map { upstream, mapper } => {
                let upstream = self.realize(upstream)?;
                Box::new(MapStream::new(upstream, Arc::clone(mapper)))
            }
            Node::Sort { upstream, keys } => {
                let upstream = self.realize(upstream)?;
                let sort = ExternalSort::new(
                    upstream,
                    keys.clone(),
                    Arc::clone(&self.spill),
                    self.chunk_rows,
                );
                match &self.tracker {
                    Some(t) => Box::new(sort.with_tracker(Arc::clone(t))),
                    None => Box::new(sort),
                }
            }
            Node::Reduce {
                upstream,
                reducer,
                keys,
            } => {
                let upstream = self.realize(upstream)?;
                Box::new(FoldStream::new(upstream, keys.clone(), Arc::clone(reducer)))
            }
            Node::Join {
                left,
                right,
                joiner,
                keys,
            } => {
                let left = self.realize(left)?;
                let right = self.realize(right)?;
                Box::new(MergeJoin::new(left, right, keys.clone(), Arc::clone(joiner)))
            }
        };
        Ok(stream)
    }
}
