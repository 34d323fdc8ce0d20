//! Run and realization events.
//!
//! Everything here compiles to nothing unless the `tracing` feature is on.

use rowflow_core::id::NodeId;

/// A run passed its binding check and is about to be realized.
#[cfg(feature = "tracing")]
pub fn run_started(root_kind: &str, sources: &[String]) {
    tracing::info!(root = root_kind, sources = %sources.join(","), "run started");
}

/// One operator stream was built for `id`.
#[cfg(feature = "tracing")]
pub fn node_realized(id: NodeId, kind: &str, depth: usize) {
    let span = tracing::trace_span!("realize", node = %id, kind);
    let _enter = span.enter();
    tracing::trace!(depth, "node realized");
}

#[cfg(not(feature = "tracing"))]
pub fn run_started(_root_kind: &str, _sources: &[String]) {}

#[cfg(not(feature = "tracing"))]
pub fn node_realized(_id: NodeId, _kind: &str, _depth: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_accept_realized_nodes() {
        run_started("sort", &["left".to_string(), "right".to_string()]);
        node_realized(NodeId::new(0).succ(), "source", 2);
    }
}
