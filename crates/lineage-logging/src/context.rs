//! Graph context injection
//!
//! Thread-local storage for the network and node a piece of work concerns,
//! so that every span opened inside a scope can be tagged with them.

use std::cell::RefCell;

use lineage_core::{NetworkId, NodeId};
use uuid::Uuid;

/// Context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphContextData {
    pub network_id: Option<NetworkId>,
    pub node_id: Option<NodeId>,
    /// Identifies one run of a process, e.g. one simulation
    pub run_id: Uuid,
}

impl GraphContextData {
    /// Context for work on a whole network
    pub fn network(network: NetworkId) -> Self {
        Self {
            network_id: Some(network),
            node_id: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// Context for work on one node
    pub fn node(network: NetworkId, node: NodeId) -> Self {
        Self {
            node_id: Some(node),
            ..Self::network(network)
        }
    }

    /// Keep a run id stable across several scopes
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }
}

thread_local! {
    static GRAPH_CONTEXT: RefCell<Option<GraphContextData>> = const { RefCell::new(None) };
}

/// RAII guard for graph context
///
/// Sets the context for the current thread on creation and restores the
/// previous one, if any, on drop.
///
/// ```ignore
/// use lineage_logging::{GraphContextData, GraphContextGuard};
///
/// let _guard = GraphContextGuard::new(GraphContextData::network(net));
/// // Spans opened here carry network_id = "Network1"
/// tracing::info_span!("step").in_scope(|| tracing::info!("Stepping"));
/// ```
#[must_use = "the context is cleared when the guard is dropped"]
pub struct GraphContextGuard {
    previous: Option<GraphContextData>,
}

impl GraphContextGuard {
    pub fn new(data: GraphContextData) -> Self {
        let previous = GRAPH_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));
        Self { previous }
    }

    /// Get the current context (if any)
    pub fn current() -> Option<GraphContextData> {
        GRAPH_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_network() -> Option<NetworkId> {
        Self::current().and_then(|ctx| ctx.network_id)
    }

    pub fn current_node() -> Option<NodeId> {
        Self::current().and_then(|ctx| ctx.node_id)
    }
}

impl Drop for GraphContextGuard {
    fn drop(&mut self) {
        GRAPH_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block with graph context set
///
/// ```ignore
/// with_graph_context!(GraphContextData::node(net, node), {
///     tracing::info!("Receiving");
/// });
/// ```
#[macro_export]
macro_rules! with_graph_context {
    ($data:expr, $body:block) => {{
        let _guard = $crate::context::GraphContextGuard::new($data);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_context_guard() {
        assert!(GraphContextGuard::current().is_none());
        {
            let _guard = GraphContextGuard::new(GraphContextData::network(NetworkId(1)));
            assert_eq!(GraphContextGuard::current_network(), Some(NetworkId(1)));
            assert_eq!(GraphContextGuard::current_node(), None);
        }
        assert!(GraphContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts() {
        let _outer = GraphContextGuard::new(GraphContextData::network(NetworkId(1)));
        {
            let _inner = GraphContextGuard::new(GraphContextData::node(NetworkId(1), NodeId(4)));
            assert_eq!(GraphContextGuard::current_node(), Some(NodeId(4)));
        }
        // Restored to the network-level context
        assert_eq!(GraphContextGuard::current_node(), None);
        assert_eq!(GraphContextGuard::current_network(), Some(NetworkId(1)));
    }

    #[test]
    fn test_run_id_is_kept() {
        let run = Uuid::new_v4();
        let value = with_graph_context!(GraphContextData::network(NetworkId(2)).with_run_id(run), {
            GraphContextGuard::current().map(|ctx| ctx.run_id)
        });
        assert_eq!(value, Some(run));
    }
}
