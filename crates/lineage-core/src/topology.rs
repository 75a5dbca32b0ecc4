//! Topology trait
//!
//! A topology decides how a node that has just joined a network is wired in.
//! One is injected per network at creation and invoked exactly once per
//! node arrival, inside the same write that created the node.

use std::fmt::Debug;

use rand::RngCore;

use crate::entity::Network;
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::ids::{NetworkId, NodeId, VectorId};

/// Wiring policy of a network
pub trait Topology: Send + Sync + Debug {
    /// Tag recorded as the network's kind
    fn kind(&self) -> &str;

    /// Adjust a network before it is stored (capacity, details)
    fn configure(&self, network: &mut Network, rng: &mut dyn RngCore) -> GraphResult<()> {
        let _ = (network, rng);
        Ok(())
    }

    /// Wire a node that has just been added to `network`
    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()>;

    /// Connect a source to the network on demand
    fn add_source(
        &self,
        graph: &mut Graph,
        network: NetworkId,
        source: NodeId,
    ) -> GraphResult<Vec<VectorId>> {
        let _ = (graph, network, source);
        Err(GraphError::Unsupported(format!("{} topology add_source", self.kind())))
    }
}

/// A topology that never creates edges
///
/// Useful in tests that wire nodes by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwired;

impl Topology for Unwired {
    fn kind(&self) -> &str {
        "unwired"
    }

    fn add_node(&self, _graph: &mut Graph, _network: NetworkId, _node: NodeId) -> GraphResult<()> {
        Ok(())
    }
}
