//! Sliding-window microsociety
//!
//! Only the `n` most recent arrivals are active at once: each newcomer is
//! fed by the `n - 1` nodes that arrived just before it.

use lineage_core::{ConnectDirection, Graph, GraphResult, Network, NetworkId, NodeId, Topology};
use rand::RngCore;
use tracing::debug;

use crate::members::other_ids;

/// Detail key recorded on the network
pub const WINDOW: &str = "n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialMicrosociety {
    n: usize,
}

impl SequentialMicrosociety {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Number of nodes active at once
    pub fn n(&self) -> usize {
        self.n
    }
}

impl Topology for SequentialMicrosociety {
    fn kind(&self) -> &str {
        "microsociety"
    }

    fn configure(&self, network: &mut Network, _rng: &mut dyn RngCore) -> GraphResult<()> {
        network.details.set(WINDOW, self.n as u64);
        Ok(())
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        let window: Vec<NodeId> = other_ids(graph, network, node)?
            .into_iter()
            .rev()
            .take(self.n.saturating_sub(1))
            .collect();
        debug!(network = %network, node = %node, parents = window.len(), "Joining window");
        for parent in window {
            graph.connect(parent, node, ConnectDirection::To)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{
        FailedFilter, GraphConfig, NeighborDirection, NetworkOptions, NodeKind, NodeType,
    };
    use std::sync::Arc;

    #[test]
    fn test_newcomer_is_fed_by_the_window() {
        let mut graph = Graph::new(GraphConfig::seeded(2));
        let net = graph
            .create_network(Arc::new(SequentialMicrosociety::new(3)), NetworkOptions::default())
            .unwrap();
        let ids: Vec<NodeId> = (0..5)
            .map(|_| graph.add_node(net, NodeKind::agent()).unwrap())
            .collect();

        let parents: Vec<NodeId> = graph
            .neighbors(ids[4], &NodeType::Any, NeighborDirection::From)
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(parents, vec![ids[2], ids[3]]);

        // 0 + 1 + 2 + 2 + 2
        assert_eq!(graph.vectors(net, FailedFilter::Live).unwrap().len(), 7);
    }

    #[test]
    fn test_window_of_one_is_isolated() {
        let mut graph = Graph::new(GraphConfig::seeded(2));
        let net = graph
            .create_network(Arc::new(SequentialMicrosociety::new(1)), NetworkOptions::default())
            .unwrap();
        for _ in 0..3 {
            graph.add_node(net, NodeKind::agent()).unwrap();
        }
        assert!(graph.vectors(net, FailedFilter::All).unwrap().is_empty());
        assert_eq!(graph.network(net).unwrap().details.int(WINDOW), Some(1));
    }
}
