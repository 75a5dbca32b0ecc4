//! Linear wiring policies
//!
//! A chain passes information down a line of nodes ordered by arrival. The
//! delayed variant lets the first arrivals hear from the sources directly
//! before the line starts.

use lineage_core::{
    ConnectDirection, GraphError, Graph, GraphResult, NetworkId, NodeId, Topology,
};
use tracing::info;

use crate::members::{other_ids, others};

/// Arrivals that are fed straight from the sources in a [`DelayedChain`]
pub const DELAYED_CHAIN_HEAD: usize = 11;

/// `Source -> Node -> Node -> ...`
///
/// The source is optional but must arrive first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chain;

impl Topology for Chain {
    fn kind(&self) -> &str {
        "chain"
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        let is_source = graph.node(node)?.is_source();
        let existing = other_ids(graph, network, node)?;
        if is_source && !existing.is_empty() {
            return Err(GraphError::SourceAfterNodes(network));
        }

        if let Some(parent) = existing.last().copied() {
            info!(network = %network, parent = %parent, child = %node, "Extending chain");
            graph.connect(parent, node, ConnectDirection::To)?;
        }
        Ok(())
    }
}

/// A chain whose first arrivals are fed by every source
///
/// While the network holds at most [`DELAYED_CHAIN_HEAD`] live nodes, each
/// newcomer is connected from every live source. After that only the most
/// recent other node feeds the newcomer. Sources themselves are never wired
/// on arrival.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayedChain;

impl Topology for DelayedChain {
    fn kind(&self) -> &str {
        "delayed-chain"
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        if graph.node(node)?.is_source() {
            return Ok(());
        }

        let existing = others(graph, network, node)?;
        let parents: Vec<NodeId> = if existing.len() < DELAYED_CHAIN_HEAD {
            existing.iter().filter(|n| n.is_source()).map(|n| n.id).collect()
        } else {
            existing.last().map(|n| n.id).into_iter().collect()
        };

        for parent in parents {
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

    fn network(topology: impl Topology + 'static) -> (Graph, NetworkId) {
        let mut graph = Graph::new(GraphConfig::seeded(11));
        let net = graph
            .create_network(Arc::new(topology), NetworkOptions::default())
            .unwrap();
        (graph, net)
    }

    #[test]
    fn test_chain_links_each_node_to_the_previous_one() {
        let (mut graph, net) = network(Chain);
        let source = graph.add_node(net, NodeKind::source()).unwrap();
        let a = graph.add_node(net, NodeKind::agent()).unwrap();
        let b = graph.add_node(net, NodeKind::agent()).unwrap();

        assert!(graph.is_connected(source, a, NeighborDirection::To).unwrap());
        assert!(graph.is_connected(a, b, NeighborDirection::To).unwrap());
        assert!(!graph.is_connected(source, b, NeighborDirection::Either).unwrap());
        assert_eq!(graph.vectors(net, FailedFilter::Live).unwrap().len(), 2);
    }

    #[test]
    fn test_chain_rejects_a_late_source() {
        let (mut graph, net) = network(Chain);
        graph.add_node(net, NodeKind::agent()).unwrap();
        let err = graph.add_node(net, NodeKind::source()).unwrap_err();
        assert!(matches!(err, GraphError::SourceAfterNodes(id) if id == net));
    }

    #[test]
    fn test_rejected_source_leaves_the_chain_intact() {
        let (mut graph, net) = network(Chain);
        let a = graph.add_node(net, NodeKind::agent()).unwrap();
        assert!(graph.add_node(net, NodeKind::source()).is_err());
        assert_eq!(graph.size(net, &NodeType::Any, FailedFilter::All).unwrap(), 1);

        let b = graph.add_node(net, NodeKind::agent()).unwrap();
        let parents: Vec<NodeId> = graph
            .neighbors(b, &NodeType::Any, NeighborDirection::From)
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(parents, vec![a]);
    }

    #[test]
    fn test_chain_skips_failed_nodes() {
        let (mut graph, net) = network(Chain);
        let a = graph.add_node(net, NodeKind::agent()).unwrap();
        let b = graph.add_node(net, NodeKind::agent()).unwrap();
        graph.fail(b, None).unwrap();
        let c = graph.add_node(net, NodeKind::agent()).unwrap();
        assert!(graph.is_connected(a, c, NeighborDirection::To).unwrap());
    }

    #[test]
    fn test_delayed_chain_feeds_the_head_from_sources() {
        let (mut graph, net) = network(DelayedChain);
        let source = graph.add_node(net, NodeKind::source()).unwrap();

        let head: Vec<NodeId> = (0..DELAYED_CHAIN_HEAD - 1)
            .map(|_| graph.add_node(net, NodeKind::agent()).unwrap())
            .collect();
        for id in &head {
            let parents = graph
                .neighbors(*id, &NodeType::Any, NeighborDirection::From)
                .unwrap();
            assert_eq!(parents.len(), 1);
            assert_eq!(parents[0].id, source);
        }

        // From here on only the previous arrival feeds the newcomer
        let tail = graph.add_node(net, NodeKind::agent()).unwrap();
        let parents = graph
            .neighbors(tail, &NodeType::Any, NeighborDirection::From)
            .unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id, *head.last().unwrap());
    }

    #[test]
    fn test_delayed_chain_without_sources_leaves_the_head_parentless() {
        let (mut graph, net) = network(DelayedChain);
        for _ in 0..3 {
            graph.add_node(net, NodeKind::agent()).unwrap();
        }
        assert!(graph.vectors(net, FailedFilter::All).unwrap().is_empty());
    }
}
