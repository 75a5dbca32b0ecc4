//! Static wiring policies
//!
//! - Empty: no edges, sources connect on demand
//! - FullyConnected: every node linked with every other
//! - Star: the oldest node linked both ways with everyone
//! - Burst: the oldest node linked one way to everyone

use lineage_core::{
    ConnectDirection, Graph, GraphResult, NetworkId, NodeId, Topology, VectorId,
};
use tracing::{debug, info};

use crate::members::{oldest, others};

/// A network that never wires arrivals
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl Topology for Empty {
    fn kind(&self) -> &str {
        "empty"
    }

    fn add_node(&self, _graph: &mut Graph, _network: NetworkId, _node: NodeId) -> GraphResult<()> {
        Ok(())
    }

    /// Connect `source` to every live non-source node present right now
    fn add_source(
        &self,
        graph: &mut Graph,
        network: NetworkId,
        source: NodeId,
    ) -> GraphResult<Vec<VectorId>> {
        let targets: Vec<NodeId> = others(graph, network, source)?
            .into_iter()
            .filter(|n| !n.is_source())
            .map(|n| n.id)
            .collect();
        info!(network = %network, source = %source, targets = targets.len(), "Wiring source");
        graph.connect(source, targets, ConnectDirection::To)
    }
}

/// A complete graph
///
/// Sources only ever feed the newcomer. A source newcomer feeds every
/// non-source node instead, since nothing may point at it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullyConnected;

impl Topology for FullyConnected {
    fn kind(&self) -> &str {
        "fully-connected"
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        let newcomer_is_source = graph.node(node)?.is_source();
        let existing: Vec<(NodeId, bool)> = others(graph, network, node)?
            .into_iter()
            .map(|n| (n.id, n.is_source()))
            .collect();

        for (other, other_is_source) in existing {
            match (newcomer_is_source, other_is_source) {
                (false, false) => graph.connect(node, other, ConnectDirection::Both)?,
                (false, true) => graph.connect(node, other, ConnectDirection::From)?,
                (true, false) => graph.connect(node, other, ConnectDirection::To)?,
                (true, true) => continue,
            };
        }
        debug!(network = %network, node = %node, "Fully connected newcomer");
        Ok(())
    }
}

/// Hub-and-spoke with two-way spokes
#[derive(Debug, Clone, Copy, Default)]
pub struct Star;

impl Topology for Star {
    fn kind(&self) -> &str {
        "star"
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        if let Some(center) = oldest(graph, network)?.filter(|c| *c != node) {
            graph.connect(center, node, ConnectDirection::Both)?;
        }
        Ok(())
    }
}

/// Hub-and-spoke with outgoing spokes only
#[derive(Debug, Clone, Copy, Default)]
pub struct Burst;

impl Topology for Burst {
    fn kind(&self) -> &str {
        "burst"
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        if let Some(center) = oldest(graph, network)?.filter(|c| *c != node) {
            graph.connect(center, node, ConnectDirection::To)?;
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
        let mut graph = Graph::new(GraphConfig::seeded(7));
        let net = graph
            .create_network(Arc::new(topology), NetworkOptions::default())
            .unwrap();
        (graph, net)
    }

    #[test]
    fn test_empty_never_wires_arrivals() {
        let (mut graph, net) = network(Empty);
        for _ in 0..4 {
            graph.add_node(net, NodeKind::agent()).unwrap();
        }
        assert!(graph.vectors(net, FailedFilter::All).unwrap().is_empty());
    }

    #[test]
    fn test_empty_add_source_feeds_current_agents_only() {
        let (mut graph, net) = network(Empty);
        let a = graph.add_node(net, NodeKind::agent()).unwrap();
        let b = graph.add_node(net, NodeKind::agent()).unwrap();
        let early = graph.add_node(net, NodeKind::source()).unwrap();
        let source = graph.add_node(net, NodeKind::source()).unwrap();

        let vectors = graph.add_source(net, source).unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(graph.is_connected(source, a, NeighborDirection::To).unwrap());
        assert!(graph.is_connected(source, b, NeighborDirection::To).unwrap());
        assert!(!graph.is_connected(source, early, NeighborDirection::Either).unwrap());

        // Later arrivals are not wired automatically
        let c = graph.add_node(net, NodeKind::agent()).unwrap();
        assert!(!graph.is_connected(source, c, NeighborDirection::To).unwrap());
    }

    #[test]
    fn test_fully_connected_with_a_source() {
        let (mut graph, net) = network(FullyConnected);
        let source = graph.add_node(net, NodeKind::source()).unwrap();
        let a = graph.add_node(net, NodeKind::agent()).unwrap();
        let b = graph.add_node(net, NodeKind::agent()).unwrap();

        assert!(graph.is_connected(source, a, NeighborDirection::To).unwrap());
        assert!(!graph.is_connected(a, source, NeighborDirection::To).unwrap());
        assert!(graph.is_connected(a, b, NeighborDirection::Both).unwrap());
        assert_eq!(graph.vectors(net, FailedFilter::Live).unwrap().len(), 4);
    }

    #[test]
    fn test_fully_connected_source_arriving_late() {
        let (mut graph, net) = network(FullyConnected);
        let a = graph.add_node(net, NodeKind::agent()).unwrap();
        let b = graph.add_node(net, NodeKind::agent()).unwrap();
        let source = graph.add_node(net, NodeKind::source()).unwrap();

        assert!(graph.is_connected(source, a, NeighborDirection::To).unwrap());
        assert!(graph.is_connected(source, b, NeighborDirection::To).unwrap());
        assert!(graph
            .neighbors(source, &NodeType::Any, NeighborDirection::From)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_star_and_burst_hang_off_the_oldest_node() {
        let (mut star, star_net) = network(Star);
        let (mut burst, burst_net) = network(Burst);
        let hub = star.add_node(star_net, NodeKind::agent()).unwrap();
        let burst_hub = burst.add_node(burst_net, NodeKind::agent()).unwrap();
        for _ in 0..3 {
            let s = star.add_node(star_net, NodeKind::agent()).unwrap();
            let b = burst.add_node(burst_net, NodeKind::agent()).unwrap();
            assert!(star.is_connected(hub, s, NeighborDirection::Both).unwrap());
            assert!(burst.is_connected(burst_hub, b, NeighborDirection::To).unwrap());
            assert!(!burst.is_connected(b, burst_hub, NeighborDirection::To).unwrap());
        }
        assert_eq!(star.vectors(star_net, FailedFilter::Live).unwrap().len(), 6);
        assert_eq!(burst.vectors(burst_net, FailedFilter::Live).unwrap().len(), 3);
    }

    #[test]
    fn test_star_moves_on_when_the_hub_fails() {
        let (mut graph, net) = network(Star);
        let hub = graph.add_node(net, NodeKind::agent()).unwrap();
        let second = graph.add_node(net, NodeKind::agent()).unwrap();
        graph.fail(hub, None).unwrap();

        let third = graph.add_node(net, NodeKind::agent()).unwrap();
        assert!(graph.is_connected(second, third, NeighborDirection::Both).unwrap());
    }
}
