//! Barabási–Albert preferential attachment
//!
//! The network starts as a fully connected core of `m0` nodes. Every later
//! arrival makes `m` two-way connections, each drawn with probability
//! proportional to the candidate's live out-degree.

use lineage_core::{
    ConnectDirection, Graph, GraphError, GraphResult, NeighborDirection, Network, NetworkId,
    NodeId, Topology, roulette,
};
use rand::RngCore;
use tracing::{debug, warn};

use crate::members::{other_ids, out_degree};

/// Detail keys recorded on the network
pub const M0: &str = "m0";
pub const M: &str = "m";

/// Scale-free wiring with a core of `m0` and `m` links per newcomer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFree {
    m0: usize,
    m: usize,
}

impl ScaleFree {
    pub fn new(m0: usize, m: usize) -> Self {
        Self { m0, m }
    }

    pub fn m0(&self) -> usize {
        self.m0
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Pick one attachment target among nodes not yet linked to `node`
    fn attach_once(
        &self,
        graph: &mut Graph,
        node: NodeId,
        others: &[NodeId],
    ) -> GraphResult<Option<NodeId>> {
        let mut candidates = Vec::new();
        let mut weights = Vec::new();
        for other in others {
            if graph.is_connected(*other, node, NeighborDirection::Either)? {
                continue;
            }
            candidates.push(*other);
            weights.push(out_degree(graph, *other)? as f64);
        }
        if candidates.is_empty() {
            return Ok(None);
        }

        let index = match roulette(&weights, graph.rng_mut()) {
            Ok(index) => index,
            // Nobody has an outgoing edge yet: fall back to a uniform pick
            Err(GraphError::EmptySelection(_)) => {
                let uniform = vec![1.0; candidates.len()];
                roulette(&uniform, graph.rng_mut())?
            }
            Err(err) => return Err(err),
        };
        Ok(Some(candidates[index]))
    }
}

impl Default for ScaleFree {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl Topology for ScaleFree {
    fn kind(&self) -> &str {
        "scale-free"
    }

    fn configure(&self, network: &mut Network, _rng: &mut dyn RngCore) -> GraphResult<()> {
        if self.m == 0 {
            return Err(GraphError::InvalidArgument(
                "scale-free networks need m >= 1".to_string(),
            ));
        }
        network.details.set(M0, self.m0 as u64);
        network.details.set(M, self.m as u64);
        Ok(())
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        let others = other_ids(graph, network, node)?;

        // Core: the newcomer joins everyone while the network is small
        if others.len() < self.m0 {
            debug!(network = %network, node = %node, core = others.len() + 1, "Joining core");
            graph.connect(node, others, ConnectDirection::Both)?;
            return Ok(());
        }

        for round in 0..self.m {
            match self.attach_once(graph, node, &others)? {
                Some(target) => {
                    debug!(node = %node, target = %target, round, "Preferential attachment");
                    graph.connect(node, target, ConnectDirection::Both)?;
                }
                None => {
                    warn!(
                        network = %network,
                        node = %node,
                        made = round,
                        wanted = self.m,
                        "Ran out of attachment candidates"
                    );
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{FailedFilter, GraphConfig, NetworkOptions, NodeKind, NodeType};
    use std::sync::Arc;

    fn network(m0: usize, m: usize, seed: u64) -> (Graph, NetworkId) {
        let mut graph = Graph::new(GraphConfig::seeded(seed));
        let net = graph
            .create_network(Arc::new(ScaleFree::new(m0, m)), NetworkOptions::default())
            .unwrap();
        (graph, net)
    }

    #[test]
    fn test_parameters_are_recorded_on_the_network() {
        let (graph, net) = network(3, 2, 1);
        let details = &graph.network(net).unwrap().details;
        assert_eq!(details.int(M0), Some(3));
        assert_eq!(details.int(M), Some(2));
        assert_eq!(graph.network(net).unwrap().kind, "scale-free");
    }

    #[test]
    fn test_zero_links_per_newcomer_is_rejected() {
        let mut graph = Graph::new(GraphConfig::seeded(1));
        let err = graph
            .create_network(Arc::new(ScaleFree::new(3, 0)), NetworkOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_newcomers_make_m_distinct_links() {
        for seed in 0..10 {
            let (mut graph, net) = network(3, 2, seed);
            for _ in 0..10 {
                let node = graph.add_node(net, NodeKind::agent()).unwrap();
                let n = graph.size(net, &NodeType::Any, FailedFilter::Live).unwrap();
                let links = graph
                    .neighbors(node, &NodeType::Any, NeighborDirection::Both)
                    .unwrap()
                    .len();
                assert_eq!(links, if n <= 3 { n - 1 } else { 2 });
            }
        }
    }

    #[test]
    fn test_attachment_stops_when_candidates_run_out() {
        // m exceeds the number of nodes available to link with
        let (mut graph, net) = network(1, 5, 3);
        graph.add_node(net, NodeKind::agent()).unwrap();
        let second = graph.add_node(net, NodeKind::agent()).unwrap();
        let third = graph.add_node(net, NodeKind::agent()).unwrap();

        assert_eq!(
            graph
                .neighbors(second, &NodeType::Any, NeighborDirection::Both)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            graph
                .neighbors(third, &NodeType::Any, NeighborDirection::Both)
                .unwrap()
                .len(),
            2
        );
    }
}
