//! Split-sample networks
//!
//! Half of all networks are marked exploratory at creation, so that
//! analyses can be developed on one half and confirmed on the other.

use std::sync::Arc;

use lineage_core::{Graph, GraphResult, Network, NetworkId, NodeId, Topology, VectorId};
use rand::{Rng, RngCore};
use tracing::debug;

/// Detail key recorded on the network
pub const EXPLORATORY: &str = "exploratory";

/// Whether a network drew the exploratory half of the sample
pub fn is_exploratory(network: &Network) -> bool {
    network.details.bool(EXPLORATORY).unwrap_or(false)
}

/// Wraps another topology, tagging each network exploratory or not
#[derive(Debug, Clone)]
pub struct SplitSample {
    inner: Arc<dyn Topology>,
}

impl SplitSample {
    pub fn new(inner: Arc<dyn Topology>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn Topology> {
        &self.inner
    }
}

impl Topology for SplitSample {
    fn kind(&self) -> &str {
        "split-sample"
    }

    fn configure(&self, network: &mut Network, rng: &mut dyn RngCore) -> GraphResult<()> {
        let exploratory = rng.random_bool(0.5);
        network.details.set(EXPLORATORY, exploratory);
        network.details.set("wiring", self.inner.kind());
        debug!(exploratory, wiring = self.inner.kind(), "Assigned sample half");
        self.inner.configure(network, rng)
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        self.inner.add_node(graph, network, node)
    }

    fn add_source(
        &self,
        graph: &mut Graph,
        network: NetworkId,
        source: NodeId,
    ) -> GraphResult<Vec<VectorId>> {
        self.inner.add_source(graph, network, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Chain, Empty};
    use lineage_core::{FailedFilter, GraphConfig, NetworkOptions, NodeKind};

    #[test]
    fn test_roughly_half_are_exploratory() {
        let mut graph = Graph::new(GraphConfig::seeded(17));
        let topology: Arc<dyn Topology> = Arc::new(SplitSample::new(Arc::new(Empty)));
        let nets: Vec<NetworkId> = (0..400)
            .map(|_| {
                graph
                    .create_network(Arc::clone(&topology), NetworkOptions::default())
                    .unwrap()
            })
            .collect();
        let exploratory = nets
            .iter()
            .filter(|net| is_exploratory(graph.network(**net).unwrap()))
            .count();
        assert!((140..=260).contains(&exploratory), "{}", exploratory);
    }

    #[test]
    fn test_wiring_is_delegated() {
        let mut graph = Graph::new(GraphConfig::seeded(17));
        let net = graph
            .create_network(
                Arc::new(SplitSample::new(Arc::new(Chain))),
                NetworkOptions::default(),
            )
            .unwrap();
        for _ in 0..3 {
            graph.add_node(net, NodeKind::agent()).unwrap();
        }
        let network = graph.network(net).unwrap();
        assert_eq!(network.kind, "split-sample");
        assert_eq!(network.details.text("wiring"), Some("chain"));
        assert!(network.details.contains(EXPLORATORY));
        assert_eq!(graph.vectors(net, FailedFilter::Live).unwrap().len(), 2);
    }
}
