//! Non-overlapping generations
//!
//! Agents are grouped into generations of `generation_size` in arrival
//! order. The first generation is optionally seeded by the oldest source;
//! each later agent picks one parent from the previous generation by
//! fitness-proportional selection, and the parent connects to and
//! transmits to it.

use lineage_core::{
    ConnectDirection, Entity, FailedFilter, GENERATION, Graph, GraphError, GraphResult, Network,
    NetworkId, NodeId, NodeRole, NodeType, Topology, What, roulette,
};
use rand::RngCore;
use tracing::{debug, info};

/// Detail keys recorded on the network
pub const GENERATIONS: &str = "generations";
pub const GENERATION_SIZE: &str = "generation_size";
pub const INITIAL_SOURCE: &str = "initial_source";

/// Generational wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteGenerational {
    generations: usize,
    generation_size: usize,
    initial_source: bool,
}

impl DiscreteGenerational {
    pub fn new(generations: usize, generation_size: usize, initial_source: bool) -> Self {
        Self {
            generations,
            generation_size,
            initial_source,
        }
    }

    pub fn generations(&self) -> usize {
        self.generations
    }

    pub fn generation_size(&self) -> usize {
        self.generation_size
    }

    pub fn initial_source(&self) -> bool {
        self.initial_source
    }

    /// Generation of the `count`th agent, counting from one
    pub fn generation_of(&self, count: usize) -> usize {
        count.saturating_sub(1) / self.generation_size.max(1)
    }

    fn oldest_source(graph: &Graph, network: NetworkId) -> GraphResult<NodeId> {
        graph
            .nodes(network, &NodeType::Role(NodeRole::Source), FailedFilter::Live)?
            .into_iter()
            .min_by_key(|n| n.recency())
            .map(|n| n.id)
            .ok_or(GraphError::MissingSource(network))
    }

    /// Live nodes sharing `tag` in `generation`, with their fitness
    fn previous_generation(
        graph: &Graph,
        network: NetworkId,
        tag: &str,
        generation: i64,
    ) -> GraphResult<(Vec<NodeId>, Vec<f64>)> {
        let mut ids = Vec::new();
        let mut fitness = Vec::new();
        for node in graph.nodes(network, &NodeType::Tag(tag.to_string()), FailedFilter::Live)? {
            if node.generation() != Some(generation) {
                continue;
            }
            ids.push(node.id);
            fitness.push(graph.fitness(node.id)?);
        }
        Ok((ids, fitness))
    }
}

impl Topology for DiscreteGenerational {
    fn kind(&self) -> &str {
        "discrete-generational"
    }

    fn configure(&self, network: &mut Network, _rng: &mut dyn RngCore) -> GraphResult<()> {
        if self.generation_size == 0 {
            return Err(GraphError::InvalidArgument(
                "generation size must be at least 1".to_string(),
            ));
        }
        network.max_size =
            self.generations * self.generation_size + usize::from(self.initial_source);
        network.details.set(GENERATIONS, self.generations as u64);
        network.details.set(GENERATION_SIZE, self.generation_size as u64);
        network.details.set(INITIAL_SOURCE, self.initial_source);
        Ok(())
    }

    fn add_node(&self, graph: &mut Graph, network: NetworkId, node: NodeId) -> GraphResult<()> {
        let (tag, is_source) = {
            let newcomer = graph.node(node)?;
            (newcomer.kind.tag.clone(), newcomer.is_source())
        };
        if is_source {
            return Ok(());
        }

        let agents = graph
            .nodes(network, &NodeType::Any, FailedFilter::Live)?
            .into_iter()
            .filter(|n| !n.is_source())
            .count();
        let generation = self.generation_of(agents) as i64;
        graph.details_mut(node)?.set(GENERATION, generation);

        if generation == 0 {
            if self.initial_source {
                let source = Self::oldest_source(graph, network)?;
                debug!(source = %source, child = %node, "Seeding first generation");
                graph.connect(source, node, ConnectDirection::To)?;
                graph.transmit(source, What::Default, node)?;
            }
            return Ok(());
        }

        let (candidates, fitness) = Self::previous_generation(graph, network, &tag, generation - 1)?;
        let parent = candidates[roulette(&fitness, graph.rng_mut())?];
        info!(
            network = %network,
            parent = %parent,
            child = %node,
            generation,
            "Selected parent"
        );
        graph.connect(parent, node, ConnectDirection::To)?;
        graph.transmit(parent, What::Default, node)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{
        Direction, EntityRef, GraphConfig, NeighborDirection, NetworkOptions, NewNode, NodeKind,
        StatusFilter,
    };
    use std::sync::Arc;

    fn network(topology: DiscreteGenerational) -> (Graph, NetworkId) {
        let mut graph = Graph::new(GraphConfig::seeded(5));
        let net = graph
            .create_network(Arc::new(topology), NetworkOptions::default())
            .unwrap();
        (graph, net)
    }

    fn agent(fitness: f64) -> NewNode {
        NewNode::new(NodeKind::agent()).with_fitness(fitness)
    }

    #[test]
    fn test_capacity_accounts_for_the_source() {
        let (graph, net) = network(DiscreteGenerational::new(3, 4, true));
        let seeded = graph.network(net).unwrap();
        assert_eq!(seeded.max_size, 13);
        assert_eq!(seeded.details.bool(INITIAL_SOURCE), Some(true));
        assert_eq!(seeded.details.int(GENERATION_SIZE), Some(4));

        let (graph, net) = network(DiscreteGenerational::new(3, 4, false));
        assert_eq!(graph.network(net).unwrap().max_size, 12);
    }

    #[test]
    fn test_generations_fill_in_arrival_order() {
        let (mut graph, net) = network(DiscreteGenerational::new(3, 2, false));
        let generations: Vec<Option<i64>> = (0..6)
            .map(|_| {
                let id = graph.add_node(net, agent(1.0)).unwrap();
                graph.node(id).unwrap().generation()
            })
            .collect();
        assert_eq!(
            generations,
            vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]
        );
    }

    #[test]
    fn test_first_generation_hears_from_the_source() {
        let (mut graph, net) = network(DiscreteGenerational::new(2, 2, true));
        let source = graph
            .add_node(net, NodeKind::random_binary_string_source())
            .unwrap();
        let a = graph.add_node(net, agent(1.0)).unwrap();
        assert!(graph.is_connected(source, a, NeighborDirection::To).unwrap());

        let pending = graph
            .node_transmissions(a, Direction::Incoming, StatusFilter::Pending, FailedFilter::Live)
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].origin_id, source);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let (mut graph, net) = network(DiscreteGenerational::new(2, 2, true));
        let err = graph.add_node(net, agent(1.0)).unwrap_err();
        assert!(matches!(err, GraphError::MissingSource(id) if id == net));
    }

    #[test]
    fn test_later_generations_pick_a_fit_parent() {
        let (mut graph, net) = network(DiscreteGenerational::new(2, 2, false));
        let unfit = graph.add_node(net, agent(0.0)).unwrap();
        let fit = graph.add_node(net, agent(2.0)).unwrap();
        for _ in 0..2 {
            let child = graph.add_node(net, agent(1.0)).unwrap();
            assert!(graph.is_connected(fit, child, NeighborDirection::To).unwrap());
            assert!(!graph.is_connected(unfit, child, NeighborDirection::Either).unwrap());
        }
    }

    #[test]
    fn test_parents_without_fitness_are_reported() {
        let (mut graph, net) = network(DiscreteGenerational::new(2, 1, false));
        let parent = graph.add_node(net, NodeKind::agent()).unwrap();
        let err = graph.add_node(net, agent(1.0)).unwrap_err();
        assert!(matches!(err, GraphError::MissingDetail { entity, .. } if entity == EntityRef::from(parent)));
    }
}
