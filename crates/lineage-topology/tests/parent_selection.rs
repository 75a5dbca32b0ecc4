//! Statistical checks on fitness-proportional parent choice

use std::sync::Arc;

use lineage_core::{
    Direction, FailedFilter, Graph, GraphConfig, NetworkOptions, NewNode, NodeKind,
};
use lineage_topology::DiscreteGenerational;

const TRIALS: u64 = 3000;

#[test]
fn test_parent_frequency_tracks_fitness_share() {
    let fitness = [1.0, 2.0, 3.0, 4.0];
    let total: f64 = fitness.iter().sum();
    let mut chosen = [0usize; 4];

    for seed in 0..TRIALS {
        let mut graph = Graph::new(GraphConfig::seeded(seed));
        let net = graph
            .create_network(
                Arc::new(DiscreteGenerational::new(2, fitness.len(), false)),
                NetworkOptions::default(),
            )
            .unwrap();
        let parents: Vec<_> = fitness
            .iter()
            .map(|f| {
                graph
                    .add_node(net, NewNode::new(NodeKind::agent()).with_fitness(*f))
                    .unwrap()
            })
            .collect();

        let child = graph.add_node(net, NodeKind::agent()).unwrap();
        let incoming = graph
            .node_vectors(child, Direction::Incoming, FailedFilter::Live)
            .unwrap();
        assert_eq!(incoming.len(), 1);
        let index = parents
            .iter()
            .position(|p| *p == incoming[0].origin_id)
            .unwrap();
        chosen[index] += 1;
    }

    for (i, f) in fitness.iter().enumerate() {
        let expected = f / total;
        let observed = chosen[i] as f64 / TRIALS as f64;
        assert!(
            (observed - expected).abs() < 0.04,
            "parent {} chosen {:.3} of the time, expected {:.3}",
            i,
            observed,
            expected
        );
    }
}

#[test]
fn test_failed_candidates_are_never_chosen() {
    for seed in 0..200 {
        let mut graph = Graph::new(GraphConfig::seeded(seed));
        let net = graph
            .create_network(
                Arc::new(DiscreteGenerational::new(2, 3, false)),
                NetworkOptions::default(),
            )
            .unwrap();
        let parents: Vec<_> = (0..3)
            .map(|_| {
                graph
                    .add_node(net, NewNode::new(NodeKind::agent()).with_fitness(1.0))
                    .unwrap()
            })
            .collect();
        graph.fail(parents[1], None).unwrap();

        // Two live agents remain, so the newcomer still lands in generation 0
        let late = graph
            .add_node(net, NewNode::new(NodeKind::agent()).with_fitness(1.0))
            .unwrap();
        assert_eq!(graph.node(late).unwrap().generation(), Some(0));

        let child = graph.add_node(net, NodeKind::agent()).unwrap();
        let origin = graph
            .node_vectors(child, Direction::Incoming, FailedFilter::Live)
            .unwrap()[0]
            .origin_id;
        assert_ne!(origin, parents[1]);
    }
}
