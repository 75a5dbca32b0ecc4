//! Multi-step process runs over the built-in topologies

use lineage_core::{
    Direction, FailedFilter, Graph, GraphConfig, GraphError, GraphResult, NetworkOptions, NewNode,
    NodeKind, NodeRole, NodeType, SharedGraph, StatusFilter, ToWhom, What, kinds,
};
use lineage_simulation::{
    ProcessKind, SimConfig, Simulation, SimulationError, transmit_by_fitness,
};
use lineage_topology::TopologyConfig;

fn simulation(
    topology: TopologyConfig,
    config: SimConfig,
    seed: u64,
) -> (SharedGraph, Simulation) {
    let graph = SharedGraph::new(Graph::new(GraphConfig::seeded(seed)));
    let sim =
        Simulation::with_topology(graph.clone(), &topology, NetworkOptions::default(), config)
            .unwrap();
    (graph, sim)
}

fn populate(graph: &SharedGraph, sim: &Simulation, agents: usize) {
    graph
        .add_node(sim.network(), NodeKind::random_binary_string_source())
        .unwrap();
    for _ in 0..agents {
        graph
            .add_node(sim.network(), NodeKind::replicator_agent())
            .unwrap();
    }
}

#[test]
fn random_walk_runs_off_the_end_of_a_chain() {
    let (graph, mut sim) = simulation(TopologyConfig::Chain, SimConfig::default(), 11);
    populate(&graph, &sim, 3);

    sim.run_steps(3).unwrap();
    assert_eq!(sim.stats.transmissions_created, 3);
    assert_eq!(sim.stats.transmissions_received, 3);

    // The last agent in the chain points at nobody
    let err = sim.step().unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Graph(GraphError::EmptySelection(_))
    ));
    assert_eq!(sim.stats.steps, 3);
}

#[test]
fn every_agent_on_the_walk_holds_a_copy() {
    let (graph, mut sim) = simulation(TopologyConfig::Chain, SimConfig::default(), 2);
    populate(&graph, &sim, 4);
    sim.run_steps(4).unwrap();

    let g = graph.read();
    let agents = g
        .nodes(sim.network(), &NodeType::Role(NodeRole::Agent), FailedFilter::Live)
        .unwrap();
    assert_eq!(agents.len(), 4);
    for agent in agents {
        let received = g.received_infos(agent.id, &Default::default()).unwrap();
        assert_eq!(received.len(), 1, "{} should have received once", agent);
        let own = g
            .node_infos(agent.id, &kinds::info::INFO.into(), FailedFilter::Live)
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].contents, received[0].contents);
    }
}

#[test]
fn sexual_moran_keeps_the_population_constant() {
    let (graph, mut sim) = simulation(TopologyConfig::FullyConnected, SimConfig::moran_sexual(), 21);
    populate(&graph, &sim, 4);

    sim.run_steps(10).unwrap();
    assert_eq!(sim.stats.nodes_added, 9);
    assert_eq!(sim.stats.nodes_failed, 9);

    let g = graph.read();
    let net = sim.network();
    let agent = NodeType::Role(NodeRole::Agent);
    assert_eq!(g.size(net, &agent, FailedFilter::Live).unwrap(), 4);
    assert_eq!(g.size(net, &agent, FailedFilter::Failed).unwrap(), 9);

    // Nothing is left waiting at a live node
    for node in g.nodes(net, &NodeType::Any, FailedFilter::Live).unwrap() {
        let pending = g
            .node_transmissions(node.id, Direction::Incoming, StatusFilter::Pending, FailedFilter::Live)
            .unwrap();
        assert!(pending.is_empty());
    }
}

#[test]
fn cultural_moran_never_fails_anyone() {
    let config = SimConfig::default()
        .with_process(ProcessKind::MoranCultural)
        .with_max_steps(25);
    let (graph, mut sim) = simulation(TopologyConfig::FullyConnected, config, 8);
    populate(&graph, &sim, 5);

    sim.run().unwrap();
    assert_eq!(sim.stats.steps, 25);
    assert_eq!(sim.stats.nodes_failed, 0);
    // Seeding reaches all five agents, every later step one
    assert_eq!(sim.stats.transmissions_created, 5 + 24);
    assert_eq!(sim.stats.transmissions_received, 5 + 24);
    assert_eq!(
        graph
            .read()
            .size(sim.network(), &NodeType::Any, FailedFilter::Failed)
            .unwrap(),
        0
    );
}

#[test]
fn fitter_senders_transmit_more_often() {
    let graph = SharedGraph::new(Graph::new(GraphConfig::seeded(99)));
    let net = graph
        .transaction(|g| {
            g.create_network(
                TopologyConfig::FullyConnected.build().unwrap(),
                NetworkOptions::default(),
            )
        })
        .unwrap();
    let weak = graph
        .add_node(net, NewNode::new(NodeKind::agent()).with_fitness(1.0))
        .unwrap();
    let strong = graph
        .add_node(net, NewNode::new(NodeKind::agent()).with_fitness(3.0))
        .unwrap();
    let listener = graph.add_node(net, NodeKind::agent()).unwrap();
    graph
        .transaction(|g| -> GraphResult<_> {
            g.create_info(weak, kinds::info::MEME, Some("weak".to_string()))?;
            g.create_info(strong, kinds::info::MEME, Some("strong".to_string()))
        })
        .unwrap();

    let trials = 2000;
    let mut strong_wins = 0;
    for _ in 0..trials {
        let step = graph
            .transaction(|g| transmit_by_fitness(g, &[weak, strong], What::Default, listener))
            .unwrap();
        if step.sender == Some(strong) {
            strong_wins += 1;
        }
    }
    let share = f64::from(strong_wins) / f64::from(trials);
    assert!((share - 0.75).abs() < 0.04, "strong share was {}", share);

    let step = graph
        .transaction(|g| {
            transmit_by_fitness(g, &[weak], What::Default, ToWhom::Node(listener))
        })
        .unwrap();
    assert_eq!(step.sender, Some(weak));
}

#[test]
fn simulation_config_round_trips_through_json() {
    let config = SimConfig::moran_sexual().with_max_steps(7);
    let json = serde_json::to_string(&config).unwrap();
    let parsed: SimConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let topology: TopologyConfig =
        serde_json::from_str(r#"{"type": "split-sample", "inner": {"type": "chain"}}"#).unwrap();
    let (graph, mut sim) = simulation(topology, SimConfig::default(), 4);
    populate(&graph, &sim, 2);
    sim.run_steps(2).unwrap();
    assert_eq!(sim.stats.transmissions_received, 2);
}
