//! Propagation processes
//!
//! Each process advances information flow through a network by one
//! iteration. The first iteration of every Moran process and of a random
//! walk is seeded by a randomly chosen source.

use lineage_core::{
    ConnectDirection, Entity, FailedFilter, Graph, GraphError, GraphResult, InfoId,
    NeighborDirection, NetworkId, NodeId, NodeRole, NodeType, StatusFilter, ToWhom,
    TransmissionId, TypeFilter, What, choose, roulette,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What one process iteration did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Node that transmitted, if any
    pub sender: Option<NodeId>,
    pub transmissions: Vec<TransmissionId>,
    /// Nodes failed by the process itself (not by cascade)
    pub failed: Vec<NodeId>,
}

impl StepOutcome {
    fn sent(sender: NodeId, transmissions: Vec<TransmissionId>) -> Self {
        Self {
            sender: Some(sender),
            transmissions,
            failed: Vec::new(),
        }
    }
}

/// Available processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessKind {
    #[default]
    RandomWalk,
    MoranCultural,
    MoranSexual,
    /// Fitness-proportional choice of sender among live agents
    TransmitByFitness,
}

impl ProcessKind {
    /// Run one iteration on `network`
    pub fn run(self, graph: &mut Graph, network: NetworkId) -> GraphResult<StepOutcome> {
        match self {
            ProcessKind::RandomWalk => random_walk(graph, network),
            ProcessKind::MoranCultural => moran_cultural(graph, network),
            ProcessKind::MoranSexual => moran_sexual(graph, network),
            ProcessKind::TransmitByFitness => {
                let agents = ids(graph, network, NodeRole::Agent)?;
                transmit_by_fitness(graph, &agents, What::Default, ToWhom::Default)
            }
        }
    }
}

fn agent() -> NodeType {
    NodeType::Role(NodeRole::Agent)
}

/// Live node ids of a role in `network`
fn ids(graph: &Graph, network: NetworkId, role: NodeRole) -> GraphResult<Vec<NodeId>> {
    Ok(graph
        .nodes(network, &NodeType::Role(role), FailedFilter::Live)?
        .iter()
        .map(|n| n.id)
        .collect())
}

fn has_transmissions(graph: &Graph, network: NetworkId) -> GraphResult<bool> {
    Ok(!graph
        .transmissions(network, StatusFilter::All, FailedFilter::Live)?
        .is_empty())
}

/// Uniform pick among live sources
fn random_source(graph: &mut Graph, network: NetworkId) -> GraphResult<NodeId> {
    let sources = ids(graph, network, NodeRole::Source)?;
    if sources.is_empty() {
        return Err(GraphError::MissingSource(network));
    }
    Ok(*choose(&sources, graph.rng_mut(), "source")?)
}

/// Uniform pick among the live agents `node` points at
fn random_agent_neighbor(
    graph: &mut Graph,
    node: NodeId,
    except: Option<NodeId>,
) -> GraphResult<NodeId> {
    let neighbors: Vec<NodeId> = graph
        .neighbors(node, &agent(), NeighborDirection::To)?
        .iter()
        .map(|n| n.id)
        .filter(|id| Some(*id) != except)
        .collect();
    Ok(*choose(&neighbors, graph.rng_mut(), "agent neighbor")?)
}

/// A source transmits its default selection to its default destinations
fn seed_from_source(graph: &mut Graph, network: NetworkId) -> GraphResult<StepOutcome> {
    let source = random_source(graph, network)?;
    let sent = graph.transmit(source, What::Default, ToWhom::Default)?;
    info!(network = %network, source = %source, count = sent.len(), "Seeded from source");
    Ok(StepOutcome::sent(source, sent))
}

/// Take one step of a random walk
///
/// The walker is the most recent transmission recipient, or a random source
/// before anything has been received. It passes its default selection on
/// to one random agent it points at.
pub fn random_walk(graph: &mut Graph, network: NetworkId) -> GraphResult<StepOutcome> {
    let sender = match graph.latest_transmission_recipient(network)? {
        Some(node) => node,
        None => random_source(graph, network)?,
    };
    let receiver = random_agent_neighbor(graph, sender, None)?;
    debug!(sender = %sender, receiver = %receiver, "Walking");
    let sent = graph.transmit(sender, What::Default, receiver)?;
    Ok(StepOutcome::sent(sender, sent))
}

/// One iteration of the cultural Moran process
///
/// Nobody dies: a random agent passes its newest info to a random agent
/// it points at.
pub fn moran_cultural(graph: &mut Graph, network: NetworkId) -> GraphResult<StepOutcome> {
    if !has_transmissions(graph, network)? {
        return seed_from_source(graph, network);
    }

    let agents = ids(graph, network, NodeRole::Agent)?;
    let replacer = *choose(&agents, graph.rng_mut(), "agent")?;
    let replaced = random_agent_neighbor(graph, replacer, None)?;
    let newest = newest_info(graph, replacer)?;
    info!(replacer = %replacer, replaced = %replaced, info = %newest, "Cultural replacement");
    let sent = graph.transmit(replacer, newest, replaced)?;
    Ok(StepOutcome::sent(replacer, sent))
}

/// One iteration of the sexual Moran process
///
/// The newest agent is a baby that takes the place of a random agent's
/// neighbor: it inherits the neighbor's connections, the neighbor fails,
/// and the replacer transmits to the baby. A baby must be added to the
/// network before each iteration after the first.
pub fn moran_sexual(graph: &mut Graph, network: NetworkId) -> GraphResult<StepOutcome> {
    if !has_transmissions(graph, network)? {
        return seed_from_source(graph, network);
    }

    let baby = graph
        .nodes(network, &agent(), FailedFilter::Live)?
        .into_iter()
        .max_by_key(|n| n.recency())
        .map(|n| n.id)
        .ok_or_else(|| GraphError::EmptySelection("agent".to_string()))?;
    let adults: Vec<NodeId> = ids(graph, network, NodeRole::Agent)?
        .into_iter()
        .filter(|id| *id != baby)
        .collect();
    let replacer = *choose(&adults, graph.rng_mut(), "agent")?;
    let replaced = random_agent_neighbor(graph, replacer, Some(baby))?;

    let outgoing = neighbor_ids(graph, replaced, NeighborDirection::To)?;
    let incoming = neighbor_ids(graph, replaced, NeighborDirection::From)?;
    for node in outgoing.into_iter().filter(|n| *n != baby) {
        graph.connect(baby, node, ConnectDirection::To)?;
    }
    for node in incoming.into_iter().filter(|n| *n != baby) {
        graph.connect(node, baby, ConnectDirection::To)?;
    }

    graph.fail(replaced, None)?;
    info!(replacer = %replacer, replaced = %replaced, baby = %baby, "Sexual replacement");

    let sent = graph.transmit(replacer, What::Default, baby)?;
    Ok(StepOutcome {
        sender: Some(replacer),
        transmissions: sent,
        failed: vec![replaced],
    })
}

/// Choose a sender with probability proportional to fitness and transmit
///
/// Every candidate needs a fitness detail.
pub fn transmit_by_fitness(
    graph: &mut Graph,
    from_whom: &[NodeId],
    what: impl Into<What>,
    to_whom: impl Into<ToWhom>,
) -> GraphResult<StepOutcome> {
    let fitness = from_whom
        .iter()
        .map(|id| graph.fitness(*id))
        .collect::<GraphResult<Vec<f64>>>()?;
    let parent = from_whom[roulette(&fitness, graph.rng_mut())?];
    debug!(parent = %parent, candidates = from_whom.len(), "Selected by fitness");
    let sent = graph.transmit(parent, what, to_whom)?;
    Ok(StepOutcome::sent(parent, sent))
}

fn neighbor_ids(
    graph: &Graph,
    node: NodeId,
    direction: NeighborDirection,
) -> GraphResult<Vec<NodeId>> {
    Ok(graph
        .neighbors(node, &NodeType::Any, direction)?
        .iter()
        .map(|n| n.id)
        .collect())
}

/// Most recently created live info originated by `node`
fn newest_info(graph: &Graph, node: NodeId) -> GraphResult<InfoId> {
    graph
        .node_infos(node, &TypeFilter::Any, FailedFilter::Live)?
        .into_iter()
        .max_by_key(|i| i.recency())
        .map(|i| i.id)
        .ok_or_else(|| GraphError::EmptySelection(format!("info at {}", node)))
}
