//! Discrete-step simulation runner
//!
//! Each step optionally adds an agent, runs one iteration of the configured
//! process, then lets every live node with pending transmissions receive
//! them. The whole step is one write transaction on the shared graph.

use lineage_core::{
    Direction, FailedFilter, Graph, GraphError, NetworkId, NetworkOptions, NodeId, NodeKind,
    NodeRole, NodeType, Receive, SharedGraph, StatusFilter,
};
use lineage_logging::{GraphContextData, GraphContextGuard};
use lineage_topology::{TopologyConfig, TopologyConfigError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::processes::{ProcessKind, StepOutcome};

/// Errors from running a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Topology(#[from] TopologyConfigError),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Configuration for the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Process run at every step
    pub process: ProcessKind,
    /// Steps taken by [`Simulation::run`]
    pub max_steps: u64,
    /// Let every live node receive its pending transmissions after each step
    pub receive_after_step: bool,
    /// Add one agent before every step once the network has been seeded
    pub add_agent_before_step: bool,
    /// Tag of the agents added before each step
    pub agent_tag: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            process: ProcessKind::RandomWalk,
            max_steps: 100,
            receive_after_step: true,
            add_agent_before_step: false,
            agent_tag: lineage_core::kinds::node::REPLICATOR_AGENT.to_string(),
        }
    }
}

impl SimConfig {
    /// Sexual Moran process, with a baby added before each step
    pub fn moran_sexual() -> Self {
        Self {
            process: ProcessKind::MoranSexual,
            add_agent_before_step: true,
            ..Self::default()
        }
    }

    pub fn with_process(mut self, process: ProcessKind) -> Self {
        self.process = process;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_receive_after_step(mut self, receive: bool) -> Self {
        self.receive_after_step = receive;
        self
    }

    pub fn with_agent_before_step(mut self, tag: impl Into<String>) -> Self {
        self.add_agent_before_step = true;
        self.agent_tag = tag.into();
        self
    }
}

/// Simulation statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    pub steps: u64,
    pub transmissions_created: u64,
    pub transmissions_received: u64,
    pub nodes_added: u64,
    /// Nodes failed by the process itself, not counting cascades
    pub nodes_failed: u64,
}

/// Outcome of one step, including what happened around the process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub added: Option<NodeId>,
    pub outcome: StepOutcome,
    pub received: usize,
}

/// The simulation state
#[derive(Debug)]
pub struct Simulation {
    graph: SharedGraph,
    network: NetworkId,
    pub config: SimConfig,
    /// Tags every span of this run
    run_id: Uuid,
    pub stats: SimStats,
}

impl Simulation {
    pub fn new(graph: SharedGraph, network: NetworkId, config: SimConfig) -> Self {
        Self {
            graph,
            network,
            config,
            run_id: Uuid::new_v4(),
            stats: SimStats::default(),
        }
    }

    /// Create a network wired by `topology` and simulate on it
    pub fn with_topology(
        graph: SharedGraph,
        topology: &TopologyConfig,
        options: NetworkOptions,
        config: SimConfig,
    ) -> SimResult<Self> {
        let builder = topology.build()?;
        let network = graph.transaction(|g| g.create_network(builder, options))?;
        info!(network = %network, topology = topology.kind(), "Created simulation network");
        Ok(Self::new(graph, network, config))
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run one step
    ///
    /// A failing step is rolled back as a whole and is not counted in the
    /// statistics.
    pub fn step(&mut self) -> SimResult<StepReport> {
        let _context = GraphContextGuard::new(
            GraphContextData::network(self.network).with_run_id(self.run_id),
        );
        let span = info_span!("step", step = self.stats.steps + 1);
        let _entered = span.enter();

        let network = self.network;
        let config = &self.config;
        let report = self.graph.transaction(|graph| -> SimResult<StepReport> {
            let added = if config.add_agent_before_step && seeded(graph, network)? {
                let kind = NodeKind::new(config.agent_tag.clone(), NodeRole::Agent);
                Some(graph.add_node(network, kind)?)
            } else {
                None
            };

            let outcome = config.process.run(graph, network)?;

            let received = if config.receive_after_step {
                receive_pending(graph, network)?
            } else {
                0
            };
            Ok(StepReport {
                added,
                outcome,
                received,
            })
        })?;

        self.stats.steps += 1;
        self.stats.transmissions_created += report.outcome.transmissions.len() as u64;
        self.stats.transmissions_received += report.received as u64;
        self.stats.nodes_added += u64::from(report.added.is_some());
        self.stats.nodes_failed += report.outcome.failed.len() as u64;
        debug!(
            sent = report.outcome.transmissions.len(),
            received = report.received,
            "Step complete"
        );
        Ok(report)
    }

    /// Run `steps` steps, stopping at the first error
    pub fn run_steps(&mut self, steps: u64) -> SimResult<()> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Run the configured number of steps
    pub fn run(&mut self) -> SimResult<()> {
        info!(
            network = %self.network,
            process = ?self.config.process,
            steps = self.config.max_steps,
            "Starting simulation"
        );
        self.run_steps(self.config.max_steps)?;
        info!(summary = %self.summary(), "Simulation finished");
        Ok(())
    }

    /// One-line summary of the network and the statistics so far
    pub fn summary(&self) -> String {
        let description = self
            .graph
            .read()
            .describe_network(self.network)
            .unwrap_or_else(|e| e.to_string());
        format!(
            "{} | steps={} sent={} received={} added={} failed={}",
            description,
            self.stats.steps,
            self.stats.transmissions_created,
            self.stats.transmissions_received,
            self.stats.nodes_added,
            self.stats.nodes_failed
        )
    }
}

/// Whether anything has been transmitted in the network yet
fn seeded(graph: &Graph, network: NetworkId) -> Result<bool, GraphError> {
    Ok(!graph
        .transmissions(network, StatusFilter::All, FailedFilter::Live)?
        .is_empty())
}

/// Every live non-source node receives its pending transmissions
fn receive_pending(graph: &mut Graph, network: NetworkId) -> Result<usize, GraphError> {
    let waiting: Vec<NodeId> = graph
        .nodes(network, &NodeType::Any, FailedFilter::Live)?
        .iter()
        .filter(|n| !n.is_source())
        .map(|n| n.id)
        .collect();

    let mut received = 0;
    for node in waiting {
        let pending = graph
            .node_transmissions(node, Direction::Incoming, StatusFilter::Pending, FailedFilter::Live)?
            .len();
        if pending > 0 {
            received += graph.receive(node, Receive::Pending)?.len();
        }
    }
    Ok(received)
}
