//! # Lineage Simulation
//!
//! Propagation processes over Lineage networks, and a runner that steps
//! them.
//!
//! ## Processes
//!
//! | Process | One iteration |
//! |---|---|
//! | Random walk | The latest recipient passes its infos to a random agent it points at |
//! | Cultural Moran | A random agent passes its newest info to a random agent it points at |
//! | Sexual Moran | The newest agent takes over a random neighbor's connections; the neighbor fails |
//! | Transmit by fitness | A fitness-weighted agent transmits to its default destinations |
//!
//! ## Example
//!
//! ```rust,ignore
//! use lineage_core::{Graph, GraphConfig, NetworkOptions, NodeKind, SharedGraph};
//! use lineage_simulation::{ProcessKind, SimConfig, Simulation};
//! use lineage_topology::TopologyConfig;
//!
//! let graph = SharedGraph::new(Graph::new(GraphConfig::seeded(7)));
//! let mut sim = Simulation::with_topology(
//!     graph.clone(),
//!     &TopologyConfig::FullyConnected,
//!     NetworkOptions::default(),
//!     SimConfig::default().with_process(ProcessKind::MoranCultural),
//! )?;
//! graph.add_node(sim.network(), NodeKind::random_binary_string_source())?;
//! for _ in 0..5 {
//!     graph.add_node(sim.network(), NodeKind::replicator_agent())?;
//! }
//! sim.run_steps(20)?;
//! println!("{}", sim.summary());
//! ```

pub mod processes;
pub mod simulation;

pub use processes::{
    ProcessKind, StepOutcome, moran_cultural, moran_sexual, random_walk, transmit_by_fitness,
};
pub use simulation::{SimConfig, SimResult, SimStats, Simulation, SimulationError, StepReport};
