//! In-memory graph store
//!
//! One table per entity family, keyed by per-table auto-incrementing ids, so
//! iterating a table visits entities in insertion order. All construction
//! goes through the `create_*` methods here, which enforce the construction
//! invariants before anything is stored.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::behavior::{BehaviorRegistry, NodeBehavior};
use crate::clock::{Clock, SystemClock};
use crate::config::GraphConfig;
use crate::details::{Details, FITNESS, Value};
use crate::entity::{
    Entity, Info, Lifecycle, Network, Node, NodeKind, Transformation, Transmission,
    TransmissionStatus, Vector,
};
use crate::error::{GraphError, GraphResult};
use crate::ids::{
    EntityRef, IdCounters, InfoId, NetworkId, NodeId, ParticipantId, QuestionId, TransformationId,
    TransmissionId, VectorId,
};
use crate::participant::{Participant, ParticipantInfo, ParticipantStatus, Question};
use crate::topology::Topology;

/// Options for a new network
#[derive(Debug, Clone)]
pub struct NetworkOptions {
    /// Capacity; the graph's default when None. Topologies may override it.
    pub max_size: Option<usize>,
    pub role: String,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            max_size: None,
            role: "default".to_string(),
        }
    }
}

impl NetworkOptions {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

/// A node about to be created
#[derive(Debug, Clone)]
pub struct NewNode {
    pub kind: NodeKind,
    pub participant: Option<ParticipantId>,
    /// Details present before the topology wires the node
    pub details: Details,
}

impl NewNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            participant: None,
            details: Details::new(),
        }
    }

    pub fn for_participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.set(key, value);
        self
    }

    pub fn with_fitness(self, fitness: f64) -> Self {
        self.with_detail(FITNESS, fitness)
    }
}

impl From<NodeKind> for NewNode {
    fn from(kind: NodeKind) -> Self {
        Self::new(kind)
    }
}

/// The graph of networks, nodes and the information flowing between them
#[derive(Debug, Clone)]
pub struct Graph {
    config: GraphConfig,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    registry: BehaviorRegistry,
    topologies: HashMap<NetworkId, Arc<dyn Topology>>,
    counters: IdCounters,
    pub(crate) networks: BTreeMap<NetworkId, Network>,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) vectors: BTreeMap<VectorId, Vector>,
    pub(crate) infos: BTreeMap<InfoId, Info>,
    pub(crate) transmissions: BTreeMap<TransmissionId, Transmission>,
    pub(crate) transformations: BTreeMap<TransformationId, Transformation>,
    pub(crate) participants: BTreeMap<ParticipantId, Participant>,
    pub(crate) questions: BTreeMap<QuestionId, Question>,
}

/// Extent of every table at one moment, see [`Graph::rollback`]
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    counters: IdCounters,
    rng: StdRng,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl Graph {
    /// Create an empty graph using the system clock and built-in behaviors
    pub fn new(config: GraphConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            clock: Arc::new(SystemClock),
            rng,
            registry: BehaviorRegistry::with_builtins(),
            topologies: HashMap::new(),
            counters: IdCounters::default(),
            networks: BTreeMap::new(),
            nodes: BTreeMap::new(),
            vectors: BTreeMap::new(),
            infos: BTreeMap::new(),
            transmissions: BTreeMap::new(),
            transformations: BTreeMap::new(),
            participants: BTreeMap::new(),
            questions: BTreeMap::new(),
        }
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the behavior registry
    pub fn with_registry(mut self, registry: BehaviorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.registry
    }

    /// The graph's random number generator
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn behavior(&self, node: &Node) -> Arc<dyn NodeBehavior> {
        self.registry.resolve(&node.kind.tag)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn network(&self, id: NetworkId) -> GraphResult<&Network> {
        self.networks.get(&id).ok_or(GraphError::NotFound(id.into()))
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(&id).ok_or(GraphError::NotFound(id.into()))
    }

    pub fn vector(&self, id: VectorId) -> GraphResult<&Vector> {
        self.vectors.get(&id).ok_or(GraphError::NotFound(id.into()))
    }

    pub fn info(&self, id: InfoId) -> GraphResult<&Info> {
        self.infos.get(&id).ok_or(GraphError::NotFound(id.into()))
    }

    pub fn transmission(&self, id: TransmissionId) -> GraphResult<&Transmission> {
        self.transmissions
            .get(&id)
            .ok_or(GraphError::NotFound(id.into()))
    }

    pub fn transformation(&self, id: TransformationId) -> GraphResult<&Transformation> {
        self.transformations
            .get(&id)
            .ok_or(GraphError::NotFound(id.into()))
    }

    pub fn participant(&self, id: ParticipantId) -> GraphResult<&Participant> {
        self.participants
            .get(&id)
            .ok_or(GraphError::NotFound(id.into()))
    }

    pub fn question(&self, id: QuestionId) -> GraphResult<&Question> {
        self.questions.get(&id).ok_or(GraphError::NotFound(id.into()))
    }

    /// Any entity, through its common interface
    pub fn entity(&self, entity: EntityRef) -> GraphResult<&dyn Entity> {
        let found: Option<&dyn Entity> = match entity {
            EntityRef::Network(id) => self.networks.get(&id).map(|e| e as &dyn Entity),
            EntityRef::Node(id) => self.nodes.get(&id).map(|e| e as &dyn Entity),
            EntityRef::Vector(id) => self.vectors.get(&id).map(|e| e as &dyn Entity),
            EntityRef::Info(id) => self.infos.get(&id).map(|e| e as &dyn Entity),
            EntityRef::Transmission(id) => self.transmissions.get(&id).map(|e| e as &dyn Entity),
            EntityRef::Transformation(id) => {
                self.transformations.get(&id).map(|e| e as &dyn Entity)
            }
            EntityRef::Participant(id) => self.participants.get(&id).map(|e| e as &dyn Entity),
            EntityRef::Question(id) => self.questions.get(&id).map(|e| e as &dyn Entity),
        };
        found.ok_or(GraphError::NotFound(entity))
    }

    pub(crate) fn entity_mut(&mut self, entity: EntityRef) -> GraphResult<&mut dyn Entity> {
        let found: Option<&mut dyn Entity> = match entity {
            EntityRef::Network(id) => self.networks.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityRef::Node(id) => self.nodes.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityRef::Vector(id) => self.vectors.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityRef::Info(id) => self.infos.get_mut(&id).map(|e| e as &mut dyn Entity),
            EntityRef::Transmission(id) => {
                self.transmissions.get_mut(&id).map(|e| e as &mut dyn Entity)
            }
            EntityRef::Transformation(id) => {
                self.transformations.get_mut(&id).map(|e| e as &mut dyn Entity)
            }
            EntityRef::Participant(id) => {
                self.participants.get_mut(&id).map(|e| e as &mut dyn Entity)
            }
            EntityRef::Question(id) => self.questions.get_mut(&id).map(|e| e as &mut dyn Entity),
        };
        found.ok_or(GraphError::NotFound(entity))
    }

    /// Details of any entity
    pub fn details(&self, entity: impl Into<EntityRef>) -> GraphResult<&Details> {
        Ok(self.entity(entity.into())?.details())
    }

    /// Mutable details of any entity
    pub fn details_mut(&mut self, entity: impl Into<EntityRef>) -> GraphResult<&mut Details> {
        Ok(self.entity_mut(entity.into())?.details_mut())
    }

    /// Set a node's fitness
    pub fn set_fitness(&mut self, node: NodeId, fitness: f64) -> GraphResult<()> {
        self.details_mut(node)?.set(FITNESS, fitness);
        Ok(())
    }

    /// A node's fitness, which must have been set
    pub fn fitness(&self, node: NodeId) -> GraphResult<f64> {
        self.node(node)?
            .fitness()
            .ok_or_else(|| GraphError::MissingDetail {
                entity: node.into(),
                key: FITNESS.to_string(),
            })
    }

    pub fn topology(&self, network: NetworkId) -> GraphResult<Arc<dyn Topology>> {
        self.topologies
            .get(&network)
            .cloned()
            .ok_or(GraphError::NotFound(network.into()))
    }

    // ------------------------------------------------------------------
    // Networks and participants
    // ------------------------------------------------------------------

    /// Create a network wired by `topology`
    pub fn create_network(
        &mut self,
        topology: Arc<dyn Topology>,
        options: NetworkOptions,
    ) -> GraphResult<NetworkId> {
        let id = NetworkId(self.counters.networks + 1);
        let mut network = Network {
            id,
            kind: topology.kind().to_string(),
            max_size: options.max_size.unwrap_or(self.config.default_max_size),
            full: false,
            role: options.role,
            lifecycle: Lifecycle::new(self.now()),
            details: Details::new(),
        };
        topology.configure(&mut network, &mut self.rng)?;
        network.full = network.max_size == 0;

        IdCounters::bump(&mut self.counters.networks);
        debug!(
            network = %id,
            kind = %network.kind,
            max_size = network.max_size,
            role = %network.role,
            "Created network"
        );
        self.networks.insert(id, network);
        self.topologies.insert(id, topology);
        Ok(id)
    }

    /// Create a participant in the `working` state
    pub fn create_participant(&mut self, info: ParticipantInfo) -> ParticipantId {
        let id = ParticipantId(IdCounters::bump(&mut self.counters.participants));
        let participant = Participant::new(id, info, Lifecycle::new(self.now()));
        debug!(participant = %id, unique_id = %participant.unique_id, "Created participant");
        self.participants.insert(id, participant);
        id
    }

    /// Move a participant to a new status
    pub fn set_participant_status(
        &mut self,
        id: ParticipantId,
        status: ParticipantStatus,
    ) -> GraphResult<()> {
        let now = self.now();
        let participant = self
            .participants
            .get_mut(&id)
            .ok_or(GraphError::NotFound(id.into()))?;
        if !participant.status.can_transition_to(status) {
            return Err(GraphError::IllegalTransition {
                from: participant.status,
                to: status,
            });
        }
        if participant.status == ParticipantStatus::Working {
            participant.end_time = Some(now);
        }
        debug!(participant = %id, from = %participant.status, to = %status, "Participant status");
        participant.status = status;
        Ok(())
    }

    /// Record a participant's answer to a question
    pub fn create_question(
        &mut self,
        participant: ParticipantId,
        number: u32,
        question: impl Into<String>,
        response: impl Into<String>,
    ) -> GraphResult<QuestionId> {
        if self.participant(participant)?.is_failed() {
            return Err(GraphError::ParticipantFailed(participant));
        }
        let id = QuestionId(IdCounters::bump(&mut self.counters.questions));
        let question = Question {
            id,
            participant_id: participant,
            number,
            question: question.into(),
            response: response.into(),
            lifecycle: Lifecycle::new(self.now()),
            details: Details::new(),
        };
        self.questions.insert(id, question);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Create a node without invoking the topology
    pub fn create_node(
        &mut self,
        network: NetworkId,
        node: impl Into<NewNode>,
    ) -> GraphResult<NodeId> {
        let node = node.into();
        let (was_full, failed) = {
            let net = self.network(network)?;
            (net.full, net.is_failed())
        };
        if failed {
            return Err(GraphError::NetworkFailed(network));
        }
        if let Some(pid) = node.participant {
            let participant = self.participant(pid)?;
            if participant.is_failed() {
                return Err(GraphError::ParticipantFailed(pid));
            }
            if !participant.is_working() {
                return Err(GraphError::ParticipantNotWorking {
                    participant: pid,
                    status: participant.status,
                });
            }
        }
        if was_full && self.config.warn_when_full {
            warn!(network = %network, "Adding node to a network that is already full");
        }

        let now = self.now();
        let id = NodeId(IdCounters::bump(&mut self.counters.nodes));
        debug!(node = %id, network = %network, kind = %node.kind.tag, "Created node");
        self.nodes.insert(
            id,
            Node {
                id,
                kind: node.kind,
                network_id: network,
                participant_id: node.participant,
                lifecycle: Lifecycle::new(now),
                details: node.details,
            },
        );
        self.recompute_full(network)?;
        Ok(id)
    }

    /// Create a node and let the network's topology wire it in
    ///
    /// If the topology rejects the node, the node and everything the
    /// topology created for it are removed again.
    pub fn add_node(&mut self, network: NetworkId, node: impl Into<NewNode>) -> GraphResult<NodeId> {
        let topology = self.topology(network)?;
        let checkpoint = self.checkpoint();
        let id = self.create_node(network, node)?;
        if let Err(err) = topology.add_node(self, network, id) {
            warn!(node = %id, network = %network, error = %err, "Topology rejected node");
            self.rollback(checkpoint);
            return Err(err);
        }
        info!(
            node = %id,
            network = %network,
            topology = %topology.kind(),
            "Node joined network"
        );
        Ok(id)
    }

    /// Ask the network's topology to connect a source on demand
    pub fn add_source(&mut self, network: NetworkId, source: NodeId) -> GraphResult<Vec<VectorId>> {
        let node = self.node(source)?;
        if !node.is_source() {
            return Err(GraphError::InvalidArgument(format!(
                "{} is not a source",
                source
            )));
        }
        if node.network_id != network {
            return Err(GraphError::InvalidArgument(format!(
                "{} is not in {}",
                source, network
            )));
        }
        let topology = self.topology(network)?;
        topology.add_source(self, network, source)
    }

    /// Mark the current extent of every table
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            counters: self.counters.clone(),
            rng: self.rng.clone(),
        }
    }

    /// Remove every entity created since `checkpoint` and rewind the rng
    ///
    /// Changes to entities that existed at the checkpoint are not undone;
    /// callers restore those themselves.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        let Checkpoint { counters, rng } = checkpoint;
        let removed = self.nodes.split_off(&NodeId(counters.nodes + 1));
        self.vectors.split_off(&VectorId(counters.vectors + 1));
        self.infos.split_off(&InfoId(counters.infos + 1));
        self.transmissions
            .split_off(&TransmissionId(counters.transmissions + 1));
        self.transformations
            .split_off(&TransformationId(counters.transformations + 1));
        self.participants
            .split_off(&ParticipantId(counters.participants + 1));
        self.questions.split_off(&QuestionId(counters.questions + 1));
        for network in self.networks.split_off(&NetworkId(counters.networks + 1)).keys() {
            self.topologies.remove(network);
        }

        let touched: BTreeSet<NetworkId> = removed.values().map(|n| n.network_id).collect();
        for network in touched {
            // Only fails if the network itself was rolled back
            let _ = self.recompute_full(network);
        }
        debug!(nodes = removed.len(), "Rolled back to checkpoint");
        self.counters = counters;
        self.rng = rng;
    }

    /// Recompute `full` from the live node count
    pub(crate) fn recompute_full(&mut self, network: NetworkId) -> GraphResult<()> {
        let size = self
            .nodes
            .values()
            .filter(|n| n.network_id == network && !n.is_failed())
            .count();
        let net = self
            .networks
            .get_mut(&network)
            .ok_or(GraphError::NotFound(network.into()))?;
        net.full = size >= net.max_size;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Vectors, infos, transmissions, transformations
    // ------------------------------------------------------------------

    /// Create a directed edge between two live nodes of the same network
    pub fn create_vector(&mut self, origin: NodeId, destination: NodeId) -> GraphResult<VectorId> {
        if origin == destination {
            return Err(GraphError::SelfConnection(origin));
        }
        let from = self.node(origin)?;
        let to = self.node(destination)?;
        if from.is_failed() {
            return Err(GraphError::NodeFailed(origin));
        }
        if to.is_failed() {
            return Err(GraphError::NodeFailed(destination));
        }
        if from.network_id != to.network_id {
            return Err(GraphError::NetworkMismatch {
                origin,
                origin_network: from.network_id,
                destination,
                destination_network: to.network_id,
            });
        }
        if to.is_source() {
            return Err(GraphError::SourceDestination(destination));
        }
        let network_id = from.network_id;

        let now = self.now();
        let id = VectorId(IdCounters::bump(&mut self.counters.vectors));
        debug!(vector = %id, origin = %origin, destination = %destination, "Created vector");
        self.vectors.insert(
            id,
            Vector {
                id,
                origin_id: origin,
                destination_id: destination,
                network_id,
                lifecycle: Lifecycle::new(now),
                details: Details::new(),
            },
        );
        Ok(id)
    }

    /// Create an info originated by `origin`
    pub fn create_info(
        &mut self,
        origin: NodeId,
        kind: &str,
        contents: Option<String>,
    ) -> GraphResult<InfoId> {
        let node = self.node(origin)?;
        if node.is_failed() {
            return Err(GraphError::NodeFailed(origin));
        }
        let network_id = node.network_id;

        let now = self.now();
        let id = InfoId(IdCounters::bump(&mut self.counters.infos));
        debug!(info = %id, origin = %origin, kind = %kind, "Created info");
        self.infos.insert(
            id,
            Info {
                id,
                kind: kind.to_string(),
                origin_id: origin,
                network_id,
                contents,
                lifecycle: Lifecycle::new(now),
                details: Details::new(),
            },
        );
        Ok(id)
    }

    /// Set an info's contents; contents can only be written once
    pub fn set_contents(&mut self, info: InfoId, contents: impl Into<String>) -> GraphResult<()> {
        let entry = self
            .infos
            .get_mut(&info)
            .ok_or(GraphError::NotFound(info.into()))?;
        if entry.contents.is_some() {
            return Err(GraphError::ContentsWriteOnce(info));
        }
        entry.contents = Some(contents.into());
        Ok(())
    }

    /// Record `info` sent along `vector`
    pub fn create_transmission(
        &mut self,
        vector: VectorId,
        info: InfoId,
    ) -> GraphResult<TransmissionId> {
        let v = self.vector(vector)?;
        let i = self.info(info)?;
        if v.is_failed() {
            return Err(GraphError::VectorFailed(vector));
        }
        if i.is_failed() {
            return Err(GraphError::InfoFailed(info));
        }
        if i.origin_id != v.origin_id {
            return Err(GraphError::OriginMismatch { info, vector });
        }
        let (origin_id, destination_id, network_id) = (v.origin_id, v.destination_id, v.network_id);

        let now = self.now();
        let id = TransmissionId(IdCounters::bump(&mut self.counters.transmissions));
        debug!(
            transmission = %id,
            info = %info,
            origin = %origin_id,
            destination = %destination_id,
            "Created transmission"
        );
        self.transmissions.insert(
            id,
            Transmission {
                id,
                vector_id: vector,
                info_id: info,
                origin_id,
                destination_id,
                network_id,
                status: TransmissionStatus::Pending,
                receive_time: None,
                lifecycle: Lifecycle::new(now),
                details: Details::new(),
            },
        );
        Ok(id)
    }

    /// Whether `node` originated `info` or has received it
    pub(crate) fn available_at(&self, info: &Info, node: NodeId) -> bool {
        info.origin_id == node
            || self.transmissions.values().any(|t| {
                t.info_id == info.id
                    && t.destination_id == node
                    && t.status == TransmissionStatus::Received
            })
    }

    /// Record that `info_in` was turned into `info_out`
    ///
    /// Both infos must originate at the same node, or `info_in` must have
    /// been received by the node that originated `info_out`.
    pub fn transform(
        &mut self,
        kind: &str,
        info_in: InfoId,
        info_out: InfoId,
    ) -> GraphResult<TransformationId> {
        let input = self.info(info_in)?;
        let output = self.info(info_out)?;
        if input.is_failed() {
            return Err(GraphError::InfoFailed(info_in));
        }
        if output.is_failed() {
            return Err(GraphError::InfoFailed(info_out));
        }
        let node_id = output.origin_id;
        let network_id = output.network_id;
        if !self.available_at(input, node_id) {
            return Err(GraphError::NotSameNode { info_in, info_out });
        }

        let now = self.now();
        let id = TransformationId(IdCounters::bump(&mut self.counters.transformations));
        debug!(
            transformation = %id,
            kind = %kind,
            info_in = %info_in,
            info_out = %info_out,
            "Created transformation"
        );
        self.transformations.insert(
            id,
            Transformation {
                id,
                kind: kind.to_string(),
                info_in_id: info_in,
                info_out_id: info_out,
                node_id,
                network_id,
                lifecycle: Lifecycle::new(now),
                details: Details::new(),
            },
        );
        Ok(id)
    }
}
