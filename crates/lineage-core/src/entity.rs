//! Graph entities
//!
//! Entities are never deleted. Termination is recorded on the [`Lifecycle`]
//! through the failure cascade, and all queries filter on it.

use std::fmt;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::details::{Details, FITNESS, GENERATION};
use crate::ids::{
    EntityRef, InfoId, NetworkId, NodeId, ParticipantId, TransformationId, TransmissionId, VectorId,
};

/// Type tags for infos and transformations
pub mod kinds {
    /// Built-in info type tags
    pub mod info {
        pub const INFO: &str = "info";
        pub const GENE: &str = "gene";
        pub const MEME: &str = "meme";
        pub const STATE: &str = "state";
        pub const TRACKING: &str = "tracking";
    }

    /// Built-in transformation type tags
    pub mod transformation {
        pub const TRANSFORMATION: &str = "transformation";
        pub const REPLICATION: &str = "replication";
        pub const MUTATION: &str = "mutation";
        pub const COMPRESSION: &str = "compression";
        pub const RESPONSE: &str = "response";
    }

    /// Built-in node type tags
    pub mod node {
        pub const NODE: &str = "node";
        pub const AGENT: &str = "agent";
        pub const REPLICATOR_AGENT: &str = "replicator_agent";
        pub const SOURCE: &str = "generic_source";
        pub const RANDOM_BINARY_STRING_SOURCE: &str = "random_binary_string_source";
        pub const ENVIRONMENT: &str = "environment";
    }
}

/// Creation and termination bookkeeping shared by every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub creation_time: DateTime<Utc>,
    pub failed: bool,
    pub failed_reason: Option<String>,
    pub time_of_death: Option<DateTime<Utc>>,
}

impl Lifecycle {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            creation_time: now,
            failed: false,
            failed_reason: None,
            time_of_death: None,
        }
    }

    /// Mark failed. Callers check `failed` first; the flag never goes back.
    pub(crate) fn mark_failed(&mut self, reason: Option<String>, now: DateTime<Utc>) {
        self.failed = true;
        self.failed_reason = reason;
        self.time_of_death = Some(now);
    }
}

/// Common access to the lifecycle and details of any entity
pub trait Entity {
    fn entity_ref(&self) -> EntityRef;
    fn lifecycle(&self) -> &Lifecycle;
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;
    fn details(&self) -> &Details;
    fn details_mut(&mut self) -> &mut Details;

    fn is_failed(&self) -> bool {
        self.lifecycle().failed
    }

    fn creation_time(&self) -> DateTime<Utc> {
        self.lifecycle().creation_time
    }

    /// Ordering key for "most recent" decisions: creation time, then id
    fn recency(&self) -> (DateTime<Utc>, EntityRef) {
        (self.lifecycle().creation_time, self.entity_ref())
    }
}

macro_rules! impl_entity {
    ($ty:ty) => {
        impl $crate::entity::Entity for $ty {
            fn entity_ref(&self) -> $crate::ids::EntityRef {
                self.id.into()
            }

            fn lifecycle(&self) -> &$crate::entity::Lifecycle {
                &self.lifecycle
            }

            fn lifecycle_mut(&mut self) -> &mut $crate::entity::Lifecycle {
                &mut self.lifecycle
            }

            fn details(&self) -> &$crate::details::Details {
                &self.details
            }

            fn details_mut(&mut self) -> &mut $crate::details::Details {
                &mut self.details
            }
        }
    };
}

pub(crate) use impl_entity;

/// A container of nodes wired by one topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    /// Tag of the topology that wires this network
    pub kind: String,
    pub max_size: usize,
    /// Live node count has reached `max_size`
    pub full: bool,
    /// Free-form experimental role, e.g. "practice" or "experiment"
    pub role: String,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Network);

/// Structural capability of a node
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    #[display("node")]
    Plain,
    /// Carries a fitness
    #[display("agent")]
    Agent,
    /// Only ever produces information, never receives
    #[display("source")]
    Source,
    /// Holds a rolling history of state infos
    #[display("environment")]
    Environment,
}

/// A node's registered type tag together with its role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKind {
    pub tag: String,
    pub role: NodeRole,
}

impl NodeKind {
    /// A custom kind, resolved to behavior hooks through the registry by `tag`
    pub fn new(tag: impl Into<String>, role: NodeRole) -> Self {
        Self {
            tag: tag.into(),
            role,
        }
    }

    pub fn node() -> Self {
        Self::new(kinds::node::NODE, NodeRole::Plain)
    }

    pub fn agent() -> Self {
        Self::new(kinds::node::AGENT, NodeRole::Agent)
    }

    pub fn replicator_agent() -> Self {
        Self::new(kinds::node::REPLICATOR_AGENT, NodeRole::Agent)
    }

    pub fn source() -> Self {
        Self::new(kinds::node::SOURCE, NodeRole::Source)
    }

    pub fn random_binary_string_source() -> Self {
        Self::new(kinds::node::RANDOM_BINARY_STRING_SOURCE, NodeRole::Source)
    }

    pub fn environment() -> Self {
        Self::new(kinds::node::ENVIRONMENT, NodeRole::Environment)
    }

    pub fn is_source(&self) -> bool {
        self.role == NodeRole::Source
    }
}

/// A graph vertex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub network_id: NetworkId,
    pub participant_id: Option<ParticipantId>,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Node);

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node-{}-{}", self.id.get(), self.kind.tag)
    }
}

impl Node {
    pub fn is_source(&self) -> bool {
        self.kind.is_source()
    }

    /// Fitness detail, if one has been set
    pub fn fitness(&self) -> Option<f64> {
        self.details.float(FITNESS)
    }

    /// Generation detail, if one has been set
    pub fn generation(&self) -> Option<i64> {
        self.details.int(GENERATION)
    }
}

/// A directed edge between two nodes of the same network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    pub id: VectorId,
    pub origin_id: NodeId,
    pub destination_id: NodeId,
    pub network_id: NetworkId,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Vector);

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector-{}-{}", self.origin_id.get(), self.destination_id.get())
    }
}

/// A unit of content originated by one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub id: InfoId,
    /// Info type tag, see [`kinds::info`]
    pub kind: String,
    pub origin_id: NodeId,
    pub network_id: NetworkId,
    /// Write-once
    pub contents: Option<String>,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Info);

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Info-{}-{}", self.id.get(), self.kind)
    }
}

impl Info {
    /// An info is complete once its contents are set
    pub fn is_complete(&self) -> bool {
        self.contents.is_some()
    }
}

/// Delivery state of a transmission
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionStatus {
    #[display("pending")]
    Pending,
    #[display("received")]
    Received,
}

/// A record of an info sent along a vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transmission {
    pub id: TransmissionId,
    pub vector_id: VectorId,
    pub info_id: InfoId,
    pub origin_id: NodeId,
    pub destination_id: NodeId,
    pub network_id: NetworkId,
    pub status: TransmissionStatus,
    /// Set exactly once, on receipt
    pub receive_time: Option<DateTime<Utc>>,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Transmission);

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transmission-{}", self.id.get())
    }
}

/// A record of one info turned into another by a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformation {
    pub id: TransformationId,
    /// Transformation type tag, see [`kinds::transformation`]
    pub kind: String,
    pub info_in_id: InfoId,
    pub info_out_id: InfoId,
    pub node_id: NodeId,
    pub network_id: NetworkId,
    pub lifecycle: Lifecycle,
    pub details: Details,
}

impl_entity!(Transformation);

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transformation-{}-{}", self.id.get(), self.kind)
    }
}
