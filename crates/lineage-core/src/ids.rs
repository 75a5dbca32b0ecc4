//! Entity identifiers
//!
//! Every entity table has its own auto-incrementing id space. Ids render as
//! `{EntityType}{id}` (`Node3`, `Vector12`), which is also the path segment a
//! failure cascade appends to the reason it hands to dependents.

use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw numeric id
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", stringify!($variant), self.0)
            }
        }

        impl From<$name> for EntityRef {
            fn from(id: $name) -> Self {
                EntityRef::$variant(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Network`](crate::Network)
    NetworkId, Network
);
entity_id!(
    /// Identifier of a [`Node`](crate::Node)
    NodeId, Node
);
entity_id!(
    /// Identifier of a [`Vector`](crate::Vector)
    VectorId, Vector
);
entity_id!(
    /// Identifier of an [`Info`](crate::Info)
    InfoId, Info
);
entity_id!(
    /// Identifier of a [`Transmission`](crate::Transmission)
    TransmissionId, Transmission
);
entity_id!(
    /// Identifier of a [`Transformation`](crate::Transformation)
    TransformationId, Transformation
);
entity_id!(
    /// Identifier of a [`Participant`](crate::Participant)
    ParticipantId, Participant
);
entity_id!(
    /// Identifier of a [`Question`](crate::Question)
    QuestionId, Question
);

/// A reference to any entity in the graph
///
/// Used wherever an operation is generic over entity families: failing,
/// detail access, and error reporting.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    #[display("{_0}")]
    Network(NetworkId),
    #[display("{_0}")]
    Node(NodeId),
    #[display("{_0}")]
    Vector(VectorId),
    #[display("{_0}")]
    Info(InfoId),
    #[display("{_0}")]
    Transmission(TransmissionId),
    #[display("{_0}")]
    Transformation(TransformationId),
    #[display("{_0}")]
    Participant(ParticipantId),
    #[display("{_0}")]
    Question(QuestionId),
}

impl EntityRef {
    /// The entity family name, as used in failure reasons
    pub fn family(&self) -> &'static str {
        match self {
            EntityRef::Network(_) => "Network",
            EntityRef::Node(_) => "Node",
            EntityRef::Vector(_) => "Vector",
            EntityRef::Info(_) => "Info",
            EntityRef::Transmission(_) => "Transmission",
            EntityRef::Transformation(_) => "Transformation",
            EntityRef::Participant(_) => "Participant",
            EntityRef::Question(_) => "Question",
        }
    }
}

/// Per-table id counters
#[derive(Debug, Clone, Default)]
pub(crate) struct IdCounters {
    pub networks: u64,
    pub nodes: u64,
    pub vectors: u64,
    pub infos: u64,
    pub transmissions: u64,
    pub transformations: u64,
    pub participants: u64,
    pub questions: u64,
}

impl IdCounters {
    /// Advance a counter and return the new id (ids start at 1)
    pub fn bump(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }
}
