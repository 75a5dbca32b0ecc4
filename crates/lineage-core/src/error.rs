//! Error types for Lineage graphs

use thiserror::Error;

use crate::ids::{EntityRef, InfoId, NetworkId, NodeId, ParticipantId, TransmissionId, VectorId};
use crate::participant::ParticipantStatus;

/// Errors raised by graph construction, queries and node operations
#[derive(Debug, Error)]
pub enum GraphError {
    // Construction-time invariant violations
    #[error("Cannot create node in {0} as it has failed")]
    NetworkFailed(NetworkId),

    #[error("{0} cannot create a node or question as it has failed")]
    ParticipantFailed(ParticipantId),

    #[error("{participant} cannot create a node as they are not working (status: {status})")]
    ParticipantNotWorking {
        participant: ParticipantId,
        status: ParticipantStatus,
    },

    #[error("{0} has failed")]
    NodeFailed(NodeId),

    #[error("{origin}, in {origin_network}, cannot connect with {destination} as it is in {destination_network}")]
    NetworkMismatch {
        origin: NodeId,
        origin_network: NetworkId,
        destination: NodeId,
        destination_network: NetworkId,
    },

    #[error("{0} cannot connect to itself")]
    SelfConnection(NodeId),

    #[error("Cannot connect to {0} as it is a source")]
    SourceDestination(NodeId),

    #[error("Cannot transmit along {0} as it has failed")]
    VectorFailed(VectorId),

    #[error("{0} has failed")]
    InfoFailed(InfoId),

    #[error("Cannot transmit {info} along {vector} as they do not have the same origin")]
    OriginMismatch { info: InfoId, vector: VectorId },

    #[error("Cannot transform {info_in} into {info_out} as they are not at the same node")]
    NotSameNode { info_in: InfoId, info_out: InfoId },

    #[error("The contents of {0} is write-once")]
    ContentsWriteOnce(InfoId),

    #[error("{0} cannot receive transmissions as it is a source")]
    SourceCannotReceive(NodeId),

    #[error("{node} cannot receive {transmission} as it is not in its pending transmissions")]
    NotPending {
        node: NodeId,
        transmission: TransmissionId,
    },

    #[error("{0} already has nodes, can't add a source")]
    SourceAfterNodes(NetworkId),

    #[error("{0} has no source")]
    MissingSource(NetworkId),

    // Cascade sequencing
    #[error("Cannot fail {0} - it has already failed")]
    AlreadyFailed(EntityRef),

    // Transmission
    #[error("{from} cannot transmit to {to} as it does not have a connection to them")]
    NoConnection { from: NodeId, to: NodeId },

    // Arguments and lookups
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(EntityRef),

    #[error("{kind} does not provide a {hook} hook")]
    MissingHook { kind: String, hook: &'static str },

    #[error("{entity} has no {key} detail")]
    MissingDetail { entity: EntityRef, key: String },

    #[error("Participant cannot move from {from} to {to}")]
    IllegalTransition {
        from: ParticipantStatus,
        to: ParticipantStatus,
    },

    #[error("Nothing to select: {0}")]
    EmptySelection(String),

    #[error("{0} does not support this operation")]
    Unsupported(String),
}

impl GraphError {
    /// Whether this error is a construction-time invariant violation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            GraphError::NetworkFailed(_)
                | GraphError::ParticipantFailed(_)
                | GraphError::ParticipantNotWorking { .. }
                | GraphError::NodeFailed(_)
                | GraphError::NetworkMismatch { .. }
                | GraphError::SelfConnection(_)
                | GraphError::SourceDestination(_)
                | GraphError::VectorFailed(_)
                | GraphError::InfoFailed(_)
                | GraphError::OriginMismatch { .. }
                | GraphError::NotSameNode { .. }
                | GraphError::ContentsWriteOnce(_)
                | GraphError::SourceCannotReceive(_)
                | GraphError::NotPending { .. }
                | GraphError::SourceAfterNodes(_)
        )
    }

    pub fn is_already_failed(&self) -> bool {
        matches!(self, GraphError::AlreadyFailed(_))
    }

    pub fn is_no_connection(&self) -> bool {
        matches!(self, GraphError::NoConnection { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, GraphError::InvalidArgument(_))
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphError::AlreadyFailed(NodeId(4).into());
        assert_eq!(err.to_string(), "Cannot fail Node4 - it has already failed");

        let err = GraphError::NoConnection {
            from: NodeId(1),
            to: NodeId(2),
        };
        assert!(err.to_string().contains("Node1 cannot transmit to Node2"));

        let err = GraphError::NetworkMismatch {
            origin: NodeId(1),
            origin_network: NetworkId(1),
            destination: NodeId(9),
            destination_network: NetworkId(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("Network1"));
        assert!(msg.contains("Network2"));
    }

    #[test]
    fn test_error_classes_are_distinct() {
        let invariant = GraphError::SelfConnection(NodeId(1));
        assert!(invariant.is_invariant_violation());
        assert!(!invariant.is_already_failed());

        let already = GraphError::AlreadyFailed(VectorId(2).into());
        assert!(already.is_already_failed());
        assert!(!already.is_invariant_violation());

        let missing = GraphError::NoConnection {
            from: NodeId(1),
            to: NodeId(2),
        };
        assert!(missing.is_no_connection());
        assert!(!missing.is_invariant_violation());

        let bad = GraphError::InvalidArgument("direction".into());
        assert!(bad.is_invalid_argument());
        assert!(!bad.is_invariant_violation());
    }
}
