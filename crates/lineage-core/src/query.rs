//! Read-only queries over the graph
//!
//! Results come back in id order, which is creation order. Callers that need
//! "most recent" semantics sort by [`Entity::recency`].

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::trace;

use crate::entity::{Entity, Info, Node, Transformation, Transmission, TransmissionStatus, Vector};
use crate::error::GraphResult;
use crate::filter::{
    Direction, FailedFilter, NeighborDirection, NodeType, Relationship, StatusFilter, TypeFilter,
};
use crate::graph::Graph;
use crate::ids::{InfoId, NetworkId, NodeId, ParticipantId, VectorId};
use crate::participant::Question;

impl StatusFilter {
    fn matches(&self, status: TransmissionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == TransmissionStatus::Pending,
            StatusFilter::Received => status == TransmissionStatus::Received,
        }
    }
}

impl Graph {
    // ------------------------------------------------------------------
    // Network queries
    // ------------------------------------------------------------------

    /// Nodes in a network
    pub fn nodes(
        &self,
        network: NetworkId,
        kind: &NodeType,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Node>> {
        self.network(network)?;
        Ok(self
            .nodes
            .values()
            .filter(|n| n.network_id == network)
            .filter(|n| kind.matches(&n.kind) && failed.matches(n.is_failed()))
            .collect())
    }

    /// Nodes in a network that belong to one participant
    pub fn nodes_for_participant(
        &self,
        network: NetworkId,
        participant: ParticipantId,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Node>> {
        Ok(self
            .nodes(network, &NodeType::Any, failed)?
            .into_iter()
            .filter(|n| n.participant_id == Some(participant))
            .collect())
    }

    /// Number of nodes in a network
    pub fn size(&self, network: NetworkId, kind: &NodeType, failed: FailedFilter) -> GraphResult<usize> {
        Ok(self.nodes(network, kind, failed)?.len())
    }

    /// Vectors in a network
    pub fn vectors(&self, network: NetworkId, failed: FailedFilter) -> GraphResult<Vec<&Vector>> {
        self.network(network)?;
        Ok(self
            .vectors
            .values()
            .filter(|v| v.network_id == network && failed.matches(v.is_failed()))
            .collect())
    }

    /// Infos in a network
    pub fn infos(
        &self,
        network: NetworkId,
        kind: &TypeFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Info>> {
        self.network(network)?;
        Ok(self
            .infos
            .values()
            .filter(|i| i.network_id == network)
            .filter(|i| kind.matches(&i.kind) && failed.matches(i.is_failed()))
            .collect())
    }

    /// Transmissions in a network
    pub fn transmissions(
        &self,
        network: NetworkId,
        status: StatusFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transmission>> {
        self.network(network)?;
        Ok(self
            .transmissions
            .values()
            .filter(|t| t.network_id == network)
            .filter(|t| status.matches(t.status) && failed.matches(t.is_failed()))
            .collect())
    }

    /// Transformations in a network
    pub fn transformations(
        &self,
        network: NetworkId,
        kind: &TypeFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transformation>> {
        self.network(network)?;
        Ok(self
            .transformations
            .values()
            .filter(|t| t.network_id == network)
            .filter(|t| kind.matches(&t.kind) && failed.matches(t.is_failed()))
            .collect())
    }

    /// Destination of the most recently received live transmission
    pub fn latest_transmission_recipient(&self, network: NetworkId) -> GraphResult<Option<NodeId>> {
        let latest = self
            .transmissions(network, StatusFilter::Received, FailedFilter::Live)?
            .into_iter()
            .max_by_key(|t| (t.receive_time, t.id));
        Ok(latest.map(|t| t.destination_id))
    }

    /// One-line summary of a network's live contents
    pub fn describe_network(&self, network: NetworkId) -> GraphResult<String> {
        let net = self.network(network)?;
        Ok(format!(
            "<Network-{}-{} with {} nodes, {} vectors, {} infos, {} transmissions and {} transformations>",
            net.id.get(),
            net.kind,
            self.size(network, &NodeType::Any, FailedFilter::Live)?,
            self.vectors(network, FailedFilter::Live)?.len(),
            self.infos(network, &TypeFilter::Any, FailedFilter::Live)?.len(),
            self.transmissions(network, StatusFilter::All, FailedFilter::Live)?.len(),
            self.transformations(network, &TypeFilter::Any, FailedFilter::Live)?.len(),
        ))
    }

    /// Listing of every entity in a network, failed ones included
    pub fn network_listing(&self, network: NetworkId) -> GraphResult<String> {
        let mut out = String::new();
        let all = FailedFilter::All;

        let _ = writeln!(out, "Nodes: ");
        for n in self.nodes(network, &NodeType::Any, all)? {
            let _ = writeln!(out, "{}", n);
        }
        let _ = writeln!(out, "\nVectors: ");
        for v in self.vectors(network, all)? {
            let _ = writeln!(out, "{}", v);
        }
        let _ = writeln!(out, "\nInfos: ");
        for i in self.infos(network, &TypeFilter::Any, all)? {
            let _ = writeln!(out, "{}", i);
        }
        let _ = writeln!(out, "\nTransmissions: ");
        for t in self.transmissions(network, StatusFilter::All, all)? {
            let _ = writeln!(out, "{}", t);
        }
        let _ = writeln!(out, "\nTransformations: ");
        for t in self.transformations(network, &TypeFilter::Any, all)? {
            let _ = writeln!(out, "{}", t);
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Node queries
    // ------------------------------------------------------------------

    /// Vectors incident to a node
    pub fn node_vectors(
        &self,
        node: NodeId,
        direction: Direction,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Vector>> {
        self.node(node)?;
        Ok(self
            .vectors
            .values()
            .filter(|v| match direction {
                Direction::Outgoing => v.origin_id == node,
                Direction::Incoming => v.destination_id == node,
                Direction::All => v.origin_id == node || v.destination_id == node,
            })
            .filter(|v| failed.matches(v.is_failed()))
            .collect())
    }

    fn neighbor_ids(&self, node: NodeId, direction: NeighborDirection) -> BTreeSet<NodeId> {
        let live = self.vectors.values().filter(|v| !v.is_failed());
        let to = || {
            live.clone()
                .filter(|v| v.origin_id == node)
                .map(|v| v.destination_id)
                .collect::<BTreeSet<_>>()
        };
        let from = || {
            live.clone()
                .filter(|v| v.destination_id == node)
                .map(|v| v.origin_id)
                .collect::<BTreeSet<_>>()
        };
        match direction {
            NeighborDirection::To => to(),
            NeighborDirection::From => from(),
            NeighborDirection::Either => to().union(&from()).copied().collect(),
            NeighborDirection::Both => to().intersection(&from()).copied().collect(),
        }
    }

    /// Live nodes connected to `node` over live vectors
    ///
    /// There is deliberately no failed filter: a connection only exists over
    /// live vectors. Query vectors directly for anything else.
    pub fn neighbors(
        &self,
        node: NodeId,
        kind: &NodeType,
        direction: NeighborDirection,
    ) -> GraphResult<Vec<&Node>> {
        self.node(node)?;
        let ids = self.neighbor_ids(node, direction);
        trace!(node = %node, direction = %direction, count = ids.len(), "neighbors");
        Ok(ids
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .filter(|n| !n.is_failed() && kind.matches(&n.kind))
            .collect())
    }

    /// Whether `node` is connected to `whom` in the given direction
    pub fn is_connected(
        &self,
        node: NodeId,
        whom: NodeId,
        direction: NeighborDirection,
    ) -> GraphResult<bool> {
        self.node(node)?;
        self.node(whom)?;
        Ok(self.neighbor_ids(node, direction).contains(&whom))
    }

    /// [`Graph::is_connected`] for several nodes at once
    pub fn is_connected_many(
        &self,
        node: NodeId,
        whom: &[NodeId],
        direction: NeighborDirection,
    ) -> GraphResult<Vec<bool>> {
        self.node(node)?;
        let ids = self.neighbor_ids(node, direction);
        whom.iter()
            .map(|w| -> GraphResult<bool> {
                self.node(*w)?;
                Ok(ids.contains(w))
            })
            .collect()
    }

    /// Infos originated by a node
    pub fn node_infos(
        &self,
        node: NodeId,
        kind: &TypeFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Info>> {
        self.node(node)?;
        Ok(self
            .infos
            .values()
            .filter(|i| i.origin_id == node)
            .filter(|i| kind.matches(&i.kind) && failed.matches(i.is_failed()))
            .collect())
    }

    /// Infos delivered to a node by live, received transmissions
    ///
    /// Like [`Graph::neighbors`], this has no failed filter.
    pub fn received_infos(&self, node: NodeId, kind: &TypeFilter) -> GraphResult<Vec<&Info>> {
        self.node(node)?;
        let ids: BTreeSet<InfoId> = self
            .transmissions
            .values()
            .filter(|t| {
                t.destination_id == node
                    && t.status == TransmissionStatus::Received
                    && !t.is_failed()
            })
            .map(|t| t.info_id)
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.infos.get(&id))
            .filter(|i| kind.matches(&i.kind))
            .collect())
    }

    /// Transmissions sent from or to a node
    pub fn node_transmissions(
        &self,
        node: NodeId,
        direction: Direction,
        status: StatusFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transmission>> {
        self.node(node)?;
        Ok(self
            .transmissions
            .values()
            .filter(|t| match direction {
                Direction::Outgoing => t.origin_id == node,
                Direction::Incoming => t.destination_id == node,
                Direction::All => t.origin_id == node || t.destination_id == node,
            })
            .filter(|t| status.matches(t.status) && failed.matches(t.is_failed()))
            .collect())
    }

    /// Transformations performed by a node
    pub fn node_transformations(
        &self,
        node: NodeId,
        kind: &TypeFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transformation>> {
        self.node(node)?;
        Ok(self
            .transformations
            .values()
            .filter(|t| t.node_id == node)
            .filter(|t| kind.matches(&t.kind) && failed.matches(t.is_failed()))
            .collect())
    }

    // ------------------------------------------------------------------
    // Vector and info queries
    // ------------------------------------------------------------------

    /// Transmissions sent along a vector
    pub fn vector_transmissions(
        &self,
        vector: VectorId,
        status: StatusFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transmission>> {
        self.vector(vector)?;
        Ok(self
            .transmissions
            .values()
            .filter(|t| t.vector_id == vector)
            .filter(|t| status.matches(t.status) && failed.matches(t.is_failed()))
            .collect())
    }

    /// Transmissions of an info
    pub fn info_transmissions(
        &self,
        info: InfoId,
        status: StatusFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transmission>> {
        self.info(info)?;
        Ok(self
            .transmissions
            .values()
            .filter(|t| t.info_id == info)
            .filter(|t| status.matches(t.status) && failed.matches(t.is_failed()))
            .collect())
    }

    /// Transformations an info took part in
    pub fn info_transformations(
        &self,
        info: InfoId,
        relationship: Relationship,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Transformation>> {
        self.info(info)?;
        Ok(self
            .transformations
            .values()
            .filter(|t| match relationship {
                Relationship::Parent => t.info_in_id == info,
                Relationship::Child => t.info_out_id == info,
                Relationship::All => t.info_in_id == info || t.info_out_id == info,
            })
            .filter(|t| failed.matches(t.is_failed()))
            .collect())
    }

    // ------------------------------------------------------------------
    // Participant queries
    // ------------------------------------------------------------------

    /// Nodes created for a participant, across networks
    pub fn participant_nodes(
        &self,
        participant: ParticipantId,
        kind: &NodeType,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Node>> {
        self.participant(participant)?;
        Ok(self
            .nodes
            .values()
            .filter(|n| n.participant_id == Some(participant))
            .filter(|n| kind.matches(&n.kind) && failed.matches(n.is_failed()))
            .collect())
    }

    /// A participant's questionnaire answers
    pub fn participant_questions(
        &self,
        participant: ParticipantId,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Question>> {
        self.participant(participant)?;
        Ok(self
            .questions
            .values()
            .filter(|q| q.participant_id == participant && failed.matches(q.is_failed()))
            .collect())
    }

    /// Infos originated by any of a participant's nodes
    pub fn participant_infos(
        &self,
        participant: ParticipantId,
        kind: &TypeFilter,
        failed: FailedFilter,
    ) -> GraphResult<Vec<&Info>> {
        let nodes: BTreeSet<NodeId> = self
            .participant_nodes(participant, &NodeType::Any, FailedFilter::All)?
            .into_iter()
            .map(|n| n.id)
            .collect();
        Ok(self
            .infos
            .values()
            .filter(|i| nodes.contains(&i.origin_id))
            .filter(|i| kind.matches(&i.kind) && failed.matches(i.is_failed()))
            .collect())
    }
}
