//! Node operations
//!
//! Connecting, transmitting, receiving and transforming information. These
//! are the only ways a live node changes the graph; a failed node rejects
//! all of them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::entity::{Entity, NodeRole, TransmissionStatus, kinds};
use crate::error::{GraphError, GraphResult};
use crate::filter::{ConnectDirection, Direction, FailedFilter, NeighborDirection, NodeType, StatusFilter, TypeFilter};
use crate::graph::Graph;
use crate::ids::{InfoId, NodeId, TransmissionId, VectorId};

/// Nodes to connect with, possibly nested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Whom {
    Node(NodeId),
    Many(Vec<Whom>),
}

impl Whom {
    /// Depth-first flattening, order preserved
    pub fn flatten(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<NodeId>) {
        match self {
            Whom::Node(id) => out.push(*id),
            Whom::Many(items) => items.iter().for_each(|w| w.flatten_into(out)),
        }
    }
}

impl From<NodeId> for Whom {
    fn from(id: NodeId) -> Self {
        Whom::Node(id)
    }
}

impl From<Vec<NodeId>> for Whom {
    fn from(ids: Vec<NodeId>) -> Self {
        Whom::Many(ids.into_iter().map(Whom::Node).collect())
    }
}

impl From<&[NodeId]> for Whom {
    fn from(ids: &[NodeId]) -> Self {
        Whom::Many(ids.iter().copied().map(Whom::Node).collect())
    }
}

/// What a node transmits
#[derive(Debug, Clone, PartialEq)]
pub enum What {
    /// Whatever the node's behavior selects
    Default,
    /// One specific info
    Info(InfoId),
    /// Every live info of a type originated by the node
    Type(TypeFilter),
    /// A freshly created info (sources)
    NewInformation,
    /// The node's most recent state (environments)
    CurrentState,
    Many(Vec<What>),
}

impl From<InfoId> for What {
    fn from(id: InfoId) -> Self {
        What::Info(id)
    }
}

impl From<Vec<InfoId>> for What {
    fn from(ids: Vec<InfoId>) -> Self {
        What::Many(ids.into_iter().map(What::Info).collect())
    }
}

/// Where a node transmits to
#[derive(Debug, Clone, PartialEq)]
pub enum ToWhom {
    /// Whoever the node's behavior selects
    Default,
    Node(NodeId),
    /// Every live "to" neighbor of a type
    Type(NodeType),
    Many(Vec<ToWhom>),
}

impl From<NodeId> for ToWhom {
    fn from(id: NodeId) -> Self {
        ToWhom::Node(id)
    }
}

impl From<Vec<NodeId>> for ToWhom {
    fn from(ids: Vec<NodeId>) -> Self {
        ToWhom::Many(ids.into_iter().map(ToWhom::Node).collect())
    }
}

impl From<NodeType> for ToWhom {
    fn from(kind: NodeType) -> Self {
        ToWhom::Type(kind)
    }
}

/// Which pending transmissions to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receive {
    /// All of them
    Pending,
    /// One specific transmission, which must be pending for the receiver
    Transmission(TransmissionId),
}

/// Push `id` unless already seen, keeping first-seen order
fn push_unique<T: Ord + Copy>(out: &mut Vec<T>, seen: &mut BTreeSet<T>, id: T) {
    if seen.insert(id) {
        out.push(id);
    }
}

impl Graph {
    fn ensure_live(&self, node: NodeId) -> GraphResult<()> {
        if self.node(node)?.is_failed() {
            return Err(GraphError::NodeFailed(node));
        }
        Ok(())
    }

    /// Connect a node with others
    ///
    /// Pairs that are already connected in the requested direction are
    /// skipped with a warning. Returns the vectors actually created.
    pub fn connect(
        &mut self,
        node: NodeId,
        whom: impl Into<Whom>,
        direction: ConnectDirection,
    ) -> GraphResult<Vec<VectorId>> {
        self.ensure_live(node)?;
        let mut created = Vec::new();

        for other in whom.into().flatten() {
            if direction.outgoing() {
                if self.is_connected(node, other, NeighborDirection::To)? {
                    warn!(from = %node, to = %other, "Already connected, skipping");
                } else {
                    created.push(self.create_vector(node, other)?);
                }
            }
            if direction.incoming() {
                if self.is_connected(node, other, NeighborDirection::From)? {
                    warn!(from = %other, to = %node, "Already connected, skipping");
                } else {
                    created.push(self.create_vector(other, node)?);
                }
            }
        }
        Ok(created)
    }

    /// Transmit infos to other nodes
    ///
    /// Every destination must be reachable over a live outgoing vector, and
    /// every info must be live and originated by `node`; if either check
    /// fails, nothing is transmitted. Returns one transmission per
    /// (info, destination) pair.
    pub fn transmit(
        &mut self,
        node: NodeId,
        what: impl Into<What>,
        to_whom: impl Into<ToWhom>,
    ) -> GraphResult<Vec<TransmissionId>> {
        let (what, to_whom) = (what.into(), to_whom.into());
        let checkpoint = self.checkpoint();
        let result = self.transmit_all(node, &what, &to_whom);
        if result.is_err() {
            // Drops infos created for sources along the way
            self.rollback(checkpoint);
        }
        result
    }

    fn transmit_all(
        &mut self,
        node: NodeId,
        what: &What,
        to_whom: &ToWhom,
    ) -> GraphResult<Vec<TransmissionId>> {
        self.ensure_live(node)?;

        let mut destinations = Vec::new();
        self.resolve_to_whom(node, to_whom, true, &mut destinations, &mut BTreeSet::new())?;
        let mut routes = Vec::with_capacity(destinations.len());
        for destination in &destinations {
            let vector = self
                .live_vector(node, *destination)
                .ok_or(GraphError::NoConnection {
                    from: node,
                    to: *destination,
                })?;
            routes.push(vector);
        }

        let mut infos = Vec::new();
        self.resolve_what(node, what, true, &mut infos, &mut BTreeSet::new())?;
        if let Some(vector) = routes.first() {
            for id in &infos {
                let info = self.info(*id)?;
                if info.is_failed() {
                    return Err(GraphError::InfoFailed(*id));
                }
                if info.origin_id != node {
                    return Err(GraphError::OriginMismatch {
                        info: *id,
                        vector: *vector,
                    });
                }
            }
        }

        let mut created = Vec::with_capacity(infos.len() * routes.len());
        for info in &infos {
            for vector in &routes {
                created.push(self.create_transmission(*vector, *info)?);
            }
        }
        info!(
            node = %node,
            infos = infos.len(),
            destinations = destinations.len(),
            "Transmitted"
        );
        Ok(created)
    }

    fn live_vector(&self, from: NodeId, to: NodeId) -> Option<VectorId> {
        self.vectors
            .values()
            .find(|v| v.origin_id == from && v.destination_id == to && !v.is_failed())
            .map(|v| v.id)
    }

    fn resolve_what(
        &mut self,
        node: NodeId,
        what: &What,
        allow_default: bool,
        out: &mut Vec<InfoId>,
        seen: &mut BTreeSet<InfoId>,
    ) -> GraphResult<()> {
        match what {
            What::Default if allow_default => {
                let default = {
                    let n = self.node(node)?;
                    self.behavior(n).default_what(n)
                };
                self.resolve_what(node, &default, false, out, seen)?;
            }
            What::Default => {
                return Err(GraphError::InvalidArgument(format!(
                    "default selection for {} resolved to itself",
                    node
                )));
            }
            What::Info(id) => {
                self.info(*id)?;
                push_unique(out, seen, *id);
            }
            What::Type(kind) => {
                let ids: Vec<InfoId> = self
                    .node_infos(node, kind, FailedFilter::Live)?
                    .iter()
                    .map(|i| i.id)
                    .collect();
                for id in ids {
                    push_unique(out, seen, id);
                }
            }
            What::NewInformation => {
                let id = self.create_information(node)?;
                push_unique(out, seen, id);
            }
            What::CurrentState => match self.state(node, None)? {
                Some(id) => push_unique(out, seen, id),
                None => debug!(node = %node, "No state to transmit"),
            },
            What::Many(items) => {
                for item in items {
                    self.resolve_what(node, item, allow_default, out, seen)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_to_whom(
        &self,
        node: NodeId,
        to_whom: &ToWhom,
        allow_default: bool,
        out: &mut Vec<NodeId>,
        seen: &mut BTreeSet<NodeId>,
    ) -> GraphResult<()> {
        match to_whom {
            ToWhom::Default if allow_default => {
                let n = self.node(node)?;
                let default = self.behavior(n).default_to_whom(n);
                self.resolve_to_whom(node, &default, false, out, seen)?;
            }
            ToWhom::Default => {
                return Err(GraphError::InvalidArgument(format!(
                    "default destination for {} resolved to itself",
                    node
                )));
            }
            ToWhom::Node(id) => {
                self.node(*id)?;
                push_unique(out, seen, *id);
            }
            ToWhom::Type(kind) => {
                for n in self.neighbors(node, kind, NeighborDirection::To)? {
                    push_unique(out, seen, n.id);
                }
            }
            ToWhom::Many(items) => {
                for item in items {
                    self.resolve_to_whom(node, item, allow_default, out, seen)?;
                }
            }
        }
        Ok(())
    }

    /// Create a new info with contents from the node's behavior
    pub fn create_information(&mut self, node: NodeId) -> GraphResult<InfoId> {
        self.ensure_live(node)?;
        let n = self.node(node)?.clone();
        let behavior = self.behavior(&n);
        let contents = behavior.contents(&n, self.rng_mut())?;
        self.create_info(node, behavior.info_kind(), Some(contents))
    }

    /// Receive pending transmissions and hand their infos to the behavior's
    /// update hook
    ///
    /// If the hook fails, the transmissions stay pending and whatever the
    /// hook created is removed.
    pub fn receive(&mut self, node: NodeId, what: Receive) -> GraphResult<Vec<TransmissionId>> {
        let n = self.node(node)?;
        if n.is_source() {
            return Err(GraphError::SourceCannotReceive(node));
        }
        if n.is_failed() {
            return Err(GraphError::NodeFailed(node));
        }

        let pending: Vec<TransmissionId> = self
            .node_transmissions(node, Direction::Incoming, StatusFilter::Pending, FailedFilter::Live)?
            .iter()
            .map(|t| t.id)
            .collect();
        let selected = match what {
            Receive::Pending => pending,
            Receive::Transmission(id) => {
                self.transmission(id)?;
                if !pending.contains(&id) {
                    return Err(GraphError::NotPending {
                        node,
                        transmission: id,
                    });
                }
                vec![id]
            }
        };

        let checkpoint = self.checkpoint();
        let now = self.now();
        let mut infos = Vec::with_capacity(selected.len());
        for id in &selected {
            if let Some(t) = self.transmissions.get_mut(id) {
                t.status = TransmissionStatus::Received;
                t.receive_time = Some(now);
                infos.push(t.info_id);
            }
        }
        debug!(node = %node, count = selected.len(), "Received transmissions");

        if let Err(err) = self.update(node, &infos) {
            // Undelivered: a later receive hands the same infos to update
            warn!(node = %node, error = %err, "Update failed, transmissions left pending");
            self.rollback(checkpoint);
            for id in &selected {
                if let Some(t) = self.transmissions.get_mut(id) {
                    t.status = TransmissionStatus::Pending;
                    t.receive_time = None;
                }
            }
            return Err(err);
        }
        Ok(selected)
    }

    /// Run the node's update hook on the given infos
    pub fn update(&mut self, node: NodeId, infos: &[InfoId]) -> GraphResult<()> {
        let behavior = self.behavior(self.node(node)?);
        behavior.update(self, node, infos)
    }

    /// Copy an info verbatim into a new info at `node`
    pub fn replicate(&mut self, node: NodeId, info_in: InfoId) -> GraphResult<InfoId> {
        self.ensure_live(node)?;
        let input = self.checked_input(node, info_in)?;
        let out = self.create_info(node, &input.kind, input.contents)?;
        self.transform(kinds::transformation::REPLICATION, info_in, out)?;
        Ok(out)
    }

    /// Create a mutated copy of an info at `node`
    pub fn mutate(&mut self, node: NodeId, info_in: InfoId) -> GraphResult<InfoId> {
        self.ensure_live(node)?;
        let input = self.checked_input(node, info_in)?;
        let behavior = self.behavior(self.node(node)?);
        let contents = behavior.mutated_contents(&input, self.rng_mut())?;
        let out = self.create_info(node, &input.kind, Some(contents))?;
        self.transform(kinds::transformation::MUTATION, info_in, out)?;
        Ok(out)
    }

    /// Validate a transformation input up front so no orphan output is left
    fn checked_input(&self, node: NodeId, info_in: InfoId) -> GraphResult<crate::entity::Info> {
        let input = self.info(info_in)?;
        if input.is_failed() {
            return Err(GraphError::InfoFailed(info_in));
        }
        if !self.available_at(input, node) {
            return Err(GraphError::InvalidArgument(format!(
                "{} has neither created nor received {}",
                node, info_in
            )));
        }
        Ok(input.clone())
    }

    /// Record a new state at an environment
    pub fn create_state(&mut self, node: NodeId, contents: impl Into<String>) -> GraphResult<InfoId> {
        if self.node(node)?.kind.role != NodeRole::Environment {
            return Err(GraphError::Unsupported(format!("{} state", node)));
        }
        self.create_info(node, kinds::info::STATE, Some(contents.into()))
    }

    /// The most recent live state of a node created before `at`, or the
    /// most recent overall when `at` is None
    pub fn state(&self, node: NodeId, at: Option<DateTime<Utc>>) -> GraphResult<Option<InfoId>> {
        let states = self.node_infos(node, &TypeFilter::from(kinds::info::STATE), FailedFilter::Live)?;
        Ok(states
            .into_iter()
            .filter(|s| at.is_none_or(|t| s.creation_time() < t))
            .max_by_key(|s| s.recency())
            .map(|s| s.id))
    }
}
