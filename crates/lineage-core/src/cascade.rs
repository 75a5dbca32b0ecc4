//! Failure cascade
//!
//! Failing an entity marks it dead and then fails its dependents, family by
//! family. Each family of dependents is queried at the moment it is about to
//! be failed, so an entity reached twice through a diamond (a transmission
//! owned by both a failed vector and a failed node, say) has already dropped
//! out of the live query by the time the second path gets to it.
//!
//! The reason handed to dependents accumulates the path the failure took:
//! `"Boom!->Network1->Node1->Vector1"`.

use derive_more::Display;
use tracing::{debug, trace};

use crate::entity::Entity;
use crate::error::{GraphError, GraphResult};
use crate::filter::{Direction, FailedFilter, NodeType, Relationship, StatusFilter, TypeFilter};
use crate::graph::Graph;
use crate::ids::EntityRef;

/// A family of dependents that fails along with its owner
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum CascadeSource {
    #[display("nodes")]
    NetworkNodes,
    #[display("vectors")]
    NodeVectors,
    #[display("infos")]
    NodeInfos,
    #[display("transmissions")]
    NodeTransmissions,
    #[display("transformations")]
    NodeTransformations,
    #[display("transmissions")]
    VectorTransmissions,
    #[display("transmissions")]
    InfoTransmissions,
    #[display("transformations")]
    InfoTransformations,
    #[display("nodes")]
    ParticipantNodes,
    #[display("questions")]
    ParticipantQuestions,
}

impl EntityRef {
    /// Dependent families, in the order they are failed
    pub fn cascade_sources(&self) -> &'static [CascadeSource] {
        use CascadeSource::*;

        match self {
            EntityRef::Network(_) => &[NetworkNodes],
            EntityRef::Node(_) => &[
                NodeVectors,
                NodeInfos,
                NodeTransmissions,
                NodeTransformations,
            ],
            EntityRef::Vector(_) => &[VectorTransmissions],
            EntityRef::Info(_) => &[InfoTransmissions, InfoTransformations],
            EntityRef::Participant(_) => &[ParticipantNodes, ParticipantQuestions],
            EntityRef::Transmission(_) | EntityRef::Transformation(_) | EntityRef::Question(_) => &[],
        }
    }
}

impl Graph {
    /// Fail an entity and everything that depends on it
    ///
    /// Failing an entity that has already failed is an error. Dependents
    /// that are already dead when the cascade reaches them are skipped.
    pub fn fail(&mut self, entity: impl Into<EntityRef>, reason: Option<&str>) -> GraphResult<()> {
        let entity = entity.into();
        if self.entity(entity)?.is_failed() {
            return Err(GraphError::AlreadyFailed(entity));
        }
        self.fail_live(entity, reason.map(str::to_string))
    }

    fn fail_live(&mut self, entity: EntityRef, reason: Option<String>) -> GraphResult<()> {
        let now = self.now();
        let wrapped = format!("{}->{}", reason.as_deref().unwrap_or(""), entity);
        debug!(entity = %entity, reason = ?reason, "Failing");
        self.entity_mut(entity)?
            .lifecycle_mut()
            .mark_failed(reason, now);

        if let EntityRef::Node(id) = entity {
            let network = self.node(id)?.network_id;
            self.recompute_full(network)?;
        }

        for source in entity.cascade_sources() {
            let dependents = self.live_dependents(entity, *source)?;
            trace!(entity = %entity, source = %source, count = dependents.len(), "Cascading");
            for dependent in dependents {
                if self.entity(dependent)?.is_failed() {
                    continue;
                }
                let reason = match dependent {
                    EntityRef::Node(id) => {
                        let node = self.node(id)?;
                        self.behavior(node)
                            .accepts_failure_reason()
                            .then(|| wrapped.clone())
                    }
                    _ => Some(wrapped.clone()),
                };
                self.fail_live(dependent, reason)?;
            }
        }
        Ok(())
    }

    /// Live members of one dependent family, queried now
    fn live_dependents(&self, entity: EntityRef, source: CascadeSource) -> GraphResult<Vec<EntityRef>> {
        let live = FailedFilter::Live;
        let refs = match (entity, source) {
            (EntityRef::Network(id), CascadeSource::NetworkNodes) => self
                .nodes(id, &NodeType::Any, live)?
                .iter()
                .map(|n| n.entity_ref())
                .collect(),
            (EntityRef::Node(id), CascadeSource::NodeVectors) => self
                .node_vectors(id, Direction::All, live)?
                .iter()
                .map(|v| v.entity_ref())
                .collect(),
            (EntityRef::Node(id), CascadeSource::NodeInfos) => self
                .node_infos(id, &TypeFilter::Any, live)?
                .iter()
                .map(|i| i.entity_ref())
                .collect(),
            (EntityRef::Node(id), CascadeSource::NodeTransmissions) => self
                .node_transmissions(id, Direction::All, StatusFilter::All, live)?
                .iter()
                .map(|t| t.entity_ref())
                .collect(),
            (EntityRef::Node(id), CascadeSource::NodeTransformations) => self
                .node_transformations(id, &TypeFilter::Any, live)?
                .iter()
                .map(|t| t.entity_ref())
                .collect(),
            (EntityRef::Vector(id), CascadeSource::VectorTransmissions) => self
                .vector_transmissions(id, StatusFilter::All, live)?
                .iter()
                .map(|t| t.entity_ref())
                .collect(),
            (EntityRef::Info(id), CascadeSource::InfoTransmissions) => self
                .info_transmissions(id, StatusFilter::All, live)?
                .iter()
                .map(|t| t.entity_ref())
                .collect(),
            (EntityRef::Info(id), CascadeSource::InfoTransformations) => self
                .info_transformations(id, Relationship::All, live)?
                .iter()
                .map(|t| t.entity_ref())
                .collect(),
            (EntityRef::Participant(id), CascadeSource::ParticipantNodes) => self
                .participant_nodes(id, &NodeType::Any, live)?
                .iter()
                .map(|n| n.entity_ref())
                .collect(),
            (EntityRef::Participant(id), CascadeSource::ParticipantQuestions) => self
                .participant_questions(id, live)?
                .iter()
                .map(|q| q.entity_ref())
                .collect(),
            (entity, source) => {
                return Err(GraphError::InvalidArgument(format!(
                    "{} has no {} dependents",
                    entity, source
                )));
            }
        };
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::behavior::{BehaviorRegistry, NodeBehavior};
    use crate::config::GraphConfig;
    use crate::entity::{NodeKind, NodeRole, kinds};
    use crate::graph::NetworkOptions;
    use crate::ids::NetworkId;
    use crate::topology::Unwired;

    fn graph() -> (Graph, NetworkId) {
        let mut graph = Graph::new(GraphConfig::seeded(5));
        let net = graph
            .create_network(Arc::new(Unwired), NetworkOptions::default())
            .unwrap();
        (graph, net)
    }

    fn reason(graph: &Graph, entity: impl Into<EntityRef>) -> Option<String> {
        graph
            .entity(entity.into())
            .unwrap()
            .lifecycle()
            .failed_reason
            .clone()
    }

    #[test]
    fn test_reason_chain() {
        let (mut graph, net) = graph();
        let a = graph.create_node(net, NodeKind::agent()).unwrap();
        let b = graph.create_node(net, NodeKind::agent()).unwrap();
        let v = graph.create_vector(a, b).unwrap();

        graph.fail(net, Some("Boom!")).unwrap();

        assert_eq!(reason(&graph, net).as_deref(), Some("Boom!"));
        assert_eq!(reason(&graph, a).as_deref(), Some("Boom!->Network1"));
        assert_eq!(reason(&graph, v).as_deref(), Some("Boom!->Network1->Node1"));
        assert!(graph.node(b).unwrap().is_failed());
        assert!(graph.network(net).unwrap().lifecycle.time_of_death.is_some());
    }

    #[test]
    fn test_reason_chain_without_reason() {
        let (mut graph, net) = graph();
        let a = graph.create_node(net, NodeKind::agent()).unwrap();
        let info = graph.create_info(a, kinds::info::INFO, None).unwrap();

        graph.fail(a, None).unwrap();
        assert_eq!(reason(&graph, a), None);
        assert_eq!(reason(&graph, info).as_deref(), Some("->Node1"));
    }

    #[test]
    fn test_fail_twice_is_an_error() {
        let (mut graph, net) = graph();
        let a = graph.create_node(net, NodeKind::agent()).unwrap();
        graph.fail(a, None).unwrap();
        let err = graph.fail(a, None).unwrap_err();
        assert!(err.is_already_failed());
    }

    #[test]
    fn test_failing_node_does_not_fail_neighbors() {
        let (mut graph, net) = graph();
        let a = graph.create_node(net, NodeKind::agent()).unwrap();
        let b = graph.create_node(net, NodeKind::agent()).unwrap();
        let v = graph.create_vector(a, b).unwrap();

        graph.fail(a, None).unwrap();
        assert!(graph.vector(v).unwrap().is_failed());
        assert!(!graph.node(b).unwrap().is_failed());
    }

    #[test]
    fn test_diamond_transmission_failed_once() {
        // The transmission hangs off the vector, the info and both nodes
        let (mut graph, net) = graph();
        let a = graph.create_node(net, NodeKind::agent()).unwrap();
        let b = graph.create_node(net, NodeKind::agent()).unwrap();
        let v = graph.create_vector(a, b).unwrap();
        let info = graph.create_info(a, kinds::info::INFO, Some("x".into())).unwrap();
        let t = graph.create_transmission(v, info).unwrap();

        graph.fail(a, Some("gone")).unwrap();

        // Vectors are failed before transmissions, so the vector path wins
        assert_eq!(reason(&graph, t).as_deref(), Some("gone->Node1->Vector1"));
        assert_eq!(reason(&graph, info).as_deref(), Some("gone->Node1"));
    }

    #[test]
    fn test_participant_cascade() {
        let (mut graph, net) = graph();
        let p = graph.create_participant(crate::participant::ParticipantInfo::new("w", "a", "h"));
        let n = graph
            .create_node(net, crate::graph::NewNode::new(NodeKind::agent()).for_participant(p))
            .unwrap();
        let q = graph.create_question(p, 1, "q", "r").unwrap();

        graph.fail(p, None).unwrap();
        assert_eq!(reason(&graph, n).as_deref(), Some("->Participant1"));
        assert_eq!(reason(&graph, q).as_deref(), Some("->Participant1"));
    }

    #[test]
    fn test_full_recomputed_on_failure() {
        let mut graph = Graph::new(GraphConfig::seeded(5));
        let net = graph
            .create_network(Arc::new(Unwired), NetworkOptions::default().with_max_size(1))
            .unwrap();
        let a = graph.create_node(net, NodeKind::agent()).unwrap();
        assert!(graph.network(net).unwrap().full);
        graph.fail(a, None).unwrap();
        assert!(!graph.network(net).unwrap().full);
    }

    #[derive(Debug)]
    struct Silent;

    impl NodeBehavior for Silent {
        fn accepts_failure_reason(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_node_kind_without_reason_support() {
        let mut registry = BehaviorRegistry::with_builtins();
        registry.register("silent", Silent);
        let mut graph = Graph::new(GraphConfig::seeded(5)).with_registry(registry);
        let net = graph
            .create_network(Arc::new(Unwired), NetworkOptions::default())
            .unwrap();
        let n = graph
            .create_node(net, NodeKind::new("silent", NodeRole::Agent))
            .unwrap();
        let info = graph.create_info(n, kinds::info::INFO, None).unwrap();

        graph.fail(net, Some("Boom!")).unwrap();
        assert!(graph.node(n).unwrap().is_failed());
        assert_eq!(reason(&graph, n), None);
        assert_eq!(reason(&graph, info).as_deref(), Some("->Node1"));
    }
}
