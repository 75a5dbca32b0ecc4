//! Node behavior hooks
//!
//! Node kinds are data (a tag plus a [`NodeRole`]); what a kind *does* lives
//! in a [`NodeBehavior`] looked up by tag in the graph's [`BehaviorRegistry`].
//! Experiments register their own tags instead of subclassing.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use rand::{Rng, RngCore};

use crate::entity::{Info, Node, NodeRole, kinds};
use crate::error::{GraphError, GraphResult};
use crate::filter::{NodeType, TypeFilter};
use crate::graph::Graph;
use crate::ids::{InfoId, NodeId};
use crate::node_ops::{ToWhom, What};

/// Hooks that customize a node kind
pub trait NodeBehavior: Send + Sync + Debug {
    /// Contents of a newly created info (sources)
    fn contents(&self, node: &Node, rng: &mut dyn RngCore) -> GraphResult<String> {
        let _ = rng;
        Err(GraphError::MissingHook {
            kind: node.kind.tag.clone(),
            hook: "contents",
        })
    }

    /// Info type tag used by `create_information`
    fn info_kind(&self) -> &str {
        kinds::info::INFO
    }

    /// Contents of a mutated copy of `info`
    fn mutated_contents(&self, info: &Info, rng: &mut dyn RngCore) -> GraphResult<String> {
        let _ = rng;
        Err(GraphError::MissingHook {
            kind: info.kind.clone(),
            hook: "mutated_contents",
        })
    }

    /// React to newly received infos
    fn update(&self, graph: &mut Graph, node: NodeId, infos: &[InfoId]) -> GraphResult<()> {
        let _ = (graph, node, infos);
        Ok(())
    }

    /// What `transmit` sends when not told
    fn default_what(&self, node: &Node) -> What {
        match node.kind.role {
            NodeRole::Source => What::NewInformation,
            NodeRole::Environment => What::CurrentState,
            NodeRole::Plain | NodeRole::Agent => What::Type(TypeFilter::Any),
        }
    }

    /// Where `transmit` sends when not told
    fn default_to_whom(&self, node: &Node) -> ToWhom {
        let _ = node;
        ToWhom::Type(NodeType::Any)
    }

    /// Whether this kind's failure records the cascade reason
    ///
    /// Kinds that return false are failed with no reason.
    fn accepts_failure_reason(&self) -> bool {
        true
    }
}

/// Behavior of plain nodes, agents, generic sources and environments
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

impl NodeBehavior for DefaultBehavior {}

/// Replicates every info it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicatorBehavior;

impl NodeBehavior for ReplicatorBehavior {
    fn update(&self, graph: &mut Graph, node: NodeId, infos: &[InfoId]) -> GraphResult<()> {
        for info in infos {
            graph.replicate(node, *info)?;
        }
        Ok(())
    }
}

/// Source of random two-bit binary strings
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBinaryStringBehavior;

impl NodeBehavior for RandomBinaryStringBehavior {
    fn contents(&self, _node: &Node, rng: &mut dyn RngCore) -> GraphResult<String> {
        Ok((0..2)
            .map(|_| if rng.random_bool(0.5) { '1' } else { '0' })
            .collect())
    }
}

/// Tag to behavior lookup, owned by a graph
#[derive(Debug, Clone)]
pub struct BehaviorRegistry {
    by_tag: HashMap<String, Arc<dyn NodeBehavior>>,
    fallback: Arc<dyn NodeBehavior>,
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl BehaviorRegistry {
    /// Empty registry; every tag resolves to [`DefaultBehavior`]
    pub fn new() -> Self {
        Self {
            by_tag: HashMap::new(),
            fallback: Arc::new(DefaultBehavior),
        }
    }

    /// Registry with the built-in node kinds
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(kinds::node::REPLICATOR_AGENT, ReplicatorBehavior);
        registry.register(
            kinds::node::RANDOM_BINARY_STRING_SOURCE,
            RandomBinaryStringBehavior,
        );
        registry
    }

    /// Register hooks for a tag, replacing any previous registration
    pub fn register(&mut self, tag: impl Into<String>, behavior: impl NodeBehavior + 'static) {
        self.by_tag.insert(tag.into(), Arc::new(behavior));
    }

    pub fn register_arc(&mut self, tag: impl Into<String>, behavior: Arc<dyn NodeBehavior>) {
        self.by_tag.insert(tag.into(), behavior);
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Hooks for a tag
    pub fn resolve(&self, tag: &str) -> Arc<dyn NodeBehavior> {
        self.by_tag
            .get(tag)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}
