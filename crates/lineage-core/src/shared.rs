//! Thread-safe graph handle
//!
//! Node arrival reads "most recent node" and "how many nodes" before it
//! wires anything, so arrivals into a network must not interleave. A
//! [`SharedGraph`] serializes every mutation behind one write lock while
//! letting queries run concurrently against committed state.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::GraphResult;
use crate::graph::{Graph, NewNode};
use crate::ids::{EntityRef, NetworkId, NodeId};

/// A graph shared between threads
#[derive(Debug, Clone)]
pub struct SharedGraph {
    inner: Arc<RwLock<Graph>>,
}

impl SharedGraph {
    pub fn new(graph: Graph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Shared read access
    pub fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.inner.read()
    }

    /// Exclusive write access, with no rollback
    pub fn write(&self) -> RwLockWriteGuard<'_, Graph> {
        self.inner.write()
    }

    /// Run `f` under the write lock
    ///
    /// If `f` returns an error the graph is restored to the state it had
    /// before `f` ran, so readers never observe a half-applied operation.
    ///
    /// The restore point is a full clone of the graph, taken on every call,
    /// so each transaction costs time and memory linear in the graph size.
    /// `Graph::add_node`, `transmit` and `receive` roll themselves back
    /// without a clone, so they can go through [`SharedGraph::write`].
    pub fn transaction<T, E>(&self, f: impl FnOnce(&mut Graph) -> Result<T, E>) -> Result<T, E> {
        let mut guard = self.inner.write();
        let snapshot = (*guard).clone();
        match f(&mut *guard) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!("Rolling back graph transaction");
                *guard = snapshot;
                Err(err)
            }
        }
    }

    /// Add a node and wire it in under the write lock
    ///
    /// A node the topology rejects is removed before the lock is released.
    pub fn add_node(&self, network: NetworkId, node: impl Into<NewNode>) -> GraphResult<NodeId> {
        self.write().add_node(network, node)
    }

    /// Fail an entity and its dependents as one transaction
    ///
    /// Of two threads failing the same entity, exactly one succeeds and the
    /// other sees [`GraphError::AlreadyFailed`](crate::GraphError::AlreadyFailed).
    pub fn fail(&self, entity: impl Into<EntityRef>, reason: Option<&str>) -> GraphResult<()> {
        let entity = entity.into();
        self.transaction(|graph| graph.fail(entity, reason))
    }
}

impl From<Graph> for SharedGraph {
    fn from(graph: Graph) -> Self {
        Self::new(graph)
    }
}
