//! Query filters
//!
//! Every query over the graph takes typed filters. Each filter also parses
//! from the string form used at the boundary with experiment code, rejecting
//! unknown values with [`GraphError::InvalidArgument`] before any query runs.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::entity::{NodeKind, NodeRole};
use crate::error::GraphError;

/// Tri-state filter on the `failed` flag
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FailedFilter {
    /// Only entities that have not failed (the default everywhere)
    #[default]
    #[display("false")]
    Live,
    /// Only failed entities
    #[display("true")]
    Failed,
    /// Both
    #[display("all")]
    All,
}

impl FailedFilter {
    pub fn matches(&self, failed: bool) -> bool {
        match self {
            FailedFilter::Live => !failed,
            FailedFilter::Failed => failed,
            FailedFilter::All => true,
        }
    }
}

impl From<bool> for FailedFilter {
    fn from(failed: bool) -> Self {
        if failed {
            FailedFilter::Failed
        } else {
            FailedFilter::Live
        }
    }
}

impl FromStr for FailedFilter {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "false" | "False" => Ok(FailedFilter::Live),
            "true" | "True" => Ok(FailedFilter::Failed),
            "all" => Ok(FailedFilter::All),
            other => Err(GraphError::InvalidArgument(format!(
                "{} is not a valid failed filter, must be false, true or all",
                other
            ))),
        }
    }
}

/// Direction of vectors or transmissions relative to a node
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[display("incoming")]
    Incoming,
    #[display("outgoing")]
    Outgoing,
    #[display("all")]
    All,
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Direction::Incoming),
            "outgoing" => Ok(Direction::Outgoing),
            "all" => Ok(Direction::All),
            other => Err(GraphError::InvalidArgument(format!(
                "{} is not a valid direction, must be incoming, outgoing or all",
                other
            ))),
        }
    }
}

/// Connection semantics for `neighbors` and `is_connected`
///
/// Only non-failed vectors count as connections.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeighborDirection {
    /// Along this node's outgoing vectors
    #[display("to")]
    To,
    /// Along this node's incoming vectors
    #[display("from")]
    From,
    /// Union of `to` and `from`
    #[display("either")]
    Either,
    /// Intersection of `to` and `from`
    #[display("both")]
    Both,
}

impl FromStr for NeighborDirection {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to" => Ok(NeighborDirection::To),
            "from" => Ok(NeighborDirection::From),
            "either" => Ok(NeighborDirection::Either),
            "both" => Ok(NeighborDirection::Both),
            other => Err(GraphError::InvalidArgument(format!(
                "{} is not a valid neighbor direction, must be to, from, either or both",
                other
            ))),
        }
    }
}

/// Direction of new vectors created by `connect`
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectDirection {
    /// self -> whom
    #[display("to")]
    To,
    /// whom -> self
    #[display("from")]
    From,
    /// self <-> whom
    #[display("both")]
    Both,
}

impl ConnectDirection {
    pub(crate) fn outgoing(&self) -> bool {
        matches!(self, ConnectDirection::To | ConnectDirection::Both)
    }

    pub(crate) fn incoming(&self) -> bool {
        matches!(self, ConnectDirection::From | ConnectDirection::Both)
    }
}

impl FromStr for ConnectDirection {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to" => Ok(ConnectDirection::To),
            "from" => Ok(ConnectDirection::From),
            "both" => Ok(ConnectDirection::Both),
            other => Err(GraphError::InvalidArgument(format!(
                "{} is not a valid direction for connect, must be to, from or both",
                other
            ))),
        }
    }
}

/// Filter on transmission status
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    #[display("all")]
    All,
    #[display("pending")]
    Pending,
    #[display("received")]
    Received,
}

impl FromStr for StatusFilter {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "received" => Ok(StatusFilter::Received),
            other => Err(GraphError::InvalidArgument(format!(
                "{} is not a valid transmission status, must be pending, received or all",
                other
            ))),
        }
    }
}

/// Which side of a transformation an info sits on
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Relationship {
    /// The info is either `info_in` or `info_out`
    #[default]
    #[display("all")]
    All,
    /// The info is `info_in`
    #[display("parent")]
    Parent,
    /// The info is `info_out`
    #[display("child")]
    Child,
}

impl FromStr for Relationship {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Relationship::All),
            "parent" => Ok(Relationship::Parent),
            "child" => Ok(Relationship::Child),
            other => Err(GraphError::InvalidArgument(format!(
                "{} is not a valid relationship, must be parent, child or all",
                other
            ))),
        }
    }
}

/// Filter on node kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeType {
    /// Any node
    #[default]
    Any,
    /// Nodes with the given capability role
    Role(NodeRole),
    /// Nodes registered under the given type tag
    Tag(String),
}

impl NodeType {
    pub fn matches(&self, kind: &NodeKind) -> bool {
        match self {
            NodeType::Any => true,
            NodeType::Role(role) => kind.role == *role,
            NodeType::Tag(tag) => kind.tag == *tag,
        }
    }
}

impl From<NodeRole> for NodeType {
    fn from(role: NodeRole) -> Self {
        NodeType::Role(role)
    }
}

/// Filter on the type tag of infos and transformations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeFilter {
    #[default]
    Any,
    Tag(String),
}

impl TypeFilter {
    pub fn matches(&self, tag: &str) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Tag(t) => t == tag,
        }
    }
}

impl From<&str> for TypeFilter {
    fn from(tag: &str) -> Self {
        TypeFilter::Tag(tag.to_string())
    }
}
