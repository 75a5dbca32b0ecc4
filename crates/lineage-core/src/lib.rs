//! # Lineage Core
//!
//! Entity model, failure cascade and node operations for networks through
//! which information is created, transmitted and transformed.
//!
//! A [`Graph`] holds networks of nodes joined by directed vectors. Nodes
//! originate infos, send them along vectors as transmissions, and turn them
//! into new infos through transformations. Nothing is ever deleted: entities
//! are failed, and failure cascades to everything that depends on them.
//!
//! ## Key Types
//!
//! - [`Graph`]: The entity store, with construction, queries and node operations
//! - [`SharedGraph`]: Thread-safe handle serializing node arrival
//! - [`Topology`]: Wiring policy invoked when a node joins a network
//! - [`NodeBehavior`] / [`BehaviorRegistry`]: Per-kind hooks, looked up by tag
//! - [`Details`]: Typed extension map carried by every entity
//! - [`Clock`]: Time abstraction for testability

pub mod behavior;
pub mod cascade;
pub mod clock;
pub mod config;
pub mod details;
pub mod entity;
pub mod error;
pub mod filter;
pub mod graph;
pub mod ids;
pub mod node_ops;
pub mod participant;
pub mod query;
pub mod selection;
pub mod shared;
pub mod topology;

// Re-export main types
pub use behavior::*;
pub use cascade::CascadeSource;
pub use clock::*;
pub use config::*;
pub use details::*;
pub use entity::*;
pub use error::*;
pub use filter::*;
pub use graph::*;
pub use ids::{
    EntityRef, InfoId, NetworkId, NodeId, ParticipantId, QuestionId, TransformationId,
    TransmissionId, VectorId,
};
pub use node_ops::*;
pub use participant::*;
pub use selection::{choose, roulette};
pub use shared::*;
pub use topology::*;
