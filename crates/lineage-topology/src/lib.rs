//! # Lineage Topology
//!
//! Wiring policies for Lineage networks. Each builder implements
//! [`lineage_core::Topology`] and is invoked once for every node that joins
//! a network.
//!
//! | Builder | Rule |
//! |---|---|
//! | [`Empty`] | No edges; sources connect on demand |
//! | [`Chain`] | Each node is fed by the previous arrival |
//! | [`DelayedChain`] | Sources feed the first arrivals, then a chain |
//! | [`FullyConnected`] | Everyone linked with everyone |
//! | [`Star`] / [`Burst`] | The oldest node linked with every arrival |
//! | [`ScaleFree`] | Barabási–Albert preferential attachment |
//! | [`DiscreteGenerational`] | Fitness-proportional parents one generation back |
//! | [`SequentialMicrosociety`] | A sliding window of recent arrivals |
//! | [`SplitSample`] | Any of the above, tagged exploratory half the time |
//!
//! [`TopologyConfig`] deserializes into any of them.

pub mod basic;
pub mod chain;
pub mod config;
pub mod generational;
mod members;
pub mod microsociety;
pub mod scale_free;
pub mod split_sample;

pub use basic::{Burst, Empty, FullyConnected, Star};
pub use chain::{Chain, DELAYED_CHAIN_HEAD, DelayedChain};
pub use config::{TopologyConfig, TopologyConfigError};
pub use generational::DiscreteGenerational;
pub use microsociety::SequentialMicrosociety;
pub use scale_free::ScaleFree;
pub use split_sample::{EXPLORATORY, SplitSample, is_exploratory};
