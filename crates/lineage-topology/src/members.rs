//! Membership lookups shared by the builders
//!
//! Builders decide on ids first and mutate afterwards, so every helper
//! here returns owned ids rather than borrowed nodes.

use lineage_core::{
    Direction, Entity, FailedFilter, Graph, GraphResult, NetworkId, Node, NodeId, NodeType,
};

/// Live nodes of `network` except `node`, oldest first
pub(crate) fn others<'g>(
    graph: &'g Graph,
    network: NetworkId,
    node: NodeId,
) -> GraphResult<Vec<&'g Node>> {
    let mut nodes: Vec<&Node> = graph
        .nodes(network, &NodeType::Any, FailedFilter::Live)?
        .into_iter()
        .filter(|n| n.id != node)
        .collect();
    nodes.sort_by_key(|n| n.recency());
    Ok(nodes)
}

/// Ids of [`others`], oldest first
pub(crate) fn other_ids(graph: &Graph, network: NetworkId, node: NodeId) -> GraphResult<Vec<NodeId>> {
    Ok(others(graph, network, node)?.iter().map(|n| n.id).collect())
}

/// The oldest live node of `network`, counting `node` itself
pub(crate) fn oldest(graph: &Graph, network: NetworkId) -> GraphResult<Option<NodeId>> {
    Ok(graph
        .nodes(network, &NodeType::Any, FailedFilter::Live)?
        .into_iter()
        .min_by_key(|n| n.recency())
        .map(|n| n.id))
}

/// Number of live outgoing vectors of a node
pub(crate) fn out_degree(graph: &Graph, node: NodeId) -> GraphResult<usize> {
    Ok(graph
        .node_vectors(node, Direction::Outgoing, FailedFilter::Live)?
        .len())
}
