// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph store capability trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MnemoError;
use crate::traits::adapter::BackendAdapter;
use crate::types::{EdgeKind, GraphEdge, GraphNode};

/// Edge traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Out,
    In,
    Both,
}

/// A node reached by a traversal, with the path length from the start node.
#[derive(Debug, Clone)]
pub struct GraphRow {
    pub node: GraphNode,
    /// Hops from the query's start node; 0 for direct lookups.
    pub depth: usize,
}

/// Parameterized structural queries over the graph.
///
/// This is the engine's closed query vocabulary; a concrete backend may
/// translate each variant into its native query language.
#[derive(Debug, Clone)]
pub enum GraphQuery {
    /// All nodes carrying a label.
    NodesByLabel { label: String },
    /// Nodes whose property `key` equals `value`.
    NodesByProperty {
        key: String,
        value: serde_json::Value,
    },
    /// Nodes with any string property containing `needle` (case-insensitive).
    ContentMatch { needle: String },
    /// All nodes reachable from `start` within `max_depth` hops over the
    /// given edge kinds (all kinds when empty).
    Traverse {
        start: String,
        kinds: Vec<EdgeKind>,
        max_depth: usize,
    },
    /// Shortest undirected path between two nodes, up to `max_len` hops.
    ShortestPath {
        from: String,
        to: String,
        max_len: usize,
    },
}

/// Stores typed nodes and directed typed edges and answers traversal queries.
#[async_trait]
pub trait GraphBackend: BackendAdapter {
    /// Create or update a node. When `id` is `None` a fresh id is
    /// generated. Returns the entity id.
    async fn upsert_node(
        &self,
        label: &str,
        id: Option<String>,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError>;

    /// Create or update a directed edge. Fails with
    /// [`MnemoError::EndpointMissing`] when either node is absent.
    async fn upsert_edge(
        &self,
        from: &str,
        to: &str,
        kind: EdgeKind,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError>;

    /// Fetch a node by id.
    async fn get_node(&self, id: &str) -> Result<GraphNode, MnemoError>;

    /// Set the vector cross-link on a node.
    async fn set_vector_link(&self, node_id: &str, vector_id: &str) -> Result<(), MnemoError>;

    /// Remove a node and all incident edges.
    async fn delete_node(&self, id: &str) -> Result<(), MnemoError>;

    /// Nodes reachable from `id` within `max_depth` hops, honoring the
    /// edge kind filter and direction. The start node itself is excluded.
    async fn neighbors(
        &self,
        id: &str,
        kind: Option<EdgeKind>,
        direction: Direction,
        max_depth: usize,
    ) -> Result<Vec<GraphRow>, MnemoError>;

    /// Run a parameterized structural query.
    async fn query(&self, query: GraphQuery) -> Result<Vec<GraphRow>, MnemoError>;

    /// All edges incident to a node.
    async fn edges_of(&self, id: &str) -> Result<Vec<GraphEdge>, MnemoError>;

    /// Number of stored nodes.
    async fn node_count(&self) -> Result<usize, MnemoError>;
}
