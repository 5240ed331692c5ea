// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory property graph with typed nodes and directed typed edges.
//!
//! Traversals are breadth-first and bounded; an external graph database
//! can replace this behind the same trait.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{BackendAdapter, Direction, GraphBackend, GraphQuery, GraphRow};
use mnemo_core::types::{EdgeKind, GraphEdge, GraphNode, HealthStatus};

#[derive(Default)]
struct GraphState {
    nodes: HashMap<String, GraphNode>,
    edges: HashMap<String, GraphEdge>,
    /// node id -> outgoing edge ids
    out_adj: HashMap<String, Vec<String>>,
    /// node id -> incoming edge ids
    in_adj: HashMap<String, Vec<String>>,
}

impl GraphState {
    /// Edges incident to `node` for the given traversal direction,
    /// together with the neighbor on the far end.
    fn incident<'a>(
        &'a self,
        node: &'a str,
        direction: Direction,
    ) -> impl Iterator<Item = (&'a GraphEdge, &'a str)> + 'a {
        let outgoing = matches!(direction, Direction::Out | Direction::Both);
        let incoming = matches!(direction, Direction::In | Direction::Both);

        let out_iter = self
            .out_adj
            .get(node)
            .into_iter()
            .flatten()
            .filter(move |_| outgoing);
        let in_iter = self
            .in_adj
            .get(node)
            .into_iter()
            .flatten()
            .filter(move |_| incoming);

        out_iter
            .chain(in_iter)
            .filter_map(|edge_id| self.edges.get(edge_id))
            .map(move |edge| {
                let far = if edge.from == node {
                    edge.to.as_str()
                } else {
                    edge.from.as_str()
                };
                (edge, far)
            })
    }

    /// Bounded BFS from `start`, honoring direction and an optional edge
    /// kind filter. The start node is excluded from the result.
    fn bfs(
        &self,
        start: &str,
        kinds: &[EdgeKind],
        direction: Direction,
        max_depth: usize,
    ) -> Vec<GraphRow> {
        let mut visited: HashSet<String> = HashSet::from([start.to_string()]);
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(start.to_string(), 0)]);
        let mut rows = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for (edge, far) in self.incident(&current, direction) {
                if !kinds.is_empty() && !kinds.contains(&edge.kind) {
                    continue;
                }
                if visited.insert(far.to_string()) {
                    if let Some(node) = self.nodes.get(far) {
                        rows.push(GraphRow {
                            node: node.clone(),
                            depth: depth + 1,
                        });
                    }
                    queue.push_back((far.to_string(), depth + 1));
                }
            }
        }

        rows
    }

    /// Shortest undirected path between two nodes via BFS with parent
    /// tracking. Returns the path nodes in order, or empty when none
    /// exists within `max_len` hops.
    fn shortest_path(&self, from: &str, to: &str, max_len: usize) -> Vec<GraphRow> {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return Vec::new();
        }
        if from == to {
            return self
                .nodes
                .get(from)
                .map(|n| vec![GraphRow { node: n.clone(), depth: 0 }])
                .unwrap_or_default();
        }

        let mut parents: HashMap<String, String> = HashMap::new();
        let mut visited: HashSet<String> = HashSet::from([from.to_string()]);
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(from.to_string(), 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_len {
                continue;
            }
            for (_, far) in self.incident(&current, Direction::Both) {
                if visited.insert(far.to_string()) {
                    parents.insert(far.to_string(), current.clone());
                    if far == to {
                        // Reconstruct path back to the start.
                        let mut path = vec![to.to_string()];
                        let mut cursor = to.to_string();
                        while let Some(parent) = parents.get(&cursor) {
                            path.push(parent.clone());
                            cursor = parent.clone();
                        }
                        path.reverse();
                        return path
                            .into_iter()
                            .enumerate()
                            .filter_map(|(i, id)| {
                                self.nodes
                                    .get(&id)
                                    .map(|n| GraphRow { node: n.clone(), depth: i })
                            })
                            .collect();
                    }
                    queue.push_back((far.to_string(), depth + 1));
                }
            }
        }

        Vec::new()
    }
}

/// In-memory [`GraphBackend`].
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    /// Creates an empty graph store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
        }
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendAdapter for InMemoryGraphStore {
    fn name(&self) -> &str {
        "in-memory-graph-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl GraphBackend for InMemoryGraphStore {
    async fn upsert_node(
        &self,
        label: &str,
        id: Option<String>,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError> {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut state = self.state.write().await;

        match state.nodes.get_mut(&id) {
            Some(node) => {
                // Upsert: merge properties, refresh label.
                node.label = label.to_string();
                for (k, v) in properties {
                    node.properties.insert(k, v);
                }
            }
            None => {
                state.nodes.insert(
                    id.clone(),
                    GraphNode {
                        id: id.clone(),
                        label: label.to_string(),
                        properties,
                        vector_id: None,
                    },
                );
                debug!(id = id.as_str(), label, "graph node created");
            }
        }

        Ok(id)
    }

    async fn upsert_edge(
        &self,
        from: &str,
        to: &str,
        kind: EdgeKind,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError> {
        let mut state = self.state.write().await;

        if !state.nodes.contains_key(from) || !state.nodes.contains_key(to) {
            return Err(MnemoError::EndpointMissing {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        // Upsert: an existing edge with the same endpoints and kind gets
        // its properties merged instead of a parallel edge.
        let existing = state
            .out_adj
            .get(from)
            .into_iter()
            .flatten()
            .filter_map(|eid| state.edges.get(eid))
            .find(|e| e.to == to && e.kind == kind)
            .map(|e| e.id.clone());

        if let Some(edge_id) = existing {
            if let Some(edge) = state.edges.get_mut(&edge_id) {
                for (k, v) in properties {
                    edge.properties.insert(k, v);
                }
            }
            return Ok(edge_id);
        }

        let edge_id = uuid::Uuid::new_v4().to_string();
        state.edges.insert(
            edge_id.clone(),
            GraphEdge {
                id: edge_id.clone(),
                from: from.to_string(),
                to: to.to_string(),
                kind,
                properties,
            },
        );
        state
            .out_adj
            .entry(from.to_string())
            .or_default()
            .push(edge_id.clone());
        state
            .in_adj
            .entry(to.to_string())
            .or_default()
            .push(edge_id.clone());
        debug!(from, to, kind = %kind, "graph edge created");

        Ok(edge_id)
    }

    async fn get_node(&self, id: &str) -> Result<GraphNode, MnemoError> {
        self.state
            .read()
            .await
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| MnemoError::NotFound {
                kind: "graph node",
                id: id.to_string(),
            })
    }

    async fn set_vector_link(&self, node_id: &str, vector_id: &str) -> Result<(), MnemoError> {
        let mut state = self.state.write().await;
        let node = state.nodes.get_mut(node_id).ok_or_else(|| MnemoError::NotFound {
            kind: "graph node",
            id: node_id.to_string(),
        })?;
        node.vector_id = Some(vector_id.to_string());
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), MnemoError> {
        let mut state = self.state.write().await;
        if state.nodes.remove(id).is_none() {
            return Err(MnemoError::NotFound {
                kind: "graph node",
                id: id.to_string(),
            });
        }

        // Drop incident edges from both adjacency sides.
        let incident: Vec<String> = state
            .out_adj
            .remove(id)
            .into_iter()
            .flatten()
            .chain(state.in_adj.remove(id).into_iter().flatten())
            .collect();
        for edge_id in incident {
            if let Some(edge) = state.edges.remove(&edge_id) {
                if let Some(out) = state.out_adj.get_mut(&edge.from) {
                    out.retain(|eid| eid != &edge_id);
                }
                if let Some(inc) = state.in_adj.get_mut(&edge.to) {
                    inc.retain(|eid| eid != &edge_id);
                }
            }
        }

        Ok(())
    }

    async fn neighbors(
        &self,
        id: &str,
        kind: Option<EdgeKind>,
        direction: Direction,
        max_depth: usize,
    ) -> Result<Vec<GraphRow>, MnemoError> {
        let state = self.state.read().await;
        if !state.nodes.contains_key(id) {
            return Err(MnemoError::NotFound {
                kind: "graph node",
                id: id.to_string(),
            });
        }
        let kinds: Vec<EdgeKind> = kind.into_iter().collect();
        Ok(state.bfs(id, &kinds, direction, max_depth))
    }

    async fn query(&self, query: GraphQuery) -> Result<Vec<GraphRow>, MnemoError> {
        let state = self.state.read().await;

        let rows = match query {
            GraphQuery::NodesByLabel { label } => state
                .nodes
                .values()
                .filter(|n| n.label == label)
                .map(|n| GraphRow { node: n.clone(), depth: 0 })
                .collect(),
            GraphQuery::NodesByProperty { key, value } => state
                .nodes
                .values()
                .filter(|n| n.properties.get(&key) == Some(&value))
                .map(|n| GraphRow { node: n.clone(), depth: 0 })
                .collect(),
            GraphQuery::ContentMatch { needle } => {
                let needle = needle.to_lowercase();
                state
                    .nodes
                    .values()
                    .filter(|n| {
                        n.properties.values().any(|v| {
                            v.as_str()
                                .map(|s| s.to_lowercase().contains(&needle))
                                .unwrap_or(false)
                        })
                    })
                    .map(|n| GraphRow { node: n.clone(), depth: 0 })
                    .collect()
            }
            GraphQuery::Traverse { start, kinds, max_depth } => {
                if !state.nodes.contains_key(&start) {
                    return Err(MnemoError::NotFound {
                        kind: "graph node",
                        id: start,
                    });
                }
                state.bfs(&start, &kinds, Direction::Both, max_depth)
            }
            GraphQuery::ShortestPath { from, to, max_len } => {
                state.shortest_path(&from, &to, max_len)
            }
        };

        Ok(rows)
    }

    async fn edges_of(&self, id: &str) -> Result<Vec<GraphEdge>, MnemoError> {
        let state = self.state.read().await;
        let mut seen = HashSet::new();
        let edges = state
            .out_adj
            .get(id)
            .into_iter()
            .flatten()
            .chain(state.in_adj.get(id).into_iter().flatten())
            .filter(|eid| seen.insert((*eid).clone()))
            .filter_map(|eid| state.edges.get(eid))
            .cloned()
            .collect();
        Ok(edges)
    }

    async fn node_count(&self) -> Result<usize, MnemoError> {
        Ok(self.state.read().await.nodes.len())
    }
}
