// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Misbehaving backend wrappers for deadline and degradation tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{
    BackendAdapter, Direction, GraphBackend, GraphQuery, GraphRow, MetadataFilter, VectorBackend,
    VectorMatch,
};
use mnemo_core::types::{EdgeKind, GraphEdge, GraphNode, HealthStatus, RecordMetadata, VectorRecord};

/// Graph backend that sleeps before delegating every read, for tier
/// deadline tests. Writes pass through immediately so fixtures can be
/// seeded.
pub struct SlowGraphBackend {
    inner: Arc<dyn GraphBackend>,
    delay: Duration,
}

impl SlowGraphBackend {
    pub fn new(inner: Arc<dyn GraphBackend>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl BackendAdapter for SlowGraphBackend {
    fn name(&self) -> &str {
        "slow-graph-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl GraphBackend for SlowGraphBackend {
    async fn upsert_node(
        &self,
        label: &str,
        id: Option<String>,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError> {
        self.inner.upsert_node(label, id, properties).await
    }

    async fn upsert_edge(
        &self,
        from: &str,
        to: &str,
        kind: EdgeKind,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError> {
        self.inner.upsert_edge(from, to, kind, properties).await
    }

    async fn get_node(&self, id: &str) -> Result<GraphNode, MnemoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_node(id).await
    }

    async fn set_vector_link(&self, node_id: &str, vector_id: &str) -> Result<(), MnemoError> {
        self.inner.set_vector_link(node_id, vector_id).await
    }

    async fn delete_node(&self, id: &str) -> Result<(), MnemoError> {
        self.inner.delete_node(id).await
    }

    async fn neighbors(
        &self,
        id: &str,
        kind: Option<EdgeKind>,
        direction: Direction,
        max_depth: usize,
    ) -> Result<Vec<GraphRow>, MnemoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.neighbors(id, kind, direction, max_depth).await
    }

    async fn query(&self, query: GraphQuery) -> Result<Vec<GraphRow>, MnemoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(query).await
    }

    async fn edges_of(&self, id: &str) -> Result<Vec<GraphEdge>, MnemoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.edges_of(id).await
    }

    async fn node_count(&self) -> Result<usize, MnemoError> {
        self.inner.node_count().await
    }
}

/// Graph backend where every operation fails with `BackendUnavailable`.
pub struct FailingGraphBackend;

#[async_trait]
impl BackendAdapter for FailingGraphBackend {
    fn name(&self) -> &str {
        "failing-graph-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Unhealthy("always down".to_string()))
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl GraphBackend for FailingGraphBackend {
    async fn upsert_node(
        &self,
        _label: &str,
        _id: Option<String>,
        _properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn upsert_edge(
        &self,
        _from: &str,
        _to: &str,
        _kind: EdgeKind,
        _properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn get_node(&self, _id: &str) -> Result<GraphNode, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn set_vector_link(&self, _node_id: &str, _vector_id: &str) -> Result<(), MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn delete_node(&self, _id: &str) -> Result<(), MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn neighbors(
        &self,
        _id: &str,
        _kind: Option<EdgeKind>,
        _direction: Direction,
        _max_depth: usize,
    ) -> Result<Vec<GraphRow>, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn query(&self, _query: GraphQuery) -> Result<Vec<GraphRow>, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn edges_of(&self, _id: &str) -> Result<Vec<GraphEdge>, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }

    async fn node_count(&self) -> Result<usize, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "graph" })
    }
}

/// Vector backend where every operation fails with `BackendUnavailable`.
pub struct FailingVectorBackend;

#[async_trait]
impl BackendAdapter for FailingVectorBackend {
    fn name(&self) -> &str {
        "failing-vector-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Unhealthy("always down".to_string()))
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for FailingVectorBackend {
    async fn add(&self, _record: VectorRecord) -> Result<(), MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "vector" })
    }

    async fn get(&self, _id: &str) -> Result<VectorRecord, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "vector" })
    }

    async fn delete(&self, _id: &str) -> Result<(), MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "vector" })
    }

    async fn update_metadata(
        &self,
        _id: &str,
        _metadata: RecordMetadata,
    ) -> Result<(), MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "vector" })
    }

    async fn search(
        &self,
        _query: &[f32],
        _top_k: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<VectorMatch>, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "vector" })
    }

    async fn len(&self) -> Result<usize, MnemoError> {
        Err(MnemoError::BackendUnavailable { backend: "vector" })
    }
}
