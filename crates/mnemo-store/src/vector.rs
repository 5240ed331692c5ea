// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vector store with linear-scan cosine search.
//!
//! A linear scan is adequate up to tens of thousands of records; an
//! ANN-indexed backend can replace this behind the same trait.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{BackendAdapter, MetadataFilter, VectorBackend, VectorMatch};
use mnemo_core::types::{cosine_similarity, HealthStatus, RecordMetadata, VectorRecord};

/// In-memory [`VectorBackend`] keyed by record id.
pub struct InMemoryVectorStore {
    dimensions: usize,
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    /// Creates an empty store enforcing the given embedding dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// The enforced embedding dimension.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl BackendAdapter for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in-memory-vector-store"
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
impl VectorBackend for InMemoryVectorStore {
    async fn add(&self, record: VectorRecord) -> Result<(), MnemoError> {
        if record.embedding.len() != self.dimensions {
            return Err(MnemoError::DimensionMismatch {
                expected: self.dimensions,
                actual: record.embedding.len(),
            });
        }

        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(MnemoError::ConstraintViolation(format!(
                "vector record id already exists: {}",
                record.id
            )));
        }
        debug!(id = record.id.as_str(), category = record.metadata.category.as_str(), "vector record added");
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<VectorRecord, MnemoError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| MnemoError::NotFound {
                kind: "vector record",
                id: id.to_string(),
            })
    }

    async fn delete(&self, id: &str) -> Result<(), MnemoError> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MnemoError::NotFound {
                kind: "vector record",
                id: id.to_string(),
            })
    }

    async fn update_metadata(
        &self,
        id: &str,
        metadata: RecordMetadata,
    ) -> Result<(), MnemoError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| MnemoError::NotFound {
            kind: "vector record",
            id: id.to_string(),
        })?;
        record.metadata = metadata;
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<VectorMatch>, MnemoError> {
        if query.len() != self.dimensions {
            return Err(MnemoError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let records = self.records.read().await;
        let mut matches: Vec<VectorMatch> = records
            .values()
            .filter(|r| filter.is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| VectorMatch {
                score: cosine_similarity(query, &r.embedding),
                record: r.clone(),
            })
            .collect();

        // Stable total order so results are monotonic in top_k: score
        // descending, then recency descending, then id.
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.record.metadata.created_at.cmp(&a.record.metadata.created_at))
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn len(&self) -> Result<usize, MnemoError> {
        Ok(self.records.read().await.len())
    }
}
