// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mid-term memory: a bounded FIFO of summary chunks with cosine and
//! keyword search, plus an optional best-effort graph mirror.
//!
//! Evicting a chunk never affects long-term derivatives promoted from it.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::GraphBackend;
use mnemo_core::types::{cosine_similarity, Chunk, EdgeKind};

/// A chunk paired with its retrieval score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Bounded FIFO of summarized conversation chunks.
#[derive(Debug)]
pub struct MidTermMemory {
    max_chunks: usize,
    chunks: VecDeque<Chunk>,
}

impl MidTermMemory {
    /// Creates an empty mid-term memory.
    pub fn new(max_chunks: usize) -> Self {
        Self {
            max_chunks,
            chunks: VecDeque::new(),
        }
    }

    /// Append a chunk, evicting the oldest when over capacity.
    /// Returns the evicted chunk, if any.
    pub fn add_chunk(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.push_back(chunk);
        if self.chunks.len() > self.max_chunks {
            let evicted = self.chunks.pop_front();
            if let Some(c) = &evicted {
                debug!(id = c.id.as_str(), "mid-term chunk evicted");
            }
            evicted
        } else {
            None
        }
    }

    /// The most recent `n` chunks in insertion order.
    pub fn get_recent_chunks(&self, n: usize) -> Vec<Chunk> {
        self.chunks.iter().rev().take(n).rev().cloned().collect()
    }

    /// Cosine search over chunk embeddings. Chunks without embeddings
    /// score 0 and rank last; ties break by recency.
    pub fn search_by_embedding(&self, query: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .rev()
            .map(|c| ScoredChunk {
                score: c
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(query, e))
                    .unwrap_or(0.0),
                chunk: c.clone(),
            })
            .collect();

        // Newest-first input plus a stable sort keeps recency tie-breaks.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    /// Keyword search: score is the Jaccard overlap between the chunk's
    /// topics and the query keywords. Zero-overlap chunks are omitted;
    /// ties break by recency.
    pub fn search_by_keywords(&self, keywords: &[String], top_k: usize) -> Vec<ScoredChunk> {
        if keywords.is_empty() {
            return Vec::new();
        }
        let query: HashSet<&str> = keywords.iter().map(String::as_str).collect();

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .rev()
            .filter_map(|c| {
                let topics: HashSet<&str> = c.topics.iter().map(String::as_str).collect();
                let intersection = topics.intersection(&query).count();
                if intersection == 0 {
                    return None;
                }
                let union = topics.union(&query).count();
                Some(ScoredChunk {
                    score: intersection as f32 / union as f32,
                    chunk: c.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    /// Record the graph mirror node id on a stored chunk.
    pub fn set_mirror_id(&mut self, chunk_id: &str, node_id: String) {
        if let Some(chunk) = self.chunks.iter_mut().find(|c| c.id == chunk_id) {
            chunk.graph_mirror_id = Some(node_id);
        }
    }

    /// Remove all chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks in insertion order, for snapshots.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Replace contents from a snapshot, preserving order.
    pub fn restore(&mut self, chunks: Vec<Chunk>) {
        self.chunks = chunks.into();
        while self.chunks.len() > self.max_chunks {
            self.chunks.pop_front();
        }
    }
}

/// Best-effort mirror of mid-term chunks into the graph store.
///
/// Creates a `Summary` node per chunk with `RELATED_TO` edges to topic
/// placeholder nodes. Independent of the hybrid long-term graph: no
/// promotion happens between the two.
pub struct GraphMirror {
    graph: Arc<dyn GraphBackend>,
}

impl GraphMirror {
    pub fn new(graph: Arc<dyn GraphBackend>) -> Self {
        Self { graph }
    }

    /// Mirror a chunk, returning the created `Summary` node id.
    pub async fn mirror_chunk(&self, chunk: &Chunk) -> Result<String, MnemoError> {
        let mut properties = serde_json::Map::new();
        properties.insert("summary".to_string(), json!(chunk.summary));
        properties.insert("message_count".to_string(), json!(chunk.message_count));
        properties.insert("importance".to_string(), json!(chunk.importance));
        properties.insert("created_at".to_string(), json!(chunk.created_at.to_rfc3339()));

        let summary_id = self
            .graph
            .upsert_node("Summary", Some(format!("summary:{}", chunk.id)), properties)
            .await?;

        for topic in &chunk.topics {
            let mut topic_props = serde_json::Map::new();
            topic_props.insert("name".to_string(), json!(topic));
            let topic_id = self
                .graph
                .upsert_node("Concept", Some(format!("topic:{topic}")), topic_props)
                .await?;
            self.graph
                .upsert_edge(&summary_id, &topic_id, EdgeKind::RelatedTo, Default::default())
                .await?;
        }

        Ok(summary_id)
    }
}
