// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context bundle: the structured object handed to the LLM shell for
//! prompt assembly.

use serde::{Deserialize, Serialize};

use mnemo_core::types::{Intent, TierSource};
use mnemo_query::{AggregatedItem, CompressionResult, PreparedQuery};

/// Summary of the preprocessed query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryInfo {
    pub raw: String,
    pub normalized: String,
    pub intent: Intent,
    pub keywords: Vec<String>,
    /// Whether an embedding was available for retrieval.
    pub embedding_present: bool,
    /// Whether the embedding came from the deterministic fallback
    /// embedder; similarity scores are informational only in that case.
    pub deterministic_fallback: bool,
}

impl QueryInfo {
    pub fn new(query: &PreparedQuery, embedding_used: bool, deterministic_fallback: bool) -> Self {
        Self {
            raw: query.raw_text.clone(),
            normalized: query.normalized_text.clone(),
            intent: query.intent,
            keywords: query.keywords.clone(),
            embedding_present: embedding_used,
            deterministic_fallback,
        }
    }
}

/// One item in the final context, with retained sub-scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub source: TierSource,
    pub content: String,
    pub final_score: f32,
    pub base_score: f32,
    pub relevance_score: f32,
    pub metadata: serde_json::Value,
}

impl From<&AggregatedItem> for ContextItem {
    fn from(item: &AggregatedItem) -> Self {
        Self {
            source: item.source,
            content: item.content.clone(),
            final_score: item.final_score,
            base_score: item.base_score,
            relevance_score: item.relevance_score,
            metadata: item.metadata.clone(),
        }
    }
}

/// Compression bookkeeping for the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionInfo {
    pub strategy: String,
    pub original_tokens: usize,
    pub total_tokens: usize,
    pub compression_ratio: f32,
    pub items_kept: usize,
    pub items_removed: usize,
    pub truncated: bool,
}

impl From<&CompressionResult> for CompressionInfo {
    fn from(result: &CompressionResult) -> Self {
        Self {
            strategy: result.strategy.to_string(),
            original_tokens: result.original_tokens,
            total_tokens: result.total_tokens,
            compression_ratio: result.compression_ratio,
            items_kept: result.items_kept,
            items_removed: result.items_removed,
            truncated: result.truncated,
        }
    }
}

/// Per-tier item counts after aggregation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TierCounts {
    pub stm: usize,
    pub mtm: usize,
    pub ltm: usize,
}

/// Wall-clock phase timings in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TierTimings {
    pub preprocess: u64,
    pub stm: u64,
    pub mtm: u64,
    pub ltm: u64,
    pub aggregate: u64,
    pub compress: u64,
    pub total: u64,
}

/// The orchestrator's output for one `get_context` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBundle {
    pub query: QueryInfo,
    /// Compressed, ranked context items.
    pub items: Vec<ContextItem>,
    pub compression: CompressionInfo,
    pub counts: TierCounts,
    pub timings_ms: TierTimings,
    /// Tiers that missed their retrieval deadline.
    pub timeouts: Vec<String>,
    /// Tiers that failed deterministically, with reasons.
    pub errors: Vec<String>,
}

impl ContextBundle {
    /// Concatenated item contents, for callers that want a plain prompt
    /// block instead of structured items.
    pub fn context_text(&self) -> String {
        self.items
            .iter()
            .map(|i| i.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
