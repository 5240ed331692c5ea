// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-tier result aggregation: weighted scoring, deduplication, and
//! ranking into a single list.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use mnemo_config::AggregatorConfig;
use mnemo_core::types::{cosine_similarity, estimate_tokens, TierSource};
use mnemo_ltm::LtmContextItem;
use mnemo_memory::{ScoredChunk, ScoredTurn};

/// Base score assigned to long-term items without an importance hint.
const DEFAULT_LTM_IMPORTANCE: f32 = 0.6;

/// One ranked context item with its retained sub-scores.
#[derive(Debug, Clone)]
pub struct AggregatedItem {
    pub content: String,
    pub source: TierSource,
    /// Tier-derived score: recency decay for STM, position for MTM,
    /// importance for LTM.
    pub base_score: f32,
    /// Cosine with the query embedding when available, else 0.
    pub relevance_score: f32,
    /// `w_layer * (alpha * relevance + (1 - alpha) * base)`.
    pub final_score: f32,
    pub embedding: Option<Vec<f32>>,
    pub created_at: Option<DateTime<Utc>>,
    pub token_estimate: usize,
    pub metadata: serde_json::Value,
}

/// Aggregation output: a single ranked list plus per-tier counts.
#[derive(Debug, Clone, Default)]
pub struct AggregatedContext {
    /// Items sorted non-increasing by `final_score`.
    pub items: Vec<AggregatedItem>,
    pub stm_count: usize,
    pub mtm_count: usize,
    pub ltm_count: usize,
}

/// Merges tier results with weighted scoring and Jaccard deduplication.
pub struct Aggregator {
    stm_weight: f32,
    mtm_weight: f32,
    ltm_weight: f32,
    alpha: f32,
    dedup_threshold: f32,
}

impl Aggregator {
    /// Creates an aggregator. Layer weights are normalized to sum to 1.
    pub fn new(config: &AggregatorConfig) -> Self {
        let total = config.stm_weight + config.mtm_weight + config.ltm_weight;
        Self {
            stm_weight: config.stm_weight / total,
            mtm_weight: config.mtm_weight / total,
            ltm_weight: config.ltm_weight / total,
            alpha: config.alpha,
            dedup_threshold: config.dedup_threshold,
        }
    }

    /// Aggregate tier results into a single ranked, deduplicated list.
    pub fn aggregate(
        &self,
        stm: &[ScoredTurn],
        mtm: &[ScoredChunk],
        ltm: &[LtmContextItem],
        query_embedding: Option<&[f32]>,
    ) -> AggregatedContext {
        let mut items = Vec::with_capacity(stm.len() + mtm.len() + ltm.len());

        // STM base score decays with recency rank: the most recent turn
        // gets 1.0, each older turn half of that.
        let mut recency_order: Vec<usize> = (0..stm.len()).collect();
        recency_order.sort_by(|&a, &b| stm[b].turn.created_at.cmp(&stm[a].turn.created_at));
        let mut stm_base = vec![0.0f32; stm.len()];
        for (rank, &idx) in recency_order.iter().enumerate() {
            stm_base[idx] = 0.5f32.powi(rank as i32);
        }

        for (idx, scored) in stm.iter().enumerate() {
            let relevance = relevance_of(
                query_embedding,
                scored.turn.embedding.as_deref(),
                scored.similarity,
            );
            items.push(self.scored_item(
                scored.turn.content.clone(),
                TierSource::Stm,
                self.stm_weight,
                stm_base[idx],
                relevance,
                scored.turn.embedding.clone(),
                Some(scored.turn.created_at),
                json!({
                    "turn_id": scored.turn.id,
                    "role": scored.turn.role.to_string(),
                    "intent": scored.turn.intent.map(|i| i.to_string()),
                }),
            ));
        }

        // MTM base score is positional within the provided ranking.
        let mtm_len = mtm.len().max(1);
        for (idx, scored) in mtm.iter().enumerate() {
            let relevance = relevance_of(
                query_embedding,
                scored.chunk.embedding.as_deref(),
                scored.score,
            );
            items.push(self.scored_item(
                scored.chunk.summary.clone(),
                TierSource::Mtm,
                self.mtm_weight,
                1.0 - idx as f32 / mtm_len as f32,
                relevance,
                scored.chunk.embedding.clone(),
                Some(scored.chunk.created_at),
                json!({
                    "chunk_id": scored.chunk.id,
                    "topics": scored.chunk.topics,
                    "message_count": scored.chunk.message_count,
                }),
            ));
        }

        // LTM base score is the stored importance.
        for item in ltm {
            let relevance = relevance_of(query_embedding, item.embedding.as_deref(), item.score);
            items.push(self.scored_item(
                item.content.clone(),
                TierSource::Ltm,
                self.ltm_weight,
                item.importance.unwrap_or(DEFAULT_LTM_IMPORTANCE),
                relevance,
                item.embedding.clone(),
                item.created_at,
                json!({
                    "depth": item.depth,
                }),
            ));
        }

        items.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });
        let deduplicated = self.deduplicate(items);

        let context = AggregatedContext {
            stm_count: count_source(&deduplicated, TierSource::Stm),
            mtm_count: count_source(&deduplicated, TierSource::Mtm),
            ltm_count: count_source(&deduplicated, TierSource::Ltm),
            items: deduplicated,
        };
        debug!(
            stm = context.stm_count,
            mtm = context.mtm_count,
            ltm = context.ltm_count,
            "tier results aggregated"
        );
        context
    }

    #[allow(clippy::too_many_arguments)]
    fn scored_item(
        &self,
        content: String,
        source: TierSource,
        weight: f32,
        base_score: f32,
        relevance_score: f32,
        embedding: Option<Vec<f32>>,
        created_at: Option<DateTime<Utc>>,
        metadata: serde_json::Value,
    ) -> AggregatedItem {
        let final_score =
            weight * (self.alpha * relevance_score + (1.0 - self.alpha) * base_score);
        let token_estimate = estimate_tokens(&content);
        AggregatedItem {
            content,
            source,
            base_score,
            relevance_score,
            final_score,
            embedding,
            created_at,
            token_estimate,
            metadata,
        }
    }

    /// Drop items whose normalized text overlaps a higher-scored item
    /// beyond the Jaccard threshold. Input must be sorted by score.
    fn deduplicate(&self, items: Vec<AggregatedItem>) -> Vec<AggregatedItem> {
        let mut kept: Vec<AggregatedItem> = Vec::with_capacity(items.len());
        let mut kept_tokens: Vec<HashSet<String>> = Vec::with_capacity(items.len());

        for item in items {
            let tokens = tokenize(&item.content);
            let duplicate = kept_tokens
                .iter()
                .any(|seen| jaccard(&tokens, seen) > self.dedup_threshold);
            if !duplicate {
                kept.push(item);
                kept_tokens.push(tokens);
            }
        }

        kept
    }
}

fn relevance_of(
    query_embedding: Option<&[f32]>,
    item_embedding: Option<&[f32]>,
    attached_score: f32,
) -> f32 {
    match (query_embedding, item_embedding) {
        (Some(q), Some(e)) if q.len() == e.len() => cosine_similarity(q, e),
        (Some(_), _) => attached_score,
        (None, _) => 0.0,
    }
}

fn count_source(items: &[AggregatedItem], source: TierSource) -> usize {
    items.iter().filter(|i| i.source == source).count()
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f32 / union as f32
}
