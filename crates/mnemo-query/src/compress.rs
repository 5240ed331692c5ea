// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-budgeted context compression.
//!
//! Fits a ranked item list under a token budget using one of three
//! strategies: plain truncation, score-based selection with optional
//! preservation of recent short-term items, or Maximal Marginal
//! Relevance for diversity.

use std::cmp::Ordering;
use std::collections::HashSet;

use strum::{Display, EnumString};
use tracing::debug;

use mnemo_config::CompressorConfig;
use mnemo_core::error::MnemoError;
use mnemo_core::types::{cosine_similarity, TierSource};

use crate::aggregate::AggregatedItem;

/// Compression strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum CompressionStrategy {
    /// Accept items in input order until the budget is reached.
    Truncate,
    /// Accept by descending score, optionally forcing recent STM items.
    ScoreBased,
    /// Maximal Marginal Relevance: trade relevance against diversity.
    Mmr,
}

/// Estimates token counts for budget accounting. Callers may inject a
/// model-accurate estimator.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Default estimator: `chars / 4`, rounded up.
pub struct CharsPerFour;

impl TokenEstimator for CharsPerFour {
    fn estimate(&self, text: &str) -> usize {
        mnemo_core::types::estimate_tokens(text)
    }
}

/// Compression output with bookkeeping for the context bundle.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// Kept items, sorted non-increasing by `final_score`.
    pub items: Vec<AggregatedItem>,
    pub total_tokens: usize,
    pub original_tokens: usize,
    /// `total_tokens / original_tokens`; 0.0 when the input is empty.
    pub compression_ratio: f32,
    pub strategy: CompressionStrategy,
    pub items_kept: usize,
    pub items_removed: usize,
    /// Set when a single oversized item was cut to a budget-sized prefix.
    pub truncated: bool,
}

/// Fits ranked items under a token budget.
pub struct Compressor {
    max_tokens: usize,
    strategy: CompressionStrategy,
    mmr_lambda: f32,
    preserve_recent_count: usize,
    estimator: Box<dyn TokenEstimator>,
}

impl std::fmt::Debug for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compressor")
            .field("max_tokens", &self.max_tokens)
            .field("strategy", &self.strategy)
            .field("mmr_lambda", &self.mmr_lambda)
            .field("preserve_recent_count", &self.preserve_recent_count)
            .finish_non_exhaustive()
    }
}

impl Compressor {
    /// Creates a compressor from configuration with the default
    /// character-based token estimator.
    pub fn new(config: &CompressorConfig) -> Result<Self, MnemoError> {
        let strategy = config
            .strategy
            .parse::<CompressionStrategy>()
            .map_err(|_| MnemoError::Config(format!("unknown compressor strategy `{}`", config.strategy)))?;
        Ok(Self {
            max_tokens: config.max_tokens,
            strategy,
            mmr_lambda: config.mmr_lambda,
            preserve_recent_count: config.preserve_recent_count,
            estimator: Box::new(CharsPerFour),
        })
    }

    /// Replace the token estimator.
    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// The configured token budget.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Compress the aggregated items under the token budget.
    pub fn compress(&self, items: &[AggregatedItem], preserve_recent: bool) -> CompressionResult {
        let original_tokens: usize = items
            .iter()
            .map(|i| self.estimator.estimate(&i.content))
            .sum();

        if items.is_empty() || self.max_tokens == 0 {
            return CompressionResult {
                items: Vec::new(),
                total_tokens: 0,
                original_tokens,
                compression_ratio: 0.0,
                strategy: self.strategy,
                items_kept: 0,
                items_removed: items.len(),
                truncated: false,
            };
        }

        let mut kept = match self.strategy {
            CompressionStrategy::Truncate => self.truncate(items),
            CompressionStrategy::ScoreBased => self.score_based(items, preserve_recent),
            CompressionStrategy::Mmr => self.mmr(items),
        };

        // A single item larger than the whole budget would otherwise
        // produce an empty context; cut it to a budget-sized prefix.
        let mut truncated = false;
        if kept.is_empty() {
            let mut head = items[0].clone();
            head.content = prefix_chars(&head.content, self.max_tokens.saturating_mul(4));
            head.token_estimate = self.estimator.estimate(&head.content);
            truncated = true;
            kept.push(head);
        }

        kept.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });

        let total_tokens: usize = kept
            .iter()
            .map(|i| self.estimator.estimate(&i.content))
            .sum();
        let result = CompressionResult {
            items_kept: kept.len(),
            items_removed: items.len().saturating_sub(kept.len()),
            compression_ratio: if original_tokens > 0 {
                total_tokens as f32 / original_tokens as f32
            } else {
                0.0
            },
            strategy: self.strategy,
            total_tokens,
            original_tokens,
            truncated,
            items: kept,
        };
        debug!(
            strategy = %result.strategy,
            kept = result.items_kept,
            removed = result.items_removed,
            total_tokens = result.total_tokens,
            "context compressed"
        );
        result
    }

    /// Accept in input order while the budget holds.
    fn truncate(&self, items: &[AggregatedItem]) -> Vec<AggregatedItem> {
        let mut kept = Vec::new();
        let mut used = 0usize;

        for item in items {
            let tokens = self.estimator.estimate(&item.content);
            if used + tokens > self.max_tokens {
                break;
            }
            used += tokens;
            kept.push(item.clone());
        }

        kept
    }

    /// Accept by descending score. With `preserve_recent`, the most
    /// recent STM items are admitted first so they survive even when
    /// lower-scored than other candidates.
    fn score_based(&self, items: &[AggregatedItem], preserve_recent: bool) -> Vec<AggregatedItem> {
        if !preserve_recent || self.preserve_recent_count == 0 {
            let mut sorted: Vec<&AggregatedItem> = items.iter().collect();
            sorted.sort_by(|a, b| {
                b.final_score
                    .partial_cmp(&a.final_score)
                    .unwrap_or(Ordering::Equal)
            });
            return self.take_under_budget(sorted);
        }

        // Pick the N most recent STM items to force-keep, newest first.
        let mut stm_indices: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.source == TierSource::Stm)
            .map(|(idx, _)| idx)
            .collect();
        stm_indices.sort_by(|&a, &b| items[b].created_at.cmp(&items[a].created_at));
        stm_indices.truncate(self.preserve_recent_count);
        let forced: HashSet<usize> = stm_indices.iter().copied().collect();

        let mut ordered: Vec<&AggregatedItem> =
            stm_indices.iter().map(|&idx| &items[idx]).collect();
        let mut rest: Vec<&AggregatedItem> = items
            .iter()
            .enumerate()
            .filter(|(idx, _)| !forced.contains(idx))
            .map(|(_, item)| item)
            .collect();
        rest.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });
        ordered.extend(rest);

        self.take_under_budget(ordered)
    }

    fn take_under_budget(&self, ordered: Vec<&AggregatedItem>) -> Vec<AggregatedItem> {
        let mut kept = Vec::new();
        let mut used = 0usize;

        for item in ordered {
            let tokens = self.estimator.estimate(&item.content);
            if used + tokens > self.max_tokens {
                break;
            }
            used += tokens;
            kept.push(item.clone());
        }

        kept
    }

    /// Maximal Marginal Relevance: repeatedly pick the candidate
    /// maximizing `lambda * score - (1 - lambda) * max_sim(selected)`,
    /// accepting while the budget holds. Items without embeddings carry
    /// no diversity penalty.
    fn mmr(&self, items: &[AggregatedItem]) -> Vec<AggregatedItem> {
        let mut kept: Vec<AggregatedItem> = Vec::new();
        let mut remaining: Vec<&AggregatedItem> = items.iter().collect();
        let mut used = 0usize;

        while let Some((best_pos, _)) = remaining
            .iter()
            .enumerate()
            .map(|(pos, candidate)| {
                let redundancy = kept
                    .iter()
                    .map(|s| embedding_similarity(candidate, s))
                    .fold(0.0f32, f32::max);
                let objective = self.mmr_lambda * candidate.final_score
                    - (1.0 - self.mmr_lambda) * redundancy;
                (pos, objective)
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        {
            let candidate = remaining.remove(best_pos);
            let tokens = self.estimator.estimate(&candidate.content);
            if used + tokens > self.max_tokens {
                break;
            }
            used += tokens;
            kept.push(candidate.clone());
        }

        kept
    }
}

fn embedding_similarity(a: &AggregatedItem, b: &AggregatedItem) -> f32 {
    match (&a.embedding, &b.embedding) {
        (Some(x), Some(y)) if x.len() == y.len() => cosine_similarity(x, y),
        _ => 0.0,
    }
}

/// Prefix of `text` holding at most `max_chars` characters, cut on a
/// char boundary.
fn prefix_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::str::FromStr;

    fn item(content: &str, source: TierSource, score: f32, age_secs: i64) -> AggregatedItem {
        AggregatedItem {
            content: content.to_string(),
            source,
            base_score: 0.5,
            relevance_score: score,
            final_score: score,
            embedding: None,
            created_at: Some(Utc::now() - Duration::seconds(age_secs)),
            token_estimate: mnemo_core::types::estimate_tokens(content),
            metadata: serde_json::Value::Null,
        }
    }

    /// An item whose content estimates to exactly `tokens` tokens.
    fn sized_item(tokens: usize, source: TierSource, score: f32, age_secs: i64) -> AggregatedItem {
        item(&"x".repeat(tokens * 4), source, score, age_secs)
    }

    fn compressor(max_tokens: usize, strategy: &str) -> Compressor {
        Compressor::new(&CompressorConfig {
            max_tokens,
            strategy: strategy.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn strategy_round_trips_through_strings() {
        for s in [
            CompressionStrategy::Truncate,
            CompressionStrategy::ScoreBased,
            CompressionStrategy::Mmr,
        ] {
            assert_eq!(CompressionStrategy::from_str(&s.to_string()).unwrap(), s);
        }
        assert_eq!(CompressionStrategy::ScoreBased.to_string(), "score_based");
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let err = Compressor::new(&CompressorConfig {
            strategy: "psychic".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, MnemoError::Config(_)));
    }

    #[test]
    fn zero_budget_returns_empty_with_zero_ratio() {
        let c = compressor(0, "score_based");
        let items = vec![sized_item(10, TierSource::Stm, 0.9, 0)];
        let result = c.compress(&items, true);

        assert!(result.items.is_empty());
        assert_eq!(result.total_tokens, 0);
        assert_eq!(result.compression_ratio, 0.0);
        assert!(!result.truncated);
    }

    #[test]
    fn empty_input_returns_empty() {
        let c = compressor(100, "truncate");
        let result = c.compress(&[], true);
        assert_eq!(result.items_kept, 0);
        assert_eq!(result.original_tokens, 0);
    }

    #[test]
    fn truncate_respects_input_order_and_budget() {
        let c = compressor(25, "truncate");
        let items = vec![
            sized_item(10, TierSource::Stm, 0.9, 0),
            sized_item(10, TierSource::Mtm, 0.8, 0),
            sized_item(10, TierSource::Ltm, 0.7, 0),
        ];
        let result = c.compress(&items, false);

        assert_eq!(result.items_kept, 2);
        assert_eq!(result.total_tokens, 20);
        assert!(result.total_tokens <= 25);
        assert_eq!(result.items_removed, 1);
    }

    #[test]
    fn score_based_keeps_highest_scores() {
        let c = compressor(20, "score_based");
        let items = vec![
            sized_item(10, TierSource::Mtm, 0.1, 0),
            sized_item(10, TierSource::Ltm, 0.9, 0),
            sized_item(10, TierSource::Mtm, 0.5, 0),
        ];
        let result = c.compress(&items, false);

        assert_eq!(result.items_kept, 2);
        let scores: Vec<f32> = result.items.iter().map(|i| i.final_score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
    }

    #[test]
    fn preserve_recent_forces_low_scored_stm_items() {
        // Eight 100-token items, budget 500: five fit. The two most
        // recent STM items are kept despite the lowest scores.
        let c = compressor(500, "score_based");
        let mut items = vec![
            sized_item(100, TierSource::Stm, 0.01, 0),
            sized_item(100, TierSource::Stm, 0.02, 10),
        ];
        for i in 0..6 {
            items.push(sized_item(100, TierSource::Mtm, 0.5 + i as f32 * 0.05, 0));
        }

        let result = c.compress(&items, true);

        assert_eq!(result.items_kept, 5);
        assert!(result.total_tokens <= 500);
        let stm_kept = result
            .items
            .iter()
            .filter(|i| i.source == TierSource::Stm)
            .count();
        assert_eq!(stm_kept, 2);
    }

    #[test]
    fn preserve_recent_only_forces_the_most_recent() {
        let c = compressor(300, "score_based");
        let items = vec![
            sized_item(100, TierSource::Stm, 0.01, 30),
            sized_item(100, TierSource::Stm, 0.01, 20),
            sized_item(100, TierSource::Stm, 0.01, 0),
            sized_item(100, TierSource::Mtm, 0.9, 0),
            sized_item(100, TierSource::Mtm, 0.8, 0),
        ];
        let result = c.compress(&items, true);

        // Two forced recent STM (ages 0 and 20) + the best MTM item.
        assert_eq!(result.items_kept, 3);
        let oldest_kept = result
            .items
            .iter()
            .filter(|i| i.source == TierSource::Stm)
            .all(|i| {
                i.created_at.unwrap() > Utc::now() - Duration::seconds(25)
            });
        assert!(oldest_kept);
    }

    #[test]
    fn oversized_single_item_is_prefix_truncated() {
        let c = compressor(5, "truncate");
        let items = vec![sized_item(100, TierSource::Ltm, 0.9, 0)];
        let result = c.compress(&items, false);

        assert!(result.truncated);
        assert_eq!(result.items_kept, 1);
        assert_eq!(result.items[0].content.chars().count(), 20);
        assert!(result.total_tokens <= 5);
    }

    #[test]
    fn mmr_prefers_diverse_items() {
        let mut a = sized_item(10, TierSource::Mtm, 0.9, 0);
        a.embedding = Some(vec![1.0, 0.0]);
        let mut near_dup = sized_item(10, TierSource::Mtm, 0.8, 0);
        near_dup.embedding = Some(vec![1.0, 0.0]);
        let mut diverse = sized_item(10, TierSource::Ltm, 0.4, 0);
        diverse.embedding = Some(vec![0.0, 1.0]);

        // Budget admits two items; MMR should pick the diverse one over
        // the near-duplicate despite its lower score.
        let c = compressor(20, "mmr");
        let result = c.compress(&[a, near_dup, diverse], false);

        assert_eq!(result.items_kept, 2);
        let contents: Vec<f32> = result.items.iter().map(|i| i.final_score).collect();
        assert!(contents.contains(&0.9));
        assert!(contents.contains(&0.4));
    }

    #[test]
    fn budget_invariant_holds_across_strategies() {
        for strategy in ["truncate", "score_based", "mmr"] {
            let c = compressor(35, strategy);
            let items: Vec<AggregatedItem> = (0..6)
                .map(|i| sized_item(10, TierSource::Mtm, 1.0 - i as f32 * 0.1, 0))
                .collect();
            let result = c.compress(&items, true);
            assert!(
                result.total_tokens <= 35,
                "{strategy} exceeded the budget: {}",
                result.total_tokens
            );
        }
    }

    #[test]
    fn ratio_reflects_kept_share() {
        let c = compressor(20, "truncate");
        let items = vec![
            sized_item(10, TierSource::Stm, 0.9, 0),
            sized_item(10, TierSource::Stm, 0.8, 0),
            sized_item(20, TierSource::Stm, 0.7, 0),
        ];
        let result = c.compress(&items, false);
        assert!((result.compression_ratio - 0.5).abs() < 1e-6);
    }
}
