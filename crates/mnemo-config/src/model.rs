// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys, providing actionable error messages. Values are set once
//! at engine construction and thereafter immutable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top-level Mnemo configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Short-term memory settings.
    #[serde(default)]
    pub stm: StmConfig,

    /// Mid-term memory settings.
    #[serde(default)]
    pub mtm: MtmConfig,

    /// Embedding settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Summarizer settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Context compressor settings.
    #[serde(default)]
    pub compressor: CompressorConfig,

    /// Multi-tier aggregator settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Hybrid long-term memory settings.
    #[serde(default)]
    pub ltm: LtmConfig,

    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Short-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StmConfig {
    /// Maximum number of turns held before FIFO eviction.
    #[serde(default = "default_stm_max_turns")]
    pub max_turns: usize,

    /// Turn time-to-live in seconds; 0 disables expiry.
    #[serde(default = "default_stm_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for StmConfig {
    fn default() -> Self {
        Self {
            max_turns: default_stm_max_turns(),
            ttl_seconds: default_stm_ttl_seconds(),
        }
    }
}

fn default_stm_max_turns() -> usize {
    10
}

fn default_stm_ttl_seconds() -> u64 {
    3600
}

/// Mid-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MtmConfig {
    /// Maximum number of chunks held before FIFO eviction.
    #[serde(default = "default_mtm_max_chunks")]
    pub max_chunks: usize,

    /// Mirror chunks into the graph store as Summary nodes.
    #[serde(default)]
    pub graph_mirror: bool,
}

impl Default for MtmConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_mtm_max_chunks(),
            graph_mirror: false,
        }
    }
}

fn default_mtm_max_chunks() -> usize {
    100
}

/// Embedding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Vector dimension D, shared by every store in the process.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Path to an ONNX sentence-transformer model. `None` selects the
    /// deterministic hash-seeded fallback embedder.
    #[serde(default)]
    pub model_path: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: default_embedding_dimensions(),
            model_path: None,
        }
    }
}

fn default_embedding_dimensions() -> usize {
    384
}

/// Summarizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizerConfig {
    /// Summarization mode: "local" (extractive) or "llm" (delegated,
    /// with silent fallback to local).
    #[serde(default = "default_summarizer_mode")]
    pub mode: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            mode: default_summarizer_mode(),
        }
    }
}

fn default_summarizer_mode() -> String {
    "local".to_string()
}

/// Context compressor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompressorConfig {
    /// Token budget for the compressed context.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Compression strategy: "truncate", "score_based", or "mmr".
    #[serde(default = "default_compressor_strategy")]
    pub strategy: String,

    /// MMR relevance/diversity trade-off in [0, 1].
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,

    /// Number of most-recent STM items forcibly kept under the
    /// score_based strategy.
    #[serde(default = "default_preserve_recent_count")]
    pub preserve_recent_count: usize,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            strategy: default_compressor_strategy(),
            mmr_lambda: default_mmr_lambda(),
            preserve_recent_count: default_preserve_recent_count(),
        }
    }
}

fn default_max_tokens() -> usize {
    2000
}

fn default_compressor_strategy() -> String {
    "score_based".to_string()
}

fn default_mmr_lambda() -> f32 {
    0.7
}

fn default_preserve_recent_count() -> usize {
    2
}

/// Multi-tier aggregator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Layer weight for short-term results.
    #[serde(default = "default_stm_weight")]
    pub stm_weight: f32,

    /// Layer weight for mid-term results.
    #[serde(default = "default_mtm_weight")]
    pub mtm_weight: f32,

    /// Layer weight for long-term results.
    #[serde(default = "default_ltm_weight")]
    pub ltm_weight: f32,

    /// Relevance vs base-score mix in [0, 1].
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Jaccard token-overlap threshold above which a lower-scored item
    /// is dropped as a duplicate.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            stm_weight: default_stm_weight(),
            mtm_weight: default_mtm_weight(),
            ltm_weight: default_ltm_weight(),
            alpha: default_alpha(),
            dedup_threshold: default_dedup_threshold(),
        }
    }
}

fn default_stm_weight() -> f32 {
    0.5
}

fn default_mtm_weight() -> f32 {
    0.3
}

fn default_ltm_weight() -> f32 {
    0.2
}

fn default_alpha() -> f32 {
    0.7
}

fn default_dedup_threshold() -> f32 {
    0.85
}

/// Hybrid long-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LtmConfig {
    /// Default query strategy: "vector_only", "graph_only",
    /// "vector_first", "graph_first", or "parallel".
    #[serde(default = "default_ltm_strategy")]
    pub strategy: String,

    /// Graph expansion depth for vector-first queries.
    #[serde(default = "default_expand_depth")]
    pub expand_depth: usize,

    /// Number of long-term facts retrieved per query.
    #[serde(default = "default_ltm_top_k")]
    pub top_k: usize,

    /// Category to graph node label mapping. Unknown categories map to
    /// the `Fact` label.
    #[serde(default = "default_category_labels")]
    pub category_labels: HashMap<String, String>,
}

impl Default for LtmConfig {
    fn default() -> Self {
        Self {
            strategy: default_ltm_strategy(),
            expand_depth: default_expand_depth(),
            top_k: default_ltm_top_k(),
            category_labels: default_category_labels(),
        }
    }
}

fn default_ltm_strategy() -> String {
    "vector_first".to_string()
}

fn default_expand_depth() -> usize {
    1
}

fn default_ltm_top_k() -> usize {
    5
}

fn default_category_labels() -> HashMap<String, String> {
    [
        ("function", "Function"),
        ("module", "Module"),
        ("commit_log", "Commit"),
        ("bug", "Bug"),
        ("concept", "Concept"),
        ("doc", "Doc"),
        ("architecture", "Concept"),
        ("guideline", "Doc"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Number of turns between short-term to mid-term promotions.
    #[serde(default = "default_summarize_every")]
    pub summarize_every: usize,

    /// Per-tier retrieval deadline in milliseconds. A missed deadline
    /// yields an empty tier, never a failed call.
    #[serde(default = "default_tier_deadline_ms")]
    pub tier_deadline_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            summarize_every: default_summarize_every(),
            tier_deadline_ms: default_tier_deadline_ms(),
        }
    }
}

fn default_summarize_every() -> usize {
    5
}

fn default_tier_deadline_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MnemoConfig::default();
        assert_eq!(config.stm.max_turns, 10);
        assert_eq!(config.stm.ttl_seconds, 3600);
        assert_eq!(config.mtm.max_chunks, 100);
        assert!(!config.mtm.graph_mirror);
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.summarizer.mode, "local");
        assert_eq!(config.compressor.max_tokens, 2000);
        assert_eq!(config.compressor.strategy, "score_based");
        assert!((config.compressor.mmr_lambda - 0.7).abs() < f32::EPSILON);
        assert!((config.aggregator.stm_weight - 0.5).abs() < f32::EPSILON);
        assert!((config.aggregator.mtm_weight - 0.3).abs() < f32::EPSILON);
        assert!((config.aggregator.ltm_weight - 0.2).abs() < f32::EPSILON);
        assert!((config.aggregator.alpha - 0.7).abs() < f32::EPSILON);
        assert!((config.aggregator.dedup_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(config.ltm.strategy, "vector_first");
        assert_eq!(config.ltm.expand_depth, 1);
        assert_eq!(config.orchestrator.summarize_every, 5);
        assert_eq!(config.orchestrator.tier_deadline_ms, 2000);
    }

    #[test]
    fn category_labels_default_mapping() {
        let config = MnemoConfig::default();
        assert_eq!(config.ltm.category_labels["function"], "Function");
        assert_eq!(config.ltm.category_labels["commit_log"], "Commit");
        assert_eq!(config.ltm.category_labels["guideline"], "Doc");
        assert!(!config.ltm.category_labels.contains_key("unknown"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[stm]
max_turns = 3

[orchestrator]
summarize_every = 3
"#;
        let config: MnemoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.stm.max_turns, 3);
        assert_eq!(config.stm.ttl_seconds, 3600);
        assert_eq!(config.orchestrator.summarize_every, 3);
        assert_eq!(config.mtm.max_chunks, 100);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[stm]
max_trns = 3
"#;
        let result = toml::from_str::<MnemoConfig>(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn ttl_zero_is_representable() {
        let toml_str = r#"
[stm]
ttl_seconds = 0
"#;
        let config: MnemoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.stm.ttl_seconds, 0);
    }
}
