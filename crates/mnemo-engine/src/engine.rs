// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory orchestrator: coordinates the three tiers, the query
//! pipeline, and promotion.
//!
//! `add_message` calls are serialized per instance; promotion from
//! short- to mid-term memory happens synchronously under the same guard.
//! `get_context` dispatches the three tier retrievals concurrently, each
//! under its own deadline; a missed deadline empties that tier without
//! failing the call.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use mnemo_config::{validate_config, MnemoConfig};
use mnemo_core::error::MnemoError;
use mnemo_core::traits::{GraphBackend, SummarizeCapability, TextEmbedder, VectorBackend};
use mnemo_core::types::{RecordMetadata, Role, Turn};
use mnemo_ltm::{HybridInsert, HybridLtm, LtmContextItem, LtmQuery, QueryStrategy};
use mnemo_memory::{
    GraphMirror, MidTermMemory, ScoredChunk, ScoredTurn, ShortTermMemory, Summarizer, SummaryMode,
};
use mnemo_query::{Aggregator, Compressor, QueryPreprocessor};

use crate::bundle::{CompressionInfo, ContextBundle, ContextItem, QueryInfo, TierCounts, TierTimings};
use crate::snapshot::{self, MemorySnapshot, SnapshotCounters, SnapshotOutcome};

/// Upper bound on per-tier fetch sizes; larger requests are rejected as
/// invalid rather than silently clamped.
const MAX_TIER_FETCH: usize = 1000;

/// Content markers suggesting a message carries durable knowledge.
const KNOWLEDGE_MARKERS: &[&str] = &[
    "architecture", "design", "pattern", "fix", "solution", "implement", "guideline",
    "best practice", "recommendation", "function", "class", "module", "bug", "error", "issue",
];

/// Parameters for one `get_context` call.
#[derive(Debug, Clone)]
pub struct ContextRequest {
    /// Number of recent short-term turns.
    pub n_recent: usize,
    /// Number of mid-term chunks.
    pub n_chunks: usize,
    /// Number of long-term facts.
    pub n_ltm: usize,
    /// Include the long-term tier.
    pub use_ltm: bool,
    /// Retrieve by embedding similarity instead of pure recency.
    pub use_embedding_search: bool,
    /// Override the configured long-term query strategy.
    pub strategy: Option<QueryStrategy>,
}

impl Default for ContextRequest {
    fn default() -> Self {
        Self {
            n_recent: 5,
            n_chunks: 3,
            n_ltm: 5,
            use_ltm: true,
            use_embedding_search: true,
            strategy: None,
        }
    }
}

/// Point-in-time engine statistics.
#[derive(Debug, Clone, Copy)]
pub struct EngineStats {
    pub stm_turns: usize,
    pub mtm_chunks: usize,
    pub ltm_records: usize,
    pub turns_since_last_summary: usize,
}

/// Outcome of one tier retrieval inside `get_context`.
enum TierOutcome<T> {
    Ready(T),
    TimedOut,
    Failed(String),
}

struct PromotionState {
    turns_since_last_summary: usize,
}

/// The orchestrator. Holds references to tier state and injected
/// backends; it owns no tier data itself.
pub struct MemoryEngine {
    config: MnemoConfig,
    embedder: Arc<dyn TextEmbedder>,
    stm: Arc<RwLock<ShortTermMemory>>,
    mtm: Arc<RwLock<MidTermMemory>>,
    ltm: Arc<HybridLtm>,
    preprocessor: QueryPreprocessor,
    aggregator: Aggregator,
    compressor: Compressor,
    summarizer: Summarizer,
    mirror: Option<GraphMirror>,
    default_strategy: QueryStrategy,
    /// Serializes `add_message` and the promotion it may trigger.
    promotion: Mutex<PromotionState>,
}

impl MemoryEngine {
    /// Build an engine from a validated configuration and injected
    /// backends.
    pub fn new(
        config: MnemoConfig,
        embedder: Arc<dyn TextEmbedder>,
        vectors: Arc<dyn VectorBackend>,
        graph: Arc<dyn GraphBackend>,
        summarize_capability: Option<Arc<dyn SummarizeCapability>>,
    ) -> Result<Self, MnemoError> {
        if let Err(errors) = validate_config(&config) {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(MnemoError::Config(joined));
        }

        let default_strategy = config
            .ltm
            .strategy
            .parse::<QueryStrategy>()
            .map_err(|_| MnemoError::Config(format!("unknown ltm strategy `{}`", config.ltm.strategy)))?;

        let summary_mode = match config.summarizer.mode.as_str() {
            "llm" => SummaryMode::Llm,
            _ => SummaryMode::Local,
        };

        let stm = ShortTermMemory::new(config.stm.max_turns, config.stm.ttl_seconds);
        let mtm = MidTermMemory::new(config.mtm.max_chunks);
        let ltm = Arc::new(HybridLtm::new(
            embedder.clone(),
            vectors,
            graph.clone(),
            &config.ltm,
        ));
        let mirror = config
            .mtm
            .graph_mirror
            .then(|| GraphMirror::new(graph));

        info!(
            stm_max = config.stm.max_turns,
            mtm_max = config.mtm.max_chunks,
            summarize_every = config.orchestrator.summarize_every,
            strategy = %default_strategy,
            "memory engine initialized"
        );

        Ok(Self {
            preprocessor: QueryPreprocessor::new(embedder.clone()),
            aggregator: Aggregator::new(&config.aggregator),
            compressor: Compressor::new(&config.compressor)?,
            summarizer: Summarizer::new(summary_mode, summarize_capability, embedder.clone()),
            stm: Arc::new(RwLock::new(stm)),
            mtm: Arc::new(RwLock::new(mtm)),
            ltm,
            mirror,
            default_strategy,
            promotion: Mutex::new(PromotionState {
                turns_since_last_summary: 0,
            }),
            embedder,
            config,
        })
    }

    /// Ingest one conversation turn.
    ///
    /// Preprocesses the content (intent, keywords, embedding), appends to
    /// short-term memory, and promotes the most recent run of turns into
    /// a mid-term chunk every `summarize_every` turns. Calls are
    /// serialized in submission order; a `get_context` started after this
    /// returns observes the new turn.
    pub async fn add_message(&self, role: Role, content: &str) -> Result<(), MnemoError> {
        let mut promotion = self.promotion.lock().await;

        let prepared = self.preprocessor.preprocess(content).await?;
        let mut turn = Turn::new(role, content);
        turn.embedding = prepared.embedding;
        turn.intent = Some(prepared.intent);
        turn.keywords = prepared.keywords;

        self.stm.write().await.add(turn);
        promotion.turns_since_last_summary += 1;

        if promotion.turns_since_last_summary >= self.config.orchestrator.summarize_every {
            self.promote().await?;
            promotion.turns_since_last_summary = 0;
        }

        // Assistant messages that look like durable knowledge also seed
        // the long-term store; failures there never fail the ingest.
        if knowledge_worthy(role, content) {
            let metadata = RecordMetadata::for_category(infer_category(content));
            if let Err(e) = self.ltm.add(content, metadata).await {
                warn!(error = %e, "long-term extraction failed");
            }
        }

        Ok(())
    }

    /// Summarize the most recent run of turns into a mid-term chunk.
    async fn promote(&self) -> Result<(), MnemoError> {
        let recent = {
            let stm = self.stm.read().await;
            stm.tail(self.config.orchestrator.summarize_every)
        };
        if recent.is_empty() {
            return Ok(());
        }

        let chunk = self.summarizer.summarize(&recent).await?;
        let chunk_id = chunk.id.clone();
        self.mtm.write().await.add_chunk(chunk.clone());
        debug!(chunk_id = chunk_id.as_str(), turns = recent.len(), "turns promoted to mid-term");

        if let Some(mirror) = &self.mirror {
            match mirror.mirror_chunk(&chunk).await {
                Ok(node_id) => self.mtm.write().await.set_mirror_id(&chunk_id, node_id),
                Err(e) => warn!(error = %e, "graph mirror update failed"),
            }
        }

        Ok(())
    }

    /// Build a token-budgeted, relevance-ranked context bundle.
    pub async fn get_context(
        &self,
        query: &str,
        request: &ContextRequest,
    ) -> Result<ContextBundle, MnemoError> {
        for (name, value) in [
            ("n_recent", request.n_recent),
            ("n_chunks", request.n_chunks),
            ("n_ltm", request.n_ltm),
        ] {
            if value > MAX_TIER_FETCH {
                return Err(MnemoError::InvalidArgument(format!(
                    "{name} must be at most {MAX_TIER_FETCH}, got {value}"
                )));
            }
        }

        let total_start = Instant::now();
        let prepared = self.preprocessor.preprocess(query).await?;
        let preprocess_ms = total_start.elapsed().as_millis() as u64;

        let embedding = if request.use_embedding_search {
            prepared.embedding.clone()
        } else {
            None
        };
        let deadline = Duration::from_millis(self.config.orchestrator.tier_deadline_ms);

        let stm_tier = self.retrieve_stm(request.n_recent, embedding.clone(), deadline);
        let mtm_tier = self.retrieve_mtm(request.n_chunks, embedding.clone(), deadline);
        let ltm_tier = self.retrieve_ltm(&prepared, embedding.clone(), request, deadline);

        let ((stm_outcome, stm_ms), (mtm_outcome, mtm_ms), (ltm_outcome, ltm_ms)) =
            tokio::join!(stm_tier, mtm_tier, ltm_tier);

        let mut timeouts = Vec::new();
        let mut errors = Vec::new();
        let stm_items = unwrap_tier("stm", stm_outcome, &mut timeouts, &mut errors);
        let mtm_items = unwrap_tier("mtm", mtm_outcome, &mut timeouts, &mut errors);
        let ltm_items = unwrap_tier("ltm", ltm_outcome, &mut timeouts, &mut errors);

        let aggregate_start = Instant::now();
        let aggregated =
            self.aggregator
                .aggregate(&stm_items, &mtm_items, &ltm_items, embedding.as_deref());
        let aggregate_ms = aggregate_start.elapsed().as_millis() as u64;

        let compress_start = Instant::now();
        let compressed = self.compressor.compress(&aggregated.items, true);
        let compress_ms = compress_start.elapsed().as_millis() as u64;

        let bundle = ContextBundle {
            query: QueryInfo::new(
                &prepared,
                embedding.is_some(),
                self.embedder.is_deterministic_fallback(),
            ),
            items: compressed.items.iter().map(ContextItem::from).collect(),
            compression: CompressionInfo::from(&compressed),
            counts: TierCounts {
                stm: aggregated.stm_count,
                mtm: aggregated.mtm_count,
                ltm: aggregated.ltm_count,
            },
            timings_ms: TierTimings {
                preprocess: preprocess_ms,
                stm: stm_ms,
                mtm: mtm_ms,
                ltm: ltm_ms,
                aggregate: aggregate_ms,
                compress: compress_ms,
                total: total_start.elapsed().as_millis() as u64,
            },
            timeouts,
            errors,
        };
        debug!(
            items = bundle.items.len(),
            total_tokens = bundle.compression.total_tokens,
            total_ms = bundle.timings_ms.total,
            "context bundle built"
        );
        Ok(bundle)
    }

    async fn retrieve_stm(
        &self,
        n_recent: usize,
        embedding: Option<Vec<f32>>,
        deadline: Duration,
    ) -> (TierOutcome<Vec<ScoredTurn>>, u64) {
        let start = Instant::now();
        let stm = self.stm.clone();
        let outcome = tokio::time::timeout(deadline, async move {
            // The lock is held only for extraction; expiry makes even
            // reads mutate, hence the write guard.
            let mut guard = stm.write().await;
            guard.get_recent(n_recent, embedding.as_deref())
        })
        .await;

        let elapsed = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(items) => (TierOutcome::Ready(items), elapsed),
            Err(_) => (TierOutcome::TimedOut, elapsed),
        }
    }

    async fn retrieve_mtm(
        &self,
        n_chunks: usize,
        embedding: Option<Vec<f32>>,
        deadline: Duration,
    ) -> (TierOutcome<Vec<ScoredChunk>>, u64) {
        let start = Instant::now();
        let mtm = self.mtm.clone();
        let outcome = tokio::time::timeout(deadline, async move {
            let guard = mtm.read().await;
            match embedding {
                Some(q) => guard.search_by_embedding(&q, n_chunks),
                None => guard
                    .get_recent_chunks(n_chunks)
                    .into_iter()
                    .map(|chunk| ScoredChunk { chunk, score: 0.0 })
                    .collect(),
            }
        })
        .await;

        let elapsed = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(items) => (TierOutcome::Ready(items), elapsed),
            Err(_) => (TierOutcome::TimedOut, elapsed),
        }
    }

    async fn retrieve_ltm(
        &self,
        prepared: &mnemo_query::PreparedQuery,
        embedding: Option<Vec<f32>>,
        request: &ContextRequest,
        deadline: Duration,
    ) -> (TierOutcome<Vec<LtmContextItem>>, u64) {
        let start = Instant::now();
        if !request.use_ltm {
            return (TierOutcome::Ready(Vec::new()), 0);
        }

        let strategy = request.strategy.unwrap_or(self.default_strategy);
        let ltm_query = LtmQuery {
            text: prepared.normalized_text.clone(),
            embedding,
            keywords: prepared.keywords.clone(),
        };
        let top_k = request.n_ltm;
        let ltm = self.ltm.clone();

        let outcome = tokio::time::timeout(deadline, async move {
            ltm.query(&ltm_query, strategy, top_k)
                .await
                .map(|result| result.merged(top_k))
        })
        .await;

        let elapsed = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok(items)) => (TierOutcome::Ready(items), elapsed),
            Ok(Err(e)) => (TierOutcome::Failed(e.to_string()), elapsed),
            Err(_) => (TierOutcome::TimedOut, elapsed),
        }
    }

    /// Insert a fact directly into the hybrid long-term store.
    pub async fn ingest_fact(
        &self,
        content: &str,
        metadata: RecordMetadata,
    ) -> Result<HybridInsert, MnemoError> {
        self.ltm.add(content, metadata).await
    }

    /// Access the hybrid long-term store directly.
    pub fn ltm(&self) -> &Arc<HybridLtm> {
        &self.ltm
    }

    /// Clear all tiers and the promotion counter.
    pub async fn clear_all(&self) {
        let mut promotion = self.promotion.lock().await;
        self.stm.write().await.clear();
        self.mtm.write().await.clear();
        promotion.turns_since_last_summary = 0;
    }

    /// Point-in-time statistics across the tiers.
    pub async fn stats(&self) -> Result<EngineStats, MnemoError> {
        let promotion = self.promotion.lock().await;
        Ok(EngineStats {
            stm_turns: self.stm.read().await.len(),
            mtm_chunks: self.mtm.read().await.len(),
            ltm_records: self.ltm.record_count().await?,
            turns_since_last_summary: promotion.turns_since_last_summary,
        })
    }

    /// Persist short- and mid-term state to a snapshot file.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), MnemoError> {
        let promotion = self.promotion.lock().await;
        let snapshot = MemorySnapshot {
            version: snapshot::SNAPSHOT_VERSION,
            stm: self.stm.read().await.turns().cloned().collect(),
            mtm: self.mtm.read().await.chunks().cloned().collect(),
            counters: SnapshotCounters {
                turns_since_last_summary: promotion.turns_since_last_summary,
            },
            embedding_dim: self.config.embedding.dimensions,
        };
        snapshot::save_to(path, &snapshot).await
    }

    /// Restore short- and mid-term state from a snapshot file.
    ///
    /// An unreadable, corrupt, or incompatible snapshot leaves the engine
    /// in a fresh state and reports the reason through the returned
    /// outcome; it never fails the call.
    pub async fn load_snapshot(&self, path: &Path) -> SnapshotOutcome {
        let mut promotion = self.promotion.lock().await;
        let outcome = snapshot::load_from(path, self.config.embedding.dimensions).await;

        if let SnapshotOutcome::Loaded(snapshot) = &outcome {
            self.stm.write().await.restore(snapshot.stm.clone());
            self.mtm.write().await.restore(snapshot.mtm.clone());
            promotion.turns_since_last_summary = snapshot.counters.turns_since_last_summary;
        }

        outcome
    }
}

fn unwrap_tier<T>(
    name: &str,
    outcome: TierOutcome<Vec<T>>,
    timeouts: &mut Vec<String>,
    errors: &mut Vec<String>,
) -> Vec<T> {
    match outcome {
        TierOutcome::Ready(items) => items,
        TierOutcome::TimedOut => {
            warn!(tier = name, "tier retrieval missed its deadline");
            timeouts.push(name.to_string());
            Vec::new()
        }
        TierOutcome::Failed(reason) => {
            warn!(tier = name, reason = reason.as_str(), "tier retrieval failed");
            errors.push(format!("{name}: {reason}"));
            Vec::new()
        }
    }
}

/// Whether a message likely carries knowledge worth storing long-term.
pub fn knowledge_worthy(role: Role, content: &str) -> bool {
    if role != Role::Assistant {
        return false;
    }
    let lowered = content.to_lowercase();
    KNOWLEDGE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Infer a long-term category from message content.
fn infer_category(content: &str) -> &'static str {
    let lowered = content.to_lowercase();
    if lowered.contains("function") || lowered.contains("method") {
        "function"
    } else if lowered.contains("architecture") || lowered.contains("design") {
        "architecture"
    } else if lowered.contains("bug") || lowered.contains("fix") {
        "commit_log"
    } else {
        "guideline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_worthy_requires_assistant_role() {
        assert!(!knowledge_worthy(Role::User, "the architecture is layered"));
        assert!(knowledge_worthy(Role::Assistant, "the architecture is layered"));
        assert!(!knowledge_worthy(Role::Assistant, "good morning"));
    }

    #[test]
    fn infer_category_buckets() {
        assert_eq!(infer_category("this function parses headers"), "function");
        assert_eq!(infer_category("the design favors queues"), "architecture");
        assert_eq!(infer_category("fix the off-by-one"), "commit_log");
        assert_eq!(infer_category("prefer small commits"), "guideline");
    }

    #[test]
    fn context_request_defaults() {
        let request = ContextRequest::default();
        assert_eq!(request.n_recent, 5);
        assert_eq!(request.n_chunks, 3);
        assert_eq!(request.n_ltm, 5);
        assert!(request.use_ltm);
        assert!(request.use_embedding_search);
        assert!(request.strategy.is_none());
    }
}
