// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarizer: compresses a run of short-term turns into one mid-term
//! chunk with topics, an embedding, and an importance score.
//!
//! Two modes: local deterministic extraction (no network calls), or
//! delegation to an external LLM capability. LLM failures fall back to
//! local silently; callers never observe them.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{SummarizeCapability, TextEmbedder};
use mnemo_core::types::{Chunk, Intent, Turn};

/// Maximum number of topic keywords attached to a chunk.
const MAX_TOPICS: usize = 10;

/// Content prefix length taken from the first and last turn in local mode.
const EXCERPT_CHARS: usize = 100;

/// Summarization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    /// Deterministic extractive summary.
    Local,
    /// Delegate to the LLM capability, falling back to local on failure.
    Llm,
}

/// Compresses turns into mid-term chunks.
pub struct Summarizer {
    mode: SummaryMode,
    capability: Option<Arc<dyn SummarizeCapability>>,
    embedder: Arc<dyn TextEmbedder>,
}

impl Summarizer {
    /// Creates a summarizer. `Llm` mode without a capability behaves as
    /// `Local`.
    pub fn new(
        mode: SummaryMode,
        capability: Option<Arc<dyn SummarizeCapability>>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Self {
        Self {
            mode,
            capability,
            embedder,
        }
    }

    /// Summarize the given turns into a single chunk.
    ///
    /// Returns `InvalidArgument` for an empty input slice.
    pub async fn summarize(&self, turns: &[Turn]) -> Result<Chunk, MnemoError> {
        if turns.is_empty() {
            return Err(MnemoError::InvalidArgument(
                "cannot summarize zero turns".to_string(),
            ));
        }

        let summary = match (self.mode, &self.capability) {
            (SummaryMode::Llm, Some(capability)) => match capability.summarize(turns).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "LLM summarization failed, falling back to local");
                    local_summary(turns)
                }
            },
            _ => local_summary(turns),
        };

        let embedding = self.embedder.embed(&summary).await?;
        let chunk = Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            summary,
            source_turn_ids: turns.iter().map(|t| t.id.clone()).collect(),
            topics: extract_topics(turns),
            embedding: Some(embedding),
            importance: importance(turns),
            message_count: turns.len(),
            created_at: Utc::now(),
            graph_mirror_id: None,
        };
        debug!(
            chunk_id = chunk.id.as_str(),
            message_count = chunk.message_count,
            importance = chunk.importance,
            "turns summarized into chunk"
        );
        Ok(chunk)
    }
}

/// Deterministic extractive summary: first turn excerpt, a marker for the
/// middle, last turn excerpt.
pub fn local_summary(turns: &[Turn]) -> String {
    let mut parts = Vec::new();

    if let Some(first) = turns.first() {
        parts.push(format!("{}: {}", first.role, excerpt(&first.content)));
    }
    if turns.len() > 2 {
        parts.push(format!("[... {} turns exchanged ...]", turns.len() - 2));
    }
    if turns.len() > 1 {
        if let Some(last) = turns.last() {
            parts.push(format!("{}: {}", last.role, excerpt(&last.content)));
        }
    }

    parts.join(" | ")
}

fn excerpt(content: &str) -> &str {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

/// Extract topic keywords: words longer than 5 characters across all
/// turns, punctuation-stripped, lowercased, unique, capped.
pub fn extract_topics(turns: &[Turn]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut topics = Vec::new();

    for turn in turns {
        for word in turn.content.to_lowercase().split_whitespace() {
            let word = word.trim_matches(|c: char| c.is_ascii_punctuation());
            if word.len() > 5 && seen.insert(word.to_string()) {
                topics.push(word.to_string());
                if topics.len() >= MAX_TOPICS {
                    return topics;
                }
            }
        }
    }

    topics
}

/// Chunk importance: a linear combination of average turn length and the
/// fraction of turns carrying a high-signal intent, clamped to [0, 1].
pub fn importance(turns: &[Turn]) -> f32 {
    if turns.is_empty() {
        return 0.0;
    }

    let avg_tokens: f32 =
        turns.iter().map(|t| t.token_estimate as f32).sum::<f32>() / turns.len() as f32;
    let length_term = (avg_tokens / 100.0).min(1.0);

    let high_signal = turns
        .iter()
        .filter(|t| matches!(t.intent, Some(Intent::Debug) | Some(Intent::CommitLog)))
        .count() as f32;
    let intent_term = high_signal / turns.len() as f32;

    (0.6 * length_term + 0.4 * intent_term).clamp(0.0, 1.0)
}
