// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query preprocessing: normalization, intent tagging, keyword
//! extraction, and embedding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::TextEmbedder;
use mnemo_core::types::Intent;

/// Maximum number of keywords attached to a query.
const MAX_KEYWORDS: usize = 10;

/// Minimum length of a content word.
const MIN_KEYWORD_LEN: usize = 3;

/// Process-wide stop-list; set at init and immutable thereafter.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "with", "this", "that", "these", "those", "from",
    "have", "has", "had", "you", "your", "not", "but", "can", "could", "will", "would", "should",
    "about", "into", "over", "under", "than", "then", "them", "they", "there", "here", "what",
    "when", "where", "which", "who", "why", "how", "does", "did", "done", "been", "being", "its",
    "also", "just", "only", "some", "any", "all", "our", "out", "get", "got", "use", "used",
];

/// Keyword rules mapping query phrases to intents, checked in order.
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::CodeSearch,
        &["find", "search", "locate", "where is", "show me"],
    ),
    (
        Intent::Debug,
        &["bug", "error", "fix", "debug", "issue", "problem", "traceback"],
    ),
    (
        Intent::Documentation,
        &["explain", "what is", "how to", "document", "describe"],
    ),
    (
        Intent::CommitLog,
        &["commit", "history", "changelog", "git log", "version"],
    ),
];

/// A preprocessed query ready for multi-tier retrieval.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub raw_text: String,
    /// Lowercased, punctuation-stripped, whitespace-collapsed text.
    pub normalized_text: String,
    pub embedding: Option<Vec<f32>>,
    pub intent: Intent,
    /// Content words, order-preserving unique.
    pub keywords: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Normalizes raw text, tags intent, extracts keywords, and embeds.
pub struct QueryPreprocessor {
    embedder: Arc<dyn TextEmbedder>,
}

impl QueryPreprocessor {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }

    /// Preprocess raw text into a structured query.
    pub async fn preprocess(&self, raw_text: &str) -> Result<PreparedQuery, MnemoError> {
        let normalized_text = normalize(raw_text);
        let intent = detect_intent(&normalized_text);
        let keywords = extract_keywords(&normalized_text);

        let embedding = if normalized_text.is_empty() {
            None
        } else {
            Some(self.embedder.embed(&normalized_text).await?)
        };

        debug!(intent = %intent, keyword_count = keywords.len(), "query preprocessed");
        Ok(PreparedQuery {
            raw_text: raw_text.to_string(),
            normalized_text,
            embedding,
            intent,
            keywords,
            timestamp: Utc::now(),
        })
    }
}

/// Lowercase, collapse whitespace, and strip special characters while
/// keeping sentence punctuation and identifier characters.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, '?' | '!' | '.' | '_' | '-')
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assign an intent by keyword rules; `General` when nothing matches.
pub fn detect_intent(normalized: &str) -> Intent {
    for (intent, phrases) in INTENT_RULES {
        if phrases.iter().any(|p| normalized.contains(p)) {
            return *intent;
        }
    }
    Intent::General
}

/// Content words: alphanumeric after punctuation trimming, at least
/// three characters, not in the stop-list, unique in order of first
/// appearance, capped.
pub fn extract_keywords(normalized: &str) -> Vec<String> {
    let mut keywords = Vec::new();

    for word in normalized.split_whitespace() {
        let word = word.trim_matches(|c: char| c.is_ascii_punctuation());
        if word.len() < MIN_KEYWORD_LEN
            || !word.chars().all(char::is_alphanumeric)
            || STOP_WORDS.contains(&word)
        {
            continue;
        }
        if !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
            if keywords.len() >= MAX_KEYWORDS {
                break;
            }
        }
    }

    keywords
}
