// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Mnemo memory tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by backend health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Role of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Coarse query intent from a closed vocabulary, assigned by keyword rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CodeSearch,
    Debug,
    Documentation,
    CommitLog,
    General,
}

/// Which memory tier an aggregated item came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TierSource {
    Stm,
    Mtm,
    Ltm,
}

/// Directed edge vocabulary for the knowledge graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Calls,
    BelongsTo,
    Modifies,
    Fixes,
    Affects,
    DependsOn,
    RelatedTo,
}

/// A single role-tagged message held in short-term memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn identifier.
    pub id: String,
    /// Who produced the turn.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Embedding of the content, if one was computed at ingest.
    pub embedding: Option<Vec<f32>>,
    /// Detected intent, if any.
    pub intent: Option<Intent>,
    /// Content keywords extracted at ingest.
    pub keywords: Vec<String>,
    /// Ingest timestamp.
    pub created_at: DateTime<Utc>,
    /// Rough token count, derived from content length.
    pub token_estimate: usize,
}

impl Turn {
    /// Creates a turn stamped with the current time and a fresh id.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        let token_estimate = estimate_tokens(&content);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            embedding: None,
            intent: None,
            keywords: Vec::new(),
            created_at: Utc::now(),
            token_estimate,
        }
    }
}

/// A summarized group of turns held in mid-term memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier.
    pub id: String,
    /// Concise summary text preserving entities, intents, and outcomes.
    pub summary: String,
    /// Ids of the source turns, in insertion order.
    pub source_turn_ids: Vec<String>,
    /// Unique topic keywords extracted from the source turns.
    pub topics: Vec<String>,
    /// Embedding of the summary text.
    pub embedding: Option<Vec<f32>>,
    /// Heuristic importance in [0, 1].
    pub importance: f32,
    /// Number of turns the summary covers.
    pub message_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Graph mirror node id, when the mirror is enabled.
    pub graph_mirror_id: Option<String>,
}

/// A declared relationship from a newly ingested fact to another entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    /// Edge kind to create.
    pub kind: EdgeKind,
    /// Target entity id. A placeholder node is created when it does not exist.
    pub target: String,
    /// Optional edge properties.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Metadata attached to a long-term vector record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Category driving the graph node label (e.g. "function", "commit_log").
    pub category: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Source file, when the fact points at code.
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    /// Importance hint in [0, 1] used by retrieval scoring.
    #[serde(default)]
    pub importance: Option<f32>,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Back-link to the paired graph entity, set by the hybrid store.
    #[serde(default)]
    pub graph_entity_id: Option<String>,
    /// Relationships to create alongside the record.
    #[serde(default)]
    pub graph_links: Vec<GraphLink>,
    /// Ingest timestamp.
    pub created_at: DateTime<Utc>,
}

impl RecordMetadata {
    /// Creates metadata for a category with everything else defaulted.
    pub fn for_category(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            tags: Vec::new(),
            file_path: None,
            line_start: None,
            line_end: None,
            importance: None,
            project_id: None,
            graph_entity_id: None,
            graph_links: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// A long-term memory record: immutable content plus mutable metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique record identifier.
    pub id: String,
    /// The stored content.
    pub content: String,
    /// Unit-norm embedding of the content.
    pub embedding: Vec<f32>,
    /// Record metadata.
    pub metadata: RecordMetadata,
}

/// A typed node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique entity identifier.
    pub id: String,
    /// Node label (Function, Module, Commit, Bug, Concept, Doc, Fact, ...).
    pub label: String,
    /// Typed properties.
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Cross-link to the paired vector record, when one exists.
    pub vector_id: Option<String>,
}

/// A directed typed edge in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique edge identifier.
    pub id: String,
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Edge kind.
    pub kind: EdgeKind,
    /// Optional edge properties.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Estimate the token count of a text: `chars / 4`, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Compute cosine similarity between two vectors.
///
/// For L2-normalized vectors (as produced by the embedders),
/// this is equivalent to the dot product.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
