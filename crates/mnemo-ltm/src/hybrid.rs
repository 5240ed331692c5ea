// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid long-term memory: a semantic vector store bidirectionally
//! linked to a property graph of typed entities and relations.
//!
//! Insertion is transactional over the vector+node pair; declared
//! relationship links are best-effort. Queries run under one of five
//! strategies combining the two backends.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use mnemo_config::LtmConfig;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::{
    Direction, GraphBackend, GraphQuery, GraphRow, TextEmbedder, VectorBackend,
};
use mnemo_core::types::{EdgeKind, GraphNode, RecordMetadata, VectorRecord};

/// Cap on rows returned by graph-side content search.
const GRAPH_SEARCH_LIMIT: usize = 10;

/// Query execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum QueryStrategy {
    /// Only semantic search.
    VectorOnly,
    /// Only graph query.
    GraphOnly,
    /// Vector search, then graph expansion of the hits.
    VectorFirst,
    /// Graph query, then vector enrichment of the hits.
    GraphFirst,
    /// Both simultaneously, joined by shared ids.
    Parallel,
}

/// Which backend produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    Vector,
    Graph,
    Both,
}

/// Ids returned by a hybrid insertion.
#[derive(Debug, Clone)]
pub struct HybridInsert {
    pub vector_id: String,
    pub graph_entity_id: String,
}

/// A semantic hit with its cosine score and origin tag.
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub record: VectorRecord,
    pub score: f32,
    pub origin: MatchOrigin,
}

/// Query input for the hybrid store. The embedding is computed from the
/// text when absent.
#[derive(Debug, Clone)]
pub struct LtmQuery {
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub keywords: Vec<String>,
}

impl LtmQuery {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            embedding: None,
            keywords: Vec::new(),
        }
    }
}

/// Combined result from both backends.
#[derive(Debug, Clone)]
pub struct HybridResult {
    /// Hits from the vector store.
    pub semantic_matches: Vec<SemanticMatch>,
    /// Nodes from graph queries or expansion, with path lengths.
    pub graph_relations: Vec<GraphRow>,
    /// Strategy that produced this result.
    pub strategy: QueryStrategy,
    /// Set when a backend was unavailable and the strategy degraded
    /// rather than failed.
    pub degraded: bool,
}

/// One ranked item produced by merging the two result sides.
#[derive(Debug, Clone)]
pub struct LtmContextItem {
    pub content: String,
    /// Vector score for semantic hits; 0.0 for graph-only rows.
    pub score: f32,
    /// Graph path length; 0 for pure vector hits.
    pub depth: usize,
    pub importance: Option<f32>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: Option<DateTime<Utc>>,
    pub origin: MatchOrigin,
}

impl HybridResult {
    /// Merge both sides into a single ranked list.
    ///
    /// Ordering: vector score descending, then graph path length
    /// ascending, then recency descending.
    pub fn merged(&self, limit: usize) -> Vec<LtmContextItem> {
        let semantic_node_ids: HashSet<&str> = self
            .semantic_matches
            .iter()
            .filter_map(|m| m.record.metadata.graph_entity_id.as_deref())
            .collect();

        let mut items: Vec<LtmContextItem> = self
            .semantic_matches
            .iter()
            .map(|m| LtmContextItem {
                content: m.record.content.clone(),
                score: m.score,
                depth: 0,
                importance: m.record.metadata.importance,
                embedding: Some(m.record.embedding.clone()),
                created_at: Some(m.record.metadata.created_at),
                origin: m.origin,
            })
            .collect();

        // Graph rows whose node already backs a semantic hit are the
        // same fact seen twice; keep only the enriched side.
        for row in &self.graph_relations {
            if semantic_node_ids.contains(row.node.id.as_str()) {
                continue;
            }
            items.push(LtmContextItem {
                content: render_node(&row.node),
                score: 0.0,
                depth: row.depth,
                importance: node_importance(&row.node),
                embedding: None,
                created_at: node_created_at(&row.node),
                origin: MatchOrigin::Graph,
            });
        }

        items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.depth.cmp(&b.depth))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        items.truncate(limit);
        items
    }
}

/// A related entity from graph traversal, enriched with vector content
/// when the node carries a cross-link.
#[derive(Debug, Clone)]
pub struct RelatedEntity {
    pub row: GraphRow,
    pub content: Option<String>,
}

/// Coordinator over the vector and graph backends.
pub struct HybridLtm {
    embedder: Arc<dyn TextEmbedder>,
    vectors: Arc<dyn VectorBackend>,
    graph: Arc<dyn GraphBackend>,
    expand_depth: usize,
    category_labels: HashMap<String, String>,
}

impl HybridLtm {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        vectors: Arc<dyn VectorBackend>,
        graph: Arc<dyn GraphBackend>,
        config: &LtmConfig,
    ) -> Self {
        Self {
            embedder,
            vectors,
            graph,
            expand_depth: config.expand_depth,
            category_labels: config.category_labels.clone(),
        }
    }

    /// The graph node label for a metadata category. Unknown categories
    /// map to `Fact`.
    pub fn label_for_category(&self, category: &str) -> &str {
        self.category_labels
            .get(category)
            .map(String::as_str)
            .unwrap_or("Fact")
    }

    /// Insert content into both backends, bidirectionally linked.
    ///
    /// Node creation, vector insertion, and the vector-link update either
    /// all succeed or leave no orphan behind. Declared `graph_links` are
    /// best-effort: a failed link is logged and does not roll back the
    /// main insertion.
    pub async fn add(
        &self,
        content: &str,
        mut metadata: RecordMetadata,
    ) -> Result<HybridInsert, MnemoError> {
        let embedding = self.embedder.embed(content).await?;

        let label = self.label_for_category(&metadata.category).to_string();
        let graph_entity_id = self
            .graph
            .upsert_node(&label, None, node_properties(content, &metadata))
            .await?;

        let vector_id = uuid::Uuid::new_v4().to_string();
        let links = std::mem::take(&mut metadata.graph_links);
        metadata.graph_entity_id = Some(graph_entity_id.clone());

        let record = VectorRecord {
            id: vector_id.clone(),
            content: content.to_string(),
            embedding,
            metadata,
        };
        if let Err(e) = self.vectors.add(record).await {
            // Roll back the node so no orphan is left behind.
            if let Err(rollback) = self.graph.delete_node(&graph_entity_id).await {
                warn!(error = %rollback, "failed to roll back graph node after vector insert failure");
            }
            return Err(e);
        }

        if let Err(e) = self.graph.set_vector_link(&graph_entity_id, &vector_id).await {
            if let Err(rollback) = self.vectors.delete(&vector_id).await {
                warn!(error = %rollback, "failed to roll back vector record after link failure");
            }
            if let Err(rollback) = self.graph.delete_node(&graph_entity_id).await {
                warn!(error = %rollback, "failed to roll back graph node after link failure");
            }
            return Err(e);
        }

        for link in links {
            if let Err(e) = self.create_link(&graph_entity_id, &link).await {
                warn!(
                    target = link.target.as_str(),
                    kind = %link.kind,
                    error = %e,
                    "graph link creation failed"
                );
            }
        }

        debug!(
            vector_id = vector_id.as_str(),
            graph_entity_id = graph_entity_id.as_str(),
            label = label.as_str(),
            "hybrid fact inserted"
        );
        Ok(HybridInsert {
            vector_id,
            graph_entity_id,
        })
    }

    /// Create one declared relationship, adding a placeholder target node
    /// when it does not exist yet.
    async fn create_link(
        &self,
        from: &str,
        link: &mnemo_core::types::GraphLink,
    ) -> Result<(), MnemoError> {
        if self.graph.get_node(&link.target).await.is_err() {
            let label = placeholder_label(link.kind);
            let mut props = serde_json::Map::new();
            props.insert("name".to_string(), json!(link.target));
            props.insert("placeholder".to_string(), json!(true));
            self.graph
                .upsert_node(label, Some(link.target.clone()), props)
                .await?;
        }
        self.graph
            .upsert_edge(from, &link.target, link.kind, link.properties.clone())
            .await?;
        Ok(())
    }

    /// Query both backends using the given strategy.
    pub async fn query(
        &self,
        query: &LtmQuery,
        strategy: QueryStrategy,
        top_k: usize,
    ) -> Result<HybridResult, MnemoError> {
        match strategy {
            QueryStrategy::VectorOnly => {
                let matches = self.vector_search(query, top_k).await?;
                Ok(HybridResult {
                    semantic_matches: matches,
                    graph_relations: Vec::new(),
                    strategy,
                    degraded: false,
                })
            }
            QueryStrategy::GraphOnly => {
                let relations = self.graph_search(query).await?;
                Ok(HybridResult {
                    semantic_matches: Vec::new(),
                    graph_relations: relations,
                    strategy,
                    degraded: false,
                })
            }
            QueryStrategy::VectorFirst => self.vector_first(query, top_k).await,
            QueryStrategy::GraphFirst => self.graph_first(query, top_k).await,
            QueryStrategy::Parallel => self.parallel(query, top_k).await,
        }
    }

    /// Vector search, then graph expansion of the hit entities.
    /// Graph unavailability degrades to vector-only with a flag.
    async fn vector_first(
        &self,
        query: &LtmQuery,
        top_k: usize,
    ) -> Result<HybridResult, MnemoError> {
        let matches = self.vector_search(query, top_k).await?;

        let entity_ids: Vec<String> = matches
            .iter()
            .filter_map(|m| m.record.metadata.graph_entity_id.clone())
            .collect();

        let mut relations = Vec::new();
        let mut degraded = false;
        for entity_id in entity_ids {
            match self
                .graph
                .neighbors(&entity_id, None, Direction::Both, self.expand_depth)
                .await
            {
                Ok(rows) => relations.extend(rows),
                Err(e) => {
                    warn!(entity_id = entity_id.as_str(), error = %e, "graph expansion failed, degrading to vector results");
                    degraded = true;
                    relations.clear();
                    break;
                }
            }
        }
        dedup_rows(&mut relations);

        Ok(HybridResult {
            semantic_matches: matches,
            graph_relations: relations,
            strategy: QueryStrategy::VectorFirst,
            degraded,
        })
    }

    /// Graph query, then vector enrichment of the hit nodes.
    /// Vector unavailability degrades to graph-only with a flag.
    async fn graph_first(
        &self,
        query: &LtmQuery,
        top_k: usize,
    ) -> Result<HybridResult, MnemoError> {
        let relations = self.graph_search(query).await?;

        let vector_ids: Vec<String> = relations
            .iter()
            .filter_map(|r| r.node.vector_id.clone())
            .take(top_k)
            .collect();

        let mut matches = Vec::new();
        let mut degraded = false;
        for vector_id in vector_ids {
            match self.vectors.get(&vector_id).await {
                Ok(record) => matches.push(SemanticMatch {
                    record,
                    score: 0.0,
                    origin: MatchOrigin::Graph,
                }),
                // A dangling link is a data problem, not an availability
                // problem; skip the row.
                Err(MnemoError::NotFound { .. }) => continue,
                Err(e) => {
                    warn!(error = %e, "vector enrichment failed, degrading to graph results");
                    degraded = true;
                    matches.clear();
                    break;
                }
            }
        }

        Ok(HybridResult {
            semantic_matches: matches,
            graph_relations: relations,
            strategy: QueryStrategy::GraphFirst,
            degraded,
        })
    }

    /// Run both searches concurrently and join by shared ids. One failed
    /// side degrades the result; both failing fails the call.
    async fn parallel(&self, query: &LtmQuery, top_k: usize) -> Result<HybridResult, MnemoError> {
        let (vector_side, graph_side) = tokio::join!(
            self.vector_search(query, top_k),
            self.graph_search(query)
        );

        match (vector_side, graph_side) {
            (Ok(mut matches), Ok(relations)) => {
                // Tag semantic hits whose entity also surfaced in the graph.
                let graph_ids: HashSet<&str> =
                    relations.iter().map(|r| r.node.id.as_str()).collect();
                for m in &mut matches {
                    if m.record
                        .metadata
                        .graph_entity_id
                        .as_deref()
                        .is_some_and(|id| graph_ids.contains(id))
                    {
                        m.origin = MatchOrigin::Both;
                    }
                }
                Ok(HybridResult {
                    semantic_matches: matches,
                    graph_relations: relations,
                    strategy: QueryStrategy::Parallel,
                    degraded: false,
                })
            }
            (Ok(matches), Err(e)) => {
                warn!(error = %e, "graph side of parallel query failed");
                Ok(HybridResult {
                    semantic_matches: matches,
                    graph_relations: Vec::new(),
                    strategy: QueryStrategy::Parallel,
                    degraded: true,
                })
            }
            (Err(e), Ok(relations)) => {
                warn!(error = %e, "vector side of parallel query failed");
                Ok(HybridResult {
                    semantic_matches: Vec::new(),
                    graph_relations: relations,
                    strategy: QueryStrategy::Parallel,
                    degraded: true,
                })
            }
            (Err(vector_err), Err(_)) => Err(vector_err),
        }
    }

    /// All entities related to one, enriched with vector content where a
    /// cross-link exists.
    pub async fn get_related(
        &self,
        entity_id: &str,
        kind: Option<EdgeKind>,
        max_depth: usize,
    ) -> Result<Vec<RelatedEntity>, MnemoError> {
        let rows = self
            .graph
            .neighbors(entity_id, kind, Direction::Both, max_depth)
            .await?;

        let mut related = Vec::with_capacity(rows.len());
        for row in rows {
            let content = match &row.node.vector_id {
                Some(vid) => self.vectors.get(vid).await.ok().map(|r| r.content),
                None => None,
            };
            related.push(RelatedEntity { row, content });
        }
        Ok(related)
    }

    /// Number of long-term vector records.
    pub async fn record_count(&self) -> Result<usize, MnemoError> {
        self.vectors.len().await
    }

    /// Number of graph entities.
    pub async fn entity_count(&self) -> Result<usize, MnemoError> {
        self.graph.node_count().await
    }

    /// Shortest path between two entities in the knowledge graph.
    pub async fn find_path(
        &self,
        start_id: &str,
        end_id: &str,
        max_len: usize,
    ) -> Result<Vec<GraphRow>, MnemoError> {
        self.graph
            .query(GraphQuery::ShortestPath {
                from: start_id.to_string(),
                to: end_id.to_string(),
                max_len,
            })
            .await
    }

    async fn vector_search(
        &self,
        query: &LtmQuery,
        top_k: usize,
    ) -> Result<Vec<SemanticMatch>, MnemoError> {
        let embedding = match &query.embedding {
            Some(e) => e.clone(),
            None => self.embedder.embed(&query.text).await?,
        };
        let matches = self.vectors.search(&embedding, top_k, None).await?;
        Ok(matches
            .into_iter()
            .map(|m| SemanticMatch {
                record: m.record,
                score: m.score,
                origin: MatchOrigin::Vector,
            })
            .collect())
    }

    /// Content search over graph node properties, using the query text
    /// and falling back to keywords for multi-word queries.
    async fn graph_search(&self, query: &LtmQuery) -> Result<Vec<GraphRow>, MnemoError> {
        let mut rows = self
            .graph
            .query(GraphQuery::ContentMatch {
                needle: query.text.clone(),
            })
            .await?;

        if rows.is_empty() && !query.keywords.is_empty() {
            for keyword in &query.keywords {
                let found = self
                    .graph
                    .query(GraphQuery::ContentMatch {
                        needle: keyword.clone(),
                    })
                    .await?;
                rows.extend(found);
                if rows.len() >= GRAPH_SEARCH_LIMIT {
                    break;
                }
            }
            dedup_rows(&mut rows);
        }

        rows.truncate(GRAPH_SEARCH_LIMIT);
        Ok(rows)
    }
}

/// Graph node properties derived from record metadata.
fn node_properties(
    content: &str,
    metadata: &RecordMetadata,
) -> serde_json::Map<String, serde_json::Value> {
    let mut props = serde_json::Map::new();
    props.insert("category".to_string(), json!(metadata.category));
    let description: String = content.chars().take(200).collect();
    props.insert("description".to_string(), json!(description));
    props.insert("created_at".to_string(), json!(metadata.created_at.to_rfc3339()));
    if !metadata.tags.is_empty() {
        props.insert("tags".to_string(), json!(metadata.tags));
    }
    if let Some(file_path) = &metadata.file_path {
        props.insert("file_path".to_string(), json!(file_path));
    }
    if let Some(project_id) = &metadata.project_id {
        props.insert("project_id".to_string(), json!(project_id));
    }
    if let Some(importance) = metadata.importance {
        props.insert("importance".to_string(), json!(importance));
    }
    props
}

/// Label for a placeholder node inferred from the inbound edge kind.
fn placeholder_label(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::BelongsTo => "Module",
        EdgeKind::Fixes => "Bug",
        EdgeKind::Calls => "Function",
        _ => "Fact",
    }
}

/// Human-readable content for a graph-only row.
fn render_node(node: &GraphNode) -> String {
    for key in ["description", "summary", "name", "message", "content"] {
        if let Some(value) = node.properties.get(key).and_then(|v| v.as_str()) {
            return format!("{}: {}", node.label, value);
        }
    }
    format!("{} {}", node.label, node.id)
}

fn node_importance(node: &GraphNode) -> Option<f32> {
    node.properties
        .get("importance")
        .and_then(|v| v.as_f64())
        .map(|v| v as f32)
}

fn node_created_at(node: &GraphNode) -> Option<DateTime<Utc>> {
    node.properties
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Drop duplicate rows, keeping the shallowest occurrence of each node.
fn dedup_rows(rows: &mut Vec<GraphRow>) {
    rows.sort_by(|a, b| a.node.id.cmp(&b.node.id).then(a.depth.cmp(&b.depth)));
    rows.dedup_by(|a, b| a.node.id == b.node.id);
    rows.sort_by(|a, b| a.depth.cmp(&b.depth));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn strategy_round_trips_through_strings() {
        for s in [
            QueryStrategy::VectorOnly,
            QueryStrategy::GraphOnly,
            QueryStrategy::VectorFirst,
            QueryStrategy::GraphFirst,
            QueryStrategy::Parallel,
        ] {
            assert_eq!(QueryStrategy::from_str(&s.to_string()).unwrap(), s);
        }
        assert_eq!(QueryStrategy::VectorFirst.to_string(), "vector_first");
    }

    #[test]
    fn placeholder_labels_follow_edge_kind() {
        assert_eq!(placeholder_label(EdgeKind::BelongsTo), "Module");
        assert_eq!(placeholder_label(EdgeKind::Fixes), "Bug");
        assert_eq!(placeholder_label(EdgeKind::Calls), "Function");
        assert_eq!(placeholder_label(EdgeKind::RelatedTo), "Fact");
    }

    #[test]
    fn render_node_prefers_description() {
        let mut props = serde_json::Map::new();
        props.insert("name".to_string(), json!("foo"));
        props.insert("description".to_string(), json!("computes totals"));
        let node = GraphNode {
            id: "n1".into(),
            label: "Function".into(),
            properties: props,
            vector_id: None,
        };
        assert_eq!(render_node(&node), "Function: computes totals");
    }

    #[test]
    fn merged_orders_by_score_then_depth() {
        let record = |id: &str, entity: Option<&str>, score_meta: Option<f32>| VectorRecord {
            id: id.to_string(),
            content: format!("content {id}"),
            embedding: vec![1.0, 0.0],
            metadata: {
                let mut m = RecordMetadata::for_category("concept");
                m.graph_entity_id = entity.map(str::to_string);
                m.importance = score_meta;
                m
            },
        };
        let node = |id: &str, depth: usize| GraphRow {
            node: GraphNode {
                id: id.to_string(),
                label: "Fact".into(),
                properties: serde_json::Map::new(),
                vector_id: None,
            },
            depth,
        };

        let result = HybridResult {
            semantic_matches: vec![
                SemanticMatch {
                    record: record("low", None, None),
                    score: 0.2,
                    origin: MatchOrigin::Vector,
                },
                SemanticMatch {
                    record: record("high", Some("g1"), None),
                    score: 0.9,
                    origin: MatchOrigin::Vector,
                },
            ],
            graph_relations: vec![node("far", 2), node("near", 1), node("g1", 1)],
            strategy: QueryStrategy::Parallel,
            degraded: false,
        };

        let merged = result.merged(10);
        let contents: Vec<&str> = merged.iter().map(|i| i.content.as_str()).collect();
        // Vector hits first by score; graph-only rows by depth; the g1
        // node is suppressed because the "high" hit already covers it.
        assert_eq!(merged.len(), 4);
        assert_eq!(contents[0], "content high");
        assert_eq!(contents[1], "content low");
        assert_eq!(merged[2].depth, 1);
        assert_eq!(merged[3].depth, 2);
    }

    #[test]
    fn merged_respects_limit() {
        let result = HybridResult {
            semantic_matches: Vec::new(),
            graph_relations: (0..5)
                .map(|i| GraphRow {
                    node: GraphNode {
                        id: format!("n{i}"),
                        label: "Fact".into(),
                        properties: serde_json::Map::new(),
                        vector_id: None,
                    },
                    depth: i,
                })
                .collect(),
            strategy: QueryStrategy::GraphOnly,
            degraded: false,
        };
        assert_eq!(result.merged(3).len(), 3);
    }

    #[test]
    fn dedup_rows_keeps_shallowest() {
        let row = |id: &str, depth: usize| GraphRow {
            node: GraphNode {
                id: id.to_string(),
                label: "Fact".into(),
                properties: serde_json::Map::new(),
                vector_id: None,
            },
            depth,
        };
        let mut rows = vec![row("a", 2), row("b", 1), row("a", 1)];
        dedup_rows(&mut rows);
        assert_eq!(rows.len(), 2);
        let a = rows.iter().find(|r| r.node.id == "a").unwrap();
        assert_eq!(a.depth, 1);
    }
}
