// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios through the full engine: ingest, promotion,
//! retrieval, degradation, and snapshots.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mnemo_config::MnemoConfig;
use mnemo_core::types::{EdgeKind, GraphLink, RecordMetadata, Role};
use mnemo_engine::{ContextRequest, MemoryEngine, SnapshotOutcome};
use mnemo_ltm::QueryStrategy;
use mnemo_store::{InMemoryGraphStore, InMemoryVectorStore};
use mnemo_test_utils::{FailingVectorBackend, MockEmbedder, SlowGraphBackend};

const DIM: usize = 8;

struct Fixture {
    engine: MemoryEngine,
    embedder: Arc<MockEmbedder>,
    vectors: Arc<InMemoryVectorStore>,
    graph: Arc<InMemoryGraphStore>,
}

fn fixture(mut config: MnemoConfig) -> Fixture {
    config.embedding.dimensions = DIM;
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let vectors = Arc::new(InMemoryVectorStore::new(DIM));
    let graph = Arc::new(InMemoryGraphStore::new());
    let engine = MemoryEngine::new(
        config,
        embedder.clone(),
        vectors.clone(),
        graph.clone(),
        None,
    )
    .unwrap();
    Fixture {
        engine,
        embedder,
        vectors,
        graph,
    }
}

#[tokio::test]
async fn capacity_and_promotion() {
    // stm_max = 3, summarize_every = 3: six turns leave the last three
    // in STM and exactly two chunks in MTM, one per promoted run.
    let mut config = MnemoConfig::default();
    config.stm.max_turns = 3;
    config.orchestrator.summarize_every = 3;
    let f = fixture(config);

    for content in ["turn one", "turn two", "turn three", "turn four", "turn five", "turn six"] {
        f.engine.add_message(Role::User, content).await.unwrap();
    }

    let stats = f.engine.stats().await.unwrap();
    assert_eq!(stats.stm_turns, 3);
    assert_eq!(stats.mtm_chunks, 2);
    assert_eq!(stats.turns_since_last_summary, 0);

    // Recency retrieval sees only the last three turns.
    let bundle = f
        .engine
        .get_context(
            "",
            &ContextRequest {
                n_recent: 10,
                use_ltm: false,
                use_embedding_search: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let stm_contents: Vec<&str> = bundle
        .items
        .iter()
        .filter(|i| i.source == mnemo_core::types::TierSource::Stm)
        .map(|i| i.content.as_str())
        .collect();
    assert_eq!(stm_contents.len(), 3);
    assert!(stm_contents.contains(&"turn four"));
    assert!(stm_contents.contains(&"turn five"));
    assert!(stm_contents.contains(&"turn six"));

    // The first chunk summarizes the first run, the second the second.
    let mtm_items: Vec<&str> = bundle
        .items
        .iter()
        .filter(|i| i.source == mnemo_core::types::TierSource::Mtm)
        .map(|i| i.content.as_str())
        .collect();
    assert_eq!(mtm_items.len(), 2);
    assert!(mtm_items.iter().any(|s| s.contains("turn one") && s.contains("turn three")));
    assert!(mtm_items.iter().any(|s| s.contains("turn four") && s.contains("turn six")));
}

#[tokio::test]
async fn ttl_purges_expired_turns() {
    let mut config = MnemoConfig::default();
    config.stm.ttl_seconds = 1;
    let f = fixture(config);

    f.engine.add_message(Role::User, "stale turn").await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    f.engine.add_message(Role::User, "fresh turn").await.unwrap();

    let bundle = f
        .engine
        .get_context(
            "",
            &ContextRequest {
                n_recent: 5,
                use_ltm: false,
                use_embedding_search: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(bundle.counts.stm, 1);
    assert_eq!(bundle.items.len(), 1);
    assert_eq!(bundle.items[0].content, "fresh turn");
    assert_eq!(f.engine.stats().await.unwrap().stm_turns, 1);
}

#[tokio::test]
async fn embedding_retrieval_orders_by_similarity() {
    // Five turns on distinct axes; a query aligned with the third axis
    // must surface the third turn first with similarity ~1.
    let f = fixture(MnemoConfig::default());

    let contents = ["axis zero", "axis one", "axis two", "axis three", "axis four"];
    for (i, content) in contents.iter().enumerate() {
        f.embedder.insert(*content, MockEmbedder::axis(DIM, i));
        f.engine.add_message(Role::User, content).await.unwrap();
    }
    f.embedder.insert("locate axis two", MockEmbedder::axis(DIM, 2));

    let bundle = f
        .engine
        .get_context(
            "locate axis two",
            &ContextRequest {
                n_recent: 5,
                use_ltm: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(bundle.items[0].content, "axis two");
    assert!(bundle.items[0].relevance_score > 0.99);
    assert!(bundle.query.embedding_present);
}

#[tokio::test]
async fn empty_query_yields_empty_bundle() {
    let f = fixture(MnemoConfig::default());
    let bundle = f
        .engine
        .get_context("", &ContextRequest::default())
        .await
        .unwrap();

    assert!(bundle.items.is_empty());
    assert_eq!(bundle.compression.total_tokens, 0);
    assert!(!bundle.query.embedding_present);
    assert!(bundle.errors.is_empty());
}

#[tokio::test]
async fn oversized_tier_request_is_invalid() {
    let f = fixture(MnemoConfig::default());
    let err = f
        .engine
        .get_context(
            "q",
            &ContextRequest {
                n_recent: 100_000,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, mnemo_core::MnemoError::InvalidArgument(_)));
}

#[tokio::test]
async fn hybrid_ingest_links_and_counts() {
    let f = fixture(MnemoConfig::default());

    let mut metadata = RecordMetadata::for_category("function");
    metadata.graph_links = vec![GraphLink {
        kind: EdgeKind::BelongsTo,
        target: "mod_bar".to_string(),
        properties: Default::default(),
    }];
    let insert = f.engine.ingest_fact("fn foo", metadata).await.unwrap();

    use mnemo_core::traits::{GraphBackend, VectorBackend};
    let record = f.vectors.get(&insert.vector_id).await.unwrap();
    assert_eq!(
        record.metadata.graph_entity_id.as_deref(),
        Some(insert.graph_entity_id.as_str())
    );
    let node = f.graph.get_node(&insert.graph_entity_id).await.unwrap();
    assert_eq!(node.vector_id.as_deref(), Some(insert.vector_id.as_str()));
    assert_eq!(node.label, "Function");
    assert_eq!(f.graph.get_node("mod_bar").await.unwrap().label, "Module");
    assert_eq!(f.engine.stats().await.unwrap().ltm_records, 1);
}

#[tokio::test]
async fn ltm_results_join_the_bundle() {
    let f = fixture(MnemoConfig::default());

    f.embedder
        .insert("the gateway retries five times", MockEmbedder::axis(DIM, 1));
    f.engine
        .ingest_fact(
            "the gateway retries five times",
            RecordMetadata::for_category("guideline"),
        )
        .await
        .unwrap();

    f.embedder.insert("how many retries", MockEmbedder::axis(DIM, 1));
    let bundle = f
        .engine
        .get_context(
            "how many retries",
            &ContextRequest {
                strategy: Some(QueryStrategy::VectorOnly),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(bundle.counts.ltm, 1);
    assert!(bundle
        .items
        .iter()
        .any(|i| i.content == "the gateway retries five times"));
}

#[tokio::test]
async fn slow_graph_tier_times_out_without_failing_the_call() {
    // A graph stuck for 5 s under a 200 ms deadline: the call returns
    // promptly, the LTM tier is empty and recorded as timed out, and the
    // other tiers are unaffected.
    let mut config = MnemoConfig::default();
    config.orchestrator.tier_deadline_ms = 200;
    config.embedding.dimensions = DIM;

    let embedder = Arc::new(MockEmbedder::new(DIM));
    let vectors = Arc::new(InMemoryVectorStore::new(DIM));
    let graph = Arc::new(SlowGraphBackend::new(
        Arc::new(InMemoryGraphStore::new()),
        Duration::from_secs(5),
    ));
    let engine = MemoryEngine::new(config, embedder, vectors, graph, None).unwrap();

    engine.add_message(Role::User, "hello there").await.unwrap();

    let start = Instant::now();
    let bundle = engine
        .get_context(
            "anything",
            &ContextRequest {
                strategy: Some(QueryStrategy::GraphOnly),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    assert_eq!(bundle.counts.ltm, 0);
    assert_eq!(bundle.timeouts, vec!["ltm".to_string()]);
    assert_eq!(bundle.counts.stm, 1);
}

#[tokio::test]
async fn failed_ltm_backend_degrades_the_bundle() {
    let mut config = MnemoConfig::default();
    config.embedding.dimensions = DIM;
    let engine = MemoryEngine::new(
        config,
        Arc::new(MockEmbedder::new(DIM)),
        Arc::new(FailingVectorBackend),
        Arc::new(InMemoryGraphStore::new()),
        None,
    )
    .unwrap();

    engine.add_message(Role::User, "still works").await.unwrap();

    let bundle = engine
        .get_context(
            "query",
            &ContextRequest {
                strategy: Some(QueryStrategy::VectorOnly),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(bundle.counts.ltm, 0);
    assert_eq!(bundle.errors.len(), 1);
    assert!(bundle.errors[0].starts_with("ltm:"));
    // The short-term tier still contributes.
    assert_eq!(bundle.counts.stm, 1);
}

#[tokio::test]
async fn snapshot_round_trip_restores_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");

    let mut config = MnemoConfig::default();
    config.orchestrator.summarize_every = 2;
    let f = fixture(config.clone());

    for content in ["alpha", "beta", "gamma"] {
        f.engine.add_message(Role::User, content).await.unwrap();
    }
    let before = f.engine.stats().await.unwrap();
    assert_eq!(before.mtm_chunks, 1);
    assert_eq!(before.turns_since_last_summary, 1);

    f.engine.save_snapshot(&path).await.unwrap();

    let restored = fixture(config);
    assert!(restored.engine.load_snapshot(&path).await.is_loaded());

    let after = restored.engine.stats().await.unwrap();
    assert_eq!(after.stm_turns, before.stm_turns);
    assert_eq!(after.mtm_chunks, before.mtm_chunks);
    assert_eq!(after.turns_since_last_summary, 1);

    // Insertion order survives the round trip.
    let bundle = restored
        .engine
        .get_context(
            "",
            &ContextRequest {
                n_recent: 10,
                use_ltm: false,
                use_embedding_search: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let contents: Vec<&str> = bundle
        .items
        .iter()
        .filter(|i| i.source == mnemo_core::types::TierSource::Stm)
        .map(|i| i.content.as_str())
        .collect();
    assert!(contents.contains(&"alpha"));
    assert!(contents.contains(&"gamma"));
}

#[tokio::test]
async fn missing_snapshot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture(MnemoConfig::default());

    match f.engine.load_snapshot(&dir.path().join("absent.json")).await {
        SnapshotOutcome::Fresh { reason } => assert!(reason.contains("not readable")),
        SnapshotOutcome::Loaded(_) => panic!("nothing should load"),
    }
    assert_eq!(f.engine.stats().await.unwrap().stm_turns, 0);
}

#[tokio::test]
async fn clear_all_resets_every_tier() {
    let mut config = MnemoConfig::default();
    config.orchestrator.summarize_every = 2;
    let f = fixture(config);

    for content in ["one", "two", "three"] {
        f.engine.add_message(Role::User, content).await.unwrap();
    }
    f.engine.clear_all().await;

    let stats = f.engine.stats().await.unwrap();
    assert_eq!(stats.stm_turns, 0);
    assert_eq!(stats.mtm_chunks, 0);
    assert_eq!(stats.turns_since_last_summary, 0);
}

#[tokio::test]
async fn assistant_knowledge_is_extracted_to_ltm() {
    let f = fixture(MnemoConfig::default());

    f.engine
        .add_message(Role::Assistant, "the fix lands in the parser module")
        .await
        .unwrap();
    f.engine.add_message(Role::User, "thanks!").await.unwrap();

    // Only the knowledge-bearing assistant turn was extracted.
    assert_eq!(f.engine.stats().await.unwrap().ltm_records, 1);
}

#[tokio::test]
async fn graph_mirror_tracks_promoted_chunks() {
    let mut config = MnemoConfig::default();
    config.mtm.graph_mirror = true;
    config.orchestrator.summarize_every = 2;
    let f = fixture(config);

    f.engine
        .add_message(Role::User, "deployment pipeline restarts")
        .await
        .unwrap();
    f.engine
        .add_message(Role::User, "kubernetes cluster upgrade")
        .await
        .unwrap();

    use mnemo_core::traits::{GraphBackend, GraphQuery};
    let rows = f
        .graph
        .query(GraphQuery::NodesByLabel {
            label: "Summary".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}
