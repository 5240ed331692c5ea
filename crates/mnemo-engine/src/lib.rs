// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mnemo memory engine orchestrator.
//!
//! Coordinates the three memory tiers and the query pipeline:
//! preprocess, concurrent deadline-bounded retrieval across short-, mid-,
//! and long-term memory, aggregation, and token-budgeted compression into
//! a [`ContextBundle`] ready for prompt assembly. Also owns short/mid
//! tier snapshots and the short-to-mid promotion cycle.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mnemo_config::MnemoConfig;
//! use mnemo_core::types::Role;
//! use mnemo_embed::build_embedder;
//! use mnemo_engine::{ContextRequest, MemoryEngine};
//! use mnemo_store::{InMemoryGraphStore, InMemoryVectorStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mnemo_core::MnemoError> {
//!     let config = MnemoConfig::default();
//!     let embedder = build_embedder(&config.embedding);
//!     let vectors = Arc::new(InMemoryVectorStore::new(config.embedding.dimensions));
//!     let graph = Arc::new(InMemoryGraphStore::new());
//!     let engine = MemoryEngine::new(config, embedder, vectors, graph, None)?;
//!
//!     engine.add_message(Role::User, "the gateway retries five times").await?;
//!     let bundle = engine
//!         .get_context("how many retries?", &ContextRequest::default())
//!         .await?;
//!     println!("{}", bundle.context_text());
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod engine;
pub mod snapshot;

pub use bundle::{
    CompressionInfo, ContextBundle, ContextItem, QueryInfo, TierCounts, TierTimings,
};
pub use engine::{knowledge_worthy, ContextRequest, EngineStats, MemoryEngine};
pub use snapshot::{MemorySnapshot, SnapshotCounters, SnapshotOutcome, SNAPSHOT_VERSION};
