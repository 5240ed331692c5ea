// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability trait definitions for the Mnemo backend seams.
//!
//! The embedder, vector store, and graph store are capability interfaces
//! with multiple concrete backends; all use `#[async_trait]` for dynamic
//! dispatch and are injected at engine construction.

pub mod adapter;
pub mod embedding;
pub mod graph;
pub mod summarize;
pub mod vector;

// Re-export all traits at the traits module level for convenience.
pub use adapter::BackendAdapter;
pub use embedding::TextEmbedder;
pub use graph::{Direction, GraphBackend, GraphQuery, GraphRow};
pub use summarize::SummarizeCapability;
pub use vector::{MetadataFilter, VectorBackend, VectorMatch};
