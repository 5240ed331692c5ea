// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo memory engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Mnemo workspace. All backend
//! implementations (embedders, vector stores, graph stores) implement
//! traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemoError;
pub use types::{
    cosine_similarity, estimate_tokens, Chunk, EdgeKind, GraphEdge, GraphLink, GraphNode,
    HealthStatus, Intent, RecordMetadata, Role, TierSource, Turn, VectorRecord,
};

// Re-export all capability traits at crate root.
pub use traits::{
    BackendAdapter, Direction, GraphBackend, GraphQuery, GraphRow, MetadataFilter,
    SummarizeCapability, TextEmbedder, VectorBackend, VectorMatch,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemo_error_has_all_variants() {
        // Verify all 10 error variants exist and can be constructed.
        let _config = MnemoError::Config("test".into());
        let _dim = MnemoError::DimensionMismatch {
            expected: 384,
            actual: 128,
        };
        let _not_found = MnemoError::NotFound {
            kind: "record",
            id: "x".into(),
        };
        let _endpoint = MnemoError::EndpointMissing {
            from: "a".into(),
            to: "b".into(),
        };
        let _constraint = MnemoError::ConstraintViolation("test".into());
        let _backend = MnemoError::BackendUnavailable { backend: "graph" };
        let _timeout = MnemoError::Timeout {
            duration: std::time::Duration::from_secs(2),
        };
        let _invalid = MnemoError::InvalidArgument("test".into());
        let _schema = MnemoError::SchemaValidation("test".into());
        let _internal = MnemoError::Internal("test".into());
    }

    #[test]
    fn error_messages_name_the_mismatch() {
        let err = MnemoError::DimensionMismatch {
            expected: 384,
            actual: 128,
        };
        let msg = err.to_string();
        assert!(msg.contains("384"));
        assert!(msg.contains("128"));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // If any capability trait is missing, this test won't compile.
        fn _assert_backend_adapter<T: BackendAdapter>() {}
        fn _assert_embedder<T: TextEmbedder>() {}
        fn _assert_vector<T: VectorBackend>() {}
        fn _assert_graph<T: GraphBackend>() {}
        fn _assert_summarize<T: SummarizeCapability>() {}
    }
}
