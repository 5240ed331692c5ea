// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid long-term memory for the Mnemo engine.
//!
//! Coordinates a vector store and a property graph via bidirectional id
//! links: every record knows its graph entity and every entity knows its
//! vector record. The pairing is a logical cycle of ids owned here;
//! neither store owns the other.

pub mod hybrid;

pub use hybrid::{
    HybridInsert, HybridLtm, HybridResult, LtmContextItem, LtmQuery, MatchOrigin, QueryStrategy,
    RelatedEntity, SemanticMatch,
};
