// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-side processing for the Mnemo memory engine.
//!
//! - [`QueryPreprocessor`]: normalization, intent tagging, keyword
//!   extraction, embedding
//! - [`Aggregator`]: weighted multi-tier scoring, deduplication, ranking
//! - [`Compressor`]: token-budgeted compression (truncate, score-based,
//!   MMR)

pub mod aggregate;
pub mod compress;
pub mod preprocess;

pub use aggregate::{AggregatedContext, AggregatedItem, Aggregator};
pub use compress::{
    CharsPerFour, CompressionResult, CompressionStrategy, Compressor, TokenEstimator,
};
pub use preprocess::{PreparedQuery, QueryPreprocessor};
