// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short- and mid-term memory tiers for the Mnemo engine.
//!
//! - [`ShortTermMemory`]: bounded FIFO of recent turns with TTL expiry
//!   and cosine search
//! - [`Summarizer`]: compresses turn runs into chunks (local extractive
//!   or LLM-delegated with silent fallback)
//! - [`MidTermMemory`]: bounded FIFO of chunks with cosine and keyword
//!   search and an optional graph mirror
//!
//! Tier structs are plain in-memory state; the engine wraps them in
//! reader-writer locks and serializes promotion.

pub mod mtm;
pub mod stm;
pub mod summarizer;

pub use mtm::{GraphMirror, MidTermMemory, ScoredChunk};
pub use stm::{ScoredTurn, ShortTermMemory};
pub use summarizer::{Summarizer, SummaryMode};
