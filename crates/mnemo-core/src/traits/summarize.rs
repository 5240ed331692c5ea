// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External LLM summarization capability.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::Turn;

/// Delegates turn summarization to an external LLM.
///
/// The summarizer falls back to its local extractive mode when this
/// capability fails; callers never observe the failure.
#[async_trait]
pub trait SummarizeCapability: Send + Sync + 'static {
    /// Produce a concise summary of the given turns, preserving named
    /// entities, intents, and outcomes.
    async fn summarize(&self, turns: &[Turn]) -> Result<String, MnemoError>;
}
