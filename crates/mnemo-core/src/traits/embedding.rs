// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedder capability trait.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::traits::adapter::BackendAdapter;

/// Maps text to fixed-dimension, unit-norm vectors.
///
/// All embeddings produced by one embedder share the dimension reported
/// by [`dimensions`](TextEmbedder::dimensions); mixing dimensions across
/// stores is a [`MnemoError::DimensionMismatch`].
#[async_trait]
pub trait TextEmbedder: BackendAdapter {
    /// The fixed output dimension D.
    fn dimensions(&self) -> usize;

    /// Whether this embedder is the deterministic hash-seeded fallback
    /// rather than a real model. Fallback similarity scores are
    /// informational only.
    fn is_deterministic_fallback(&self) -> bool {
        false
    }

    /// Embed a single text, returning a unit-norm vector of dimension D.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemoError>;

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MnemoError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
