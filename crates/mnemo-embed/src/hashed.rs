// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic hash-seeded fallback embedder.
//!
//! Exists so the engine functions without a model at development time.
//! Vectors carry no semantic meaning; similarity scores against them are
//! informational only. The same text always maps to the same vector.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{BackendAdapter, TextEmbedder};
use mnemo_core::types::HealthStatus;

use crate::l2_normalize;

/// Embedder that derives a pseudo-random unit vector from a stable hash
/// of the input text.
pub struct HashedEmbedder {
    dimensions: usize,
}

impl HashedEmbedder {
    /// Creates a fallback embedder producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embed a single text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(fnv1a_64(text.as_bytes()));
        let raw: Vec<f32> = (0..self.dimensions)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        l2_normalize(&raw)
    }
}

/// FNV-1a 64-bit hash. Stable across runs and platforms, unlike the
/// std `DefaultHasher` whose keys are randomized per process.
fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[async_trait]
impl BackendAdapter for HashedEmbedder {
    fn name(&self) -> &str {
        "hashed-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl TextEmbedder for HashedEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_deterministic_fallback(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        Ok(self.embed_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::types::cosine_similarity;

    #[test]
    fn same_text_same_vector() {
        let embedder = HashedEmbedder::new(384);
        let a = embedder.embed_text("the cache invalidation bug");
        let b = embedder.embed_text("the cache invalidation bug");
        assert_eq!(a, b);
    }

    #[test]
    fn different_texts_differ() {
        let embedder = HashedEmbedder::new(384);
        let a = embedder.embed_text("alpha");
        let b = embedder.embed_text("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_unit_norm() {
        let embedder = HashedEmbedder::new(384);
        let v = embedder.embed_text("normalize me");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
        assert_eq!(v.len(), 384);
    }

    #[test]
    fn self_similarity_is_one() {
        let embedder = HashedEmbedder::new(64);
        let v = embedder.embed_text("reflexive");
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fnv1a_is_stable() {
        // Known FNV-1a 64 test vector.
        assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), fnv1a_64(b"a"));
        assert_ne!(fnv1a_64(b"a"), fnv1a_64(b"b"));
    }

    #[tokio::test]
    async fn trait_embed_matches_sync_path() {
        let embedder = HashedEmbedder::new(32);
        let via_trait = embedder.embed("hello").await.unwrap();
        assert_eq!(via_trait, embedder.embed_text("hello"));
        assert!(embedder.is_deterministic_fallback());
    }

    #[tokio::test]
    async fn embed_batch_preserves_order() {
        let embedder = HashedEmbedder::new(16);
        let texts = vec!["one".to_string(), "two".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed_text("one"));
        assert_eq!(batch[1], embedder.embed_text("two"));
    }
}
