// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedder with pre-configured text-to-vector mappings.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{BackendAdapter, TextEmbedder};
use mnemo_core::types::HealthStatus;

/// Embedder returning fixed vectors for known texts and a unit vector on
/// the first axis otherwise. Deterministic and instant, for tests.
pub struct MockEmbedder {
    dimensions: usize,
    fixed: Mutex<HashMap<String, Vec<f32>>>,
}

impl MockEmbedder {
    /// Creates a mock embedder of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fixed: Mutex::new(HashMap::new()),
        }
    }

    /// Map `text` to a fixed vector on future `embed` calls.
    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.fixed.lock().unwrap().insert(text.into(), vector);
    }

    /// A unit vector along the given axis.
    pub fn axis(dimensions: usize, index: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimensions];
        v[index] = 1.0;
        v
    }
}

#[async_trait]
impl BackendAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
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
impl TextEmbedder for MockEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        if let Some(v) = self.fixed.lock().unwrap().get(text) {
            return Ok(v.clone());
        }
        Ok(Self::axis(self.dimensions, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_mapping_wins_over_default() {
        let embedder = MockEmbedder::new(3);
        embedder.insert("special", vec![0.0, 1.0, 0.0]);

        assert_eq!(embedder.embed("special").await.unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(embedder.embed("other").await.unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn axis_helper_is_unit_norm() {
        let v = MockEmbedder::axis(4, 2);
        assert_eq!(v, vec![0.0, 0.0, 1.0, 0.0]);
    }
}
