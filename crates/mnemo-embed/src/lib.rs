// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backends for the Mnemo memory engine.
//!
//! Two implementations of the [`TextEmbedder`] capability:
//!
//! - **OnnxEmbedder**: local ONNX inference with a sentence-transformer
//!   class model (mean pooling + L2 normalization)
//! - **HashedEmbedder**: deterministic hash-seeded fallback for running
//!   without a model
//!
//! [`build_embedder`] picks the ONNX path when a model is configured and
//! loadable, falling back to the hashed embedder with a warning.

pub mod hashed;
pub mod onnx;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use mnemo_config::EmbeddingConfig;
use mnemo_core::traits::TextEmbedder;

pub use hashed::HashedEmbedder;
pub use onnx::OnnxEmbedder;

/// L2-normalize a vector. Zero vectors are returned unchanged.
pub fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

/// Build the process embedder from configuration.
///
/// A configured model path that fails to load degrades to the
/// deterministic fallback rather than failing engine construction; the
/// degradation is logged and visible through
/// [`TextEmbedder::is_deterministic_fallback`].
pub fn build_embedder(config: &EmbeddingConfig) -> Arc<dyn TextEmbedder> {
    if let Some(model_path) = &config.model_path {
        match OnnxEmbedder::new(Path::new(model_path), config.dimensions) {
            Ok(embedder) => {
                info!(model_path = model_path.as_str(), dimensions = config.dimensions, "loaded ONNX embedder");
                return Arc::new(embedder);
            }
            Err(e) => {
                warn!(
                    model_path = model_path.as_str(),
                    error = %e,
                    "failed to load embedding model, using deterministic fallback"
                );
            }
        }
    }
    Arc::new(HashedEmbedder::new(config.dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_unit_vector() {
        let v = vec![1.0, 0.0, 0.0];
        let n = l2_normalize(&v);
        assert!((n[0] - 1.0).abs() < f32::EPSILON);
        assert!(n[1].abs() < f32::EPSILON);
        assert!(n[2].abs() < f32::EPSILON);
    }

    #[test]
    fn l2_normalize_general_vector() {
        let v = vec![3.0, 4.0];
        let n = l2_normalize(&v);
        // norm = 5, so normalized = [0.6, 0.8]
        assert!((n[0] - 0.6).abs() < 0.001);
        assert!((n[1] - 0.8).abs() < 0.001);

        let norm: f32 = n.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let v = vec![0.0, 0.0, 0.0];
        let n = l2_normalize(&v);
        assert_eq!(n, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn build_embedder_without_model_is_fallback() {
        let config = EmbeddingConfig::default();
        let embedder = build_embedder(&config);
        assert!(embedder.is_deterministic_fallback());
        assert_eq!(embedder.dimensions(), 384);
    }

    #[test]
    fn build_embedder_with_bad_model_path_degrades() {
        let config = EmbeddingConfig {
            dimensions: 384,
            model_path: Some("/nonexistent/model.onnx".to_string()),
        };
        let embedder = build_embedder(&config);
        assert!(embedder.is_deterministic_fallback());
    }
}
