// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding backend for local inference with a sentence-transformer
//! class model (all-MiniLM-L6-v2 by default).
//!
//! Produces fixed-dimension embeddings on CPU with zero external API calls.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::{BackendAdapter, TextEmbedder};
use mnemo_core::types::HealthStatus;

use crate::l2_normalize;

/// ONNX-based embedder.
///
/// Loads the ONNX model and tokenizer from disk. All inference runs on
/// CPU with a single thread.
pub struct OnnxEmbedder {
    /// ONNX Runtime session (not Send, wrapped in Mutex for safety).
    session: Mutex<Session>,
    /// HuggingFace tokenizer.
    tokenizer: tokenizers::Tokenizer,
    /// Configured output dimension, enforced against the model output.
    dimensions: usize,
}

// Safety: Session is accessed through Mutex which provides synchronization.
// The tokenizer is thread-safe for encoding operations.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Creates a new ONNX embedder from model files on disk.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the same directory
    /// as the provided model path (or its parent).
    pub fn new(model_path: &Path, dimensions: usize) -> Result<Self, MnemoError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| MnemoError::Config("invalid embedding model path".to_string()))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MnemoError::Internal(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let session = Session::builder()
            .map_err(|e| MnemoError::Internal(format!("failed to create ONNX session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MnemoError::Internal(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| MnemoError::Internal(format!("failed to set thread count: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| {
                MnemoError::Internal(format!(
                    "failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
        })
    }

    /// Embed a single text string, returning a unit-norm f32 vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MnemoError::Internal(format!("tokenization failed: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding
            .get_type_ids()
            .iter()
            .map(|&t| t as i64)
            .collect();

        let seq_len = input_ids.len();

        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids).map_err(|e| {
            MnemoError::Internal(format!("failed to create input_ids tensor: {e}"))
        })?;
        let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.clone())
            .map_err(|e| {
                MnemoError::Internal(format!("failed to create attention_mask tensor: {e}"))
            })?;
        let token_type_ids_array = Array2::from_shape_vec((1, seq_len), token_type_ids)
            .map_err(|e| {
                MnemoError::Internal(format!("failed to create token_type_ids tensor: {e}"))
            })?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MnemoError::Internal(format!("failed to lock ONNX session: {e}")))?;

        let input_ids_tensor = TensorRef::from_array_view(&input_ids_array).map_err(|e| {
            MnemoError::Internal(format!("failed to create input_ids TensorRef: {e}"))
        })?;
        let attention_mask_tensor =
            TensorRef::from_array_view(&attention_mask_array).map_err(|e| {
                MnemoError::Internal(format!("failed to create attention_mask TensorRef: {e}"))
            })?;
        let token_type_ids_tensor =
            TensorRef::from_array_view(&token_type_ids_array).map_err(|e| {
                MnemoError::Internal(format!("failed to create token_type_ids TensorRef: {e}"))
            })?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
            .map_err(|e| MnemoError::Internal(format!("ONNX inference failed: {e}")))?;

        // Extract output: shape [1, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| MnemoError::Internal(format!("failed to extract output tensor: {e}")))?;

        let hidden_size = shape[shape.len() - 1] as usize;
        if hidden_size != self.dimensions {
            return Err(MnemoError::DimensionMismatch {
                expected: self.dimensions,
                actual: hidden_size,
            });
        }

        // Apply attention-masked mean pooling, then L2 normalize.
        let pooled = mean_pool_with_attention(data, &attention_mask, seq_len, hidden_size);
        Ok(l2_normalize(&pooled))
    }
}

/// Apply attention-masked mean pooling over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for i in 0..seq_len {
        if attention_mask[i] > 0 {
            for j in 0..hidden_size {
                sum[j] += embeddings[i * hidden_size + j];
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut sum {
            *val /= count;
        }
    }

    sum
}

#[async_trait]
impl BackendAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        // Try to lock the session to verify it's alive.
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("session lock poisoned: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        Ok(())
    }
}

#[async_trait]
impl TextEmbedder for OnnxEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        self.embed_text(text)
    }
}
