// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo integration tests.
//!
//! Provides mock backends for fast, deterministic, CI-runnable tests
//! without model files or external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - deterministic embedder with pre-configured vectors
//! - [`SlowGraphBackend`] - read-delaying wrapper for deadline tests
//! - [`FailingGraphBackend`] / [`FailingVectorBackend`] - always-down
//!   backends for degradation tests

pub mod mock_backends;
pub mod mock_embedder;

pub use mock_backends::{FailingGraphBackend, FailingVectorBackend, SlowGraphBackend};
pub use mock_embedder::MockEmbedder;
