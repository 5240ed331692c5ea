// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that all memory backends must implement.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::HealthStatus;

/// The base trait for all Mnemo backend implementations.
///
/// Every capability (embedder, vector store, graph store) extends this
/// trait, which provides identity, lifecycle, and health check hooks.
#[async_trait]
pub trait BackendAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this backend instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this backend.
    fn version(&self) -> semver::Version;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, MnemoError>;

    /// Gracefully shuts down the backend, releasing any held resources.
    async fn shutdown(&self) -> Result<(), MnemoError>;
}
