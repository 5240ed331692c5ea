// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable serialization of tier state.
//!
//! The snapshot is a single JSON document covering short- and mid-term
//! memory and the promotion counter. The vector and graph stores persist
//! through their own backends and are referenced only by configuration.
//! A failed load falls back to fresh state and reports the reason; it
//! never surfaces as an error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mnemo_core::error::MnemoError;
use mnemo_core::types::{Chunk, Turn};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Counters persisted alongside tier contents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SnapshotCounters {
    pub turns_since_last_summary: usize,
}

/// The persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub version: u32,
    pub stm: Vec<Turn>,
    pub mtm: Vec<Chunk>,
    pub counters: SnapshotCounters,
    pub embedding_dim: usize,
}

/// Result of a snapshot load.
#[derive(Debug)]
pub enum SnapshotOutcome {
    /// The snapshot was read and applied.
    Loaded(MemorySnapshot),
    /// No usable snapshot; the engine starts fresh.
    Fresh { reason: String },
}

impl SnapshotOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SnapshotOutcome::Loaded(_))
    }
}

/// Write a snapshot to disk. The document is written to a sibling
/// temporary file and renamed into place so a crash never leaves a
/// half-written snapshot behind.
pub async fn save_to(path: &Path, snapshot: &MemorySnapshot) -> Result<(), MnemoError> {
    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| MnemoError::Internal(format!("snapshot serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MnemoError::Internal(format!("snapshot directory creation failed: {e}")))?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| MnemoError::Internal(format!("snapshot write failed: {e}")))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| MnemoError::Internal(format!("snapshot rename failed: {e}")))?;

    info!(path = %path.display(), turns = snapshot.stm.len(), chunks = snapshot.mtm.len(), "memory snapshot saved");
    Ok(())
}

/// Read a snapshot from disk, validating the schema version and the
/// embedding dimension against the running configuration.
pub async fn load_from(path: &Path, expected_dim: usize) -> SnapshotOutcome {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return fresh(format!("snapshot not readable at {}: {e}", path.display()));
        }
    };

    let snapshot: MemorySnapshot = match serde_json::from_slice(&bytes) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            return fresh(format!("snapshot parse failed: {e}"));
        }
    };

    if snapshot.version != SNAPSHOT_VERSION {
        return fresh(format!(
            "snapshot version {} does not match supported version {SNAPSHOT_VERSION}",
            snapshot.version
        ));
    }
    if snapshot.embedding_dim != expected_dim {
        return fresh(format!(
            "snapshot embedding dimension {} does not match configured {expected_dim}",
            snapshot.embedding_dim
        ));
    }

    info!(path = %path.display(), turns = snapshot.stm.len(), chunks = snapshot.mtm.len(), "memory snapshot loaded");
    SnapshotOutcome::Loaded(snapshot)
}

fn fresh(reason: String) -> SnapshotOutcome {
    warn!(reason = reason.as_str(), "starting with fresh memory state");
    SnapshotOutcome::Fresh { reason }
}
