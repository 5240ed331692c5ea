// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo memory engine.

use thiserror::Error;

/// The primary error type used across all Mnemo capability traits and core operations.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (invalid values, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// An embedding or stored vector does not match the configured dimension.
    /// Indicates a misconfiguration and is fatal to the current call.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A record, node, or edge was not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// An edge references a node that does not exist.
    #[error("edge endpoint missing: {from} -> {to}")]
    EndpointMissing { from: String, to: String },

    /// A store invariant was violated (duplicate id, broken link, bad state).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A backing store is unreachable or refused the operation.
    #[error("backend unavailable: {backend}")]
    BackendUnavailable { backend: &'static str },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A persisted document failed schema validation on load.
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
