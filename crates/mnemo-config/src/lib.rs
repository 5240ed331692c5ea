// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Mnemo memory engine.
//!
//! Provides the serde config model with per-section defaults, semantic
//! validation that collects every error, and miette diagnostics. Reading
//! configuration from files is the host application's concern; this crate
//! only defines and validates the model.

pub mod diagnostic;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use model::{
    AggregatorConfig, CompressorConfig, EmbeddingConfig, LtmConfig, MnemoConfig, MtmConfig,
    OrchestratorConfig, StmConfig, SummarizerConfig,
};
pub use validation::validate_config;
