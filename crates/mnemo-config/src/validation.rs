// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as weight positivity, [0, 1] ranges, and known
//! strategy names.

use crate::diagnostic::ConfigError;
use crate::model::MnemoConfig;

const COMPRESSOR_STRATEGIES: &[&str] = &["truncate", "score_based", "mmr"];
const LTM_STRATEGIES: &[&str] = &[
    "vector_only",
    "graph_only",
    "vector_first",
    "graph_first",
    "parallel",
];
const SUMMARIZER_MODES: &[&str] = &["local", "llm"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.embedding.dimensions == 0 {
        errors.push(ConfigError::Validation {
            message: "embedding.dimensions must be at least 1".to_string(),
        });
    }

    if config.orchestrator.summarize_every == 0 {
        errors.push(ConfigError::Validation {
            message: "orchestrator.summarize_every must be at least 1".to_string(),
        });
    }

    if config.orchestrator.tier_deadline_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "orchestrator.tier_deadline_ms must be at least 1".to_string(),
        });
    }

    for (key, weight) in [
        ("aggregator.stm_weight", config.aggregator.stm_weight),
        ("aggregator.mtm_weight", config.aggregator.mtm_weight),
        ("aggregator.ltm_weight", config.aggregator.ltm_weight),
    ] {
        if weight <= 0.0 || !weight.is_finite() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be a positive finite number, got {weight}"),
            });
        }
    }

    for (key, value) in [
        ("aggregator.alpha", config.aggregator.alpha),
        ("aggregator.dedup_threshold", config.aggregator.dedup_threshold),
        ("compressor.mmr_lambda", config.compressor.mmr_lambda),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be within [0, 1], got {value}"),
            });
        }
    }

    if !COMPRESSOR_STRATEGIES.contains(&config.compressor.strategy.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "compressor.strategy `{}` is unknown; valid strategies: {}",
                config.compressor.strategy,
                COMPRESSOR_STRATEGIES.join(", ")
            ),
        });
    }

    if !LTM_STRATEGIES.contains(&config.ltm.strategy.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "ltm.strategy `{}` is unknown; valid strategies: {}",
                config.ltm.strategy,
                LTM_STRATEGIES.join(", ")
            ),
        });
    }

    if !SUMMARIZER_MODES.contains(&config.summarizer.mode.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "summarizer.mode `{}` is unknown; valid modes: {}",
                config.summarizer.mode,
                SUMMARIZER_MODES.join(", ")
            ),
        });
    }

    for (category, label) in &config.ltm.category_labels {
        if category.trim().is_empty() || label.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "ltm.category_labels entries must be non-empty, got `{category}` -> `{label}`"
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = MnemoConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_dimensions_fails_validation() {
        let mut config = MnemoConfig::default();
        config.embedding.dimensions = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("dimensions"))));
    }

    #[test]
    fn negative_weight_fails_validation() {
        let mut config = MnemoConfig::default();
        config.aggregator.mtm_weight = -0.3;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("mtm_weight"))));
    }

    #[test]
    fn alpha_out_of_range_fails_validation() {
        let mut config = MnemoConfig::default();
        config.aggregator.alpha = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("alpha"))));
    }

    #[test]
    fn unknown_strategy_fails_validation() {
        let mut config = MnemoConfig::default();
        config.compressor.strategy = "summarize".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("compressor.strategy"))));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = MnemoConfig::default();
        config.embedding.dimensions = 0;
        config.aggregator.alpha = 2.0;
        config.ltm.strategy = "psychic".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn zero_summarize_every_fails_validation() {
        let mut config = MnemoConfig::default();
        config.orchestrator.summarize_every = 0;
        assert!(validate_config(&config).is_err());
    }
}
