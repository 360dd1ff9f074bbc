// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and well-formed URLs.

use crate::diagnostic::ConfigError;
use crate::model::DataforgeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DataforgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.app.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.cache.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "cache.path must not be empty".to_string(),
        });
    }

    let base_url = config.provider.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "provider.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.base_url must start with http:// or https://, got `{base_url}`"
            ),
        });
    }

    if config.provider.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.provider.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.max_tokens must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
