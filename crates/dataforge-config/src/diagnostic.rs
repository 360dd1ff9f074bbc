// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! the offending key path and, for unknown keys, the list of valid keys
//! for the section.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error with diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(dataforge::config::unknown_key),
        help("valid keys: {valid_keys}")
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// List of valid keys for the section.
        valid_keys: String,
    },

    /// A configuration value has the wrong type or shape.
    #[error("invalid value for key `{key}`: {detail}")]
    #[diagnostic(code(dataforge::config::invalid_value))]
    InvalidValue {
        /// The key with the bad value.
        key: String,
        /// Description of the mismatch.
        detail: String,
    },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(dataforge::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(dataforge::config::other))]
    Other(String),
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// A single figment error may carry multiple underlying errors (one per
/// offending key); all of them are converted so the user sees every
/// problem at once.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let path = error
            .path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let key = if path.is_empty() {
                    field.clone()
                } else {
                    format!("{path}.{field}")
                };
                ConfigError::UnknownKey {
                    key,
                    valid_keys: expected.join(", "),
                }
            }
            Kind::InvalidType(actual, expected) => ConfigError::InvalidValue {
                key: path,
                detail: format!("found {actual}, expected {expected}"),
            },
            Kind::InvalidValue(actual, expected) => ConfigError::InvalidValue {
                key: path,
                detail: format!("found {actual}, expected {expected}"),
            },
            _ => ConfigError::Other(format!("{error}")),
        };
        errors.push(config_error);
    }

    errors
}

/// Render a list of config errors as a human-readable report string.
pub fn render_errors(errors: &[ConfigError]) -> String {
    let mut out = String::new();
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&err.to_string());
    }
    out
}
