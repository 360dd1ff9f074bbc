// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dataforge credential core.

use thiserror::Error;

/// The primary error type used across Dataforge crates.
#[derive(Debug, Error)]
pub enum DataforgeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Local cache errors (unreadable cache file, failed write-through).
    #[error("cache error: {0}")]
    Cache(String),

    /// AI provider errors (API failure, malformed response, transport failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
