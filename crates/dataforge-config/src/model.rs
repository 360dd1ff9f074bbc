// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Dataforge credential core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Dataforge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataforgeConfig {
    /// Application identity and logging settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Credential storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local write-through cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// AI provider HTTP settings.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name of the application instance.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "dataforge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Credential storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding credential rows.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dataforge").join("dataforge.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "dataforge.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Local write-through cache configuration.
///
/// The cache file mirrors the last-resolved API key and model selection
/// for the device; it is not a second source of truth.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Path to the cache TOML file.
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dataforge").join("cache.toml"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "cache.toml".to_string())
}

/// AI provider HTTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the provider API (models-list and completion endpoints).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let config = DataforgeConfig::default();
        assert_eq!(config.app.name, "dataforge");
        assert_eq!(config.app.log_level, "info");
        assert!(config.storage.wal_mode);
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.provider.request_timeout_secs, 30);
    }

    #[test]
    fn default_paths_are_non_empty() {
        let config = DataforgeConfig::default();
        assert!(!config.storage.database_path.is_empty());
        assert!(!config.cache.path.is_empty());
    }
}
