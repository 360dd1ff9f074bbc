// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dataforge.toml` > `~/.config/dataforge/dataforge.toml`
//! > `/etc/dataforge/dataforge.toml` with environment variable overrides via
//! `DATAFORGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DataforgeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dataforge/dataforge.toml` (system-wide)
/// 3. `~/.config/dataforge/dataforge.toml` (user XDG config)
/// 4. `./dataforge.toml` (local directory)
/// 5. `DATAFORGE_*` environment variables
pub fn load_config() -> Result<DataforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DataforgeConfig::default()))
        .merge(Toml::file("/etc/dataforge/dataforge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dataforge/dataforge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dataforge.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DataforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DataforgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DataforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DataforgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `DATAFORGE_STORAGE_DATABASE_PATH` must
/// map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("DATAFORGE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("provider_", "provider.", 1);
        mapped.into()
    })
}
