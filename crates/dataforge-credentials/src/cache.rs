// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-local write-through cache for the resolved API key and model.
//!
//! Two entries in one TOML file, overwritten in place -- the analog of the
//! per-device key/value store the credential store mirrors itself into.
//! The cache is never the source of truth: on conflict the remote row
//! wins, and a malformed file is treated as empty rather than surfaced.

use std::path::{Path, PathBuf};

use dataforge_config::model::CacheConfig;
use dataforge_core::DataforgeError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The two cached entries. Absent fields mean "nothing cached".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Last-resolved API key, if any.
    pub api_key: Option<String>,
    /// Last-selected model identifier, if any. Stored as the raw string;
    /// membership in the model set is re-checked on every read.
    pub model: Option<String>,
}

/// File-backed key/value cache scoped to this device.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    /// Create a cache over the given file path. The file (and its parent
    /// directory) is created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a cache from the `[cache]` config section.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(&config.path)
    }

    /// Returns the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current snapshot.
    ///
    /// A missing file reads as empty. A malformed file is corrected to
    /// empty (with a warning) rather than propagated -- cache damage must
    /// never take the application down.
    pub fn read(&self) -> CacheSnapshot {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheSnapshot::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache file unreadable, treating as empty");
                return CacheSnapshot::default();
            }
        };
        match toml::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache file malformed, treating as empty");
                CacheSnapshot::default()
            }
        }
    }

    /// Overwrite the cached API key.
    pub fn write_api_key(&self, key: &str) -> Result<(), DataforgeError> {
        self.update(|snapshot| snapshot.api_key = Some(key.to_string()))
    }

    /// Remove the cached API key. Idempotent.
    pub fn clear_api_key(&self) -> Result<(), DataforgeError> {
        self.update(|snapshot| snapshot.api_key = None)
    }

    /// Overwrite the cached model identifier.
    pub fn write_model(&self, model: &str) -> Result<(), DataforgeError> {
        self.update(|snapshot| snapshot.model = Some(model.to_string()))
    }

    fn update(&self, mutate: impl FnOnce(&mut CacheSnapshot)) -> Result<(), DataforgeError> {
        let mut snapshot = self.read();
        mutate(&mut snapshot);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| DataforgeError::Cache(format!("creating cache dir: {e}")))?;
        }
        let rendered = toml::to_string(&snapshot)
            .map_err(|e| DataforgeError::Cache(format!("serializing cache: {e}")))?;
        std::fs::write(&self.path, rendered)
            .map_err(|e| DataforgeError::Cache(format!("writing cache file: {e}")))?;
        debug!(path = %self.path.display(), "cache updated");
        Ok(())
    }
}
