// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use dataforge_core::DataforgeError;
use tracing::debug;

use crate::migrations;

/// Handle to the credential database.
///
/// Wraps a single `tokio_rusqlite::Connection`; query modules accept
/// `&Database` and go through [`Database::connection`] so every write is
/// serialized on the one background thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at the given path, in WAL mode.
    ///
    /// Runs pending migrations before the handle is returned.
    pub async fn open(path: &str) -> Result<Self, DataforgeError> {
        Self::open_with_wal(path, true).await
    }

    /// Open with explicit WAL-mode choice (from `storage.wal_mode` config).
    pub async fn open_with_wal(path: &str, wal_mode: bool) -> Result<Self, DataforgeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DataforgeError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations run on a short-lived blocking connection so refinery
        // gets the `&mut rusqlite::Connection` it needs.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), DataforgeError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| DataforgeError::Storage {
                    source: Box::new(e),
                })?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL").map_err(|e| {
                    DataforgeError::Storage {
                        source: Box::new(e),
                    }
                })?;
            }
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| DataforgeError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| DataforgeError::Storage {
                source: e.to_string().into(),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "credential database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush pending writes and checkpoint the WAL.
    pub async fn close(&self) -> Result<(), DataforgeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("credential database closed");
        Ok(())
    }
}

/// Convert tokio-rusqlite errors to DataforgeError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DataforgeError {
    DataforgeError::Storage {
        source: e.to_string().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_database_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        // The api_keys table exists after migrations.
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='api_keys'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_restarts() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Second open re-runs the migration runner against an already
        // migrated file without error.
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/dirs/deep.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        assert!(db_path.exists());
    }
}
