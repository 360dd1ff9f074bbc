// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the CredentialRepository trait.

use async_trait::async_trait;

use dataforge_config::model::StorageConfig;
use dataforge_core::types::{Credential, CredentialId, OwnerId};
use dataforge_core::{CredentialRepository, DataforgeError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed credential repository.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query module. The single-active invariant lives in the queries
/// (and in the partial unique index), not here.
pub struct SqliteCredentialRepository {
    db: Database,
}

impl SqliteCredentialRepository {
    /// Open the repository using the given storage configuration.
    ///
    /// Runs migrations; the returned repository is ready for queries.
    pub async fn open(config: &StorageConfig) -> Result<Self, DataforgeError> {
        let db = Database::open_with_wal(&config.database_path, config.wal_mode).await?;
        Ok(Self { db })
    }

    /// Wrap an already opened database handle.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    async fn insert(
        &self,
        owner: &OwnerId,
        label: &str,
        secret: &str,
    ) -> Result<Credential, DataforgeError> {
        queries::credentials::insert_credential(&self.db, owner, label, secret).await
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<Credential>, DataforgeError> {
        queries::credentials::list_credentials(&self.db, owner).await
    }

    async fn find_active(&self, owner: &OwnerId) -> Result<Option<Credential>, DataforgeError> {
        queries::credentials::find_active_credential(&self.db, owner).await
    }

    async fn set_active(
        &self,
        owner: &OwnerId,
        id: &CredentialId,
    ) -> Result<bool, DataforgeError> {
        queries::credentials::set_active_credential(&self.db, owner, id).await
    }

    async fn delete(&self, owner: &OwnerId, id: &CredentialId) -> Result<bool, DataforgeError> {
        queries::credentials::delete_credential(&self.db, owner, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn repository_works_through_trait_object() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("repo.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let repo: Arc<dyn CredentialRepository> =
            Arc::new(SqliteCredentialRepository::open(&config).await.unwrap());

        let who = OwnerId("user-1".into());
        let cred = repo.insert(&who, "key", "sk-via-trait").await.unwrap();
        assert!(cred.is_active);

        let found = repo.find_active(&who).await.unwrap().unwrap();
        assert_eq!(found.id, cred.id);

        assert!(repo.delete(&who, &cred.id).await.unwrap());
        assert!(repo.find_active(&who).await.unwrap().is_none());
    }
}
